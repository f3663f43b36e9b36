use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

/// Penyimpanan di bucket S3 (atau layanan kompatibel). URL publik dibangun
/// dari S3_PUBLIC_URL sehingga bucket bisa berada di belakang CDN.
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    public_url: String,
}

fn env(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{} belum diset", name))
}

impl S3Storage {
    pub async fn from_env() -> Result<Self, String> {
        let bucket = env("S3_BUCKET")?;
        let endpoint = env("S3_ENDPOINT")?;
        let public_url = env("S3_PUBLIC_URL")?.trim_end_matches('/').to_string();
        let access_key = env("S3_ACCESS_KEY")?;
        let secret_key = env("S3_SECRET_KEY")?;

        let base_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region("auto")
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .load()
            .await;

        let s3_config = S3ConfigBuilder::from(&base_config)
            .force_path_style(true)
            .build();

        Ok(S3Storage {
            client: S3Client::from_conf(s3_config),
            bucket,
            public_url,
        })
    }

    pub async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        filename: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let key = format!("{}/{}", folder, filename);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| format!("put_object {}: {}", key, e))?;

        Ok(format!("{}/{}", self.public_url, key))
    }

    pub async fn delete(&self, url: &str) -> bool {
        let key = match self.key_from_url(url) {
            Some(k) => k,
            None => return false,
        };
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Gagal menghapus objek {}: {}", key, e);
                false
            }
        }
    }

    /// Key objek dari URL publik; URL di luar bucket ini menghasilkan None.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let without_query = url.split('?').next().unwrap_or(url);
        let key = without_query
            .strip_prefix(self.public_url.as_str())?
            .trim_start_matches('/');
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> S3Storage {
        std::env::set_var("S3_BUCKET", "kelurahan-uploads");
        std::env::set_var("S3_ENDPOINT", "http://localhost:9000");
        std::env::set_var("S3_PUBLIC_URL", "https://cdn.kelurahan.go.id/");
        std::env::set_var("S3_ACCESS_KEY", "test");
        std::env::set_var("S3_SECRET_KEY", "test");
        S3Storage::from_env().await.unwrap()
    }

    #[tokio::test]
    async fn key_extraction() {
        let s3 = test_storage().await;
        assert_eq!(
            s3.key_from_url("https://cdn.kelurahan.go.id/gallery/a.jpg"),
            Some("gallery/a.jpg".to_string())
        );
        assert_eq!(
            s3.key_from_url("https://cdn.kelurahan.go.id/banners/hero.png?ver=3"),
            Some("banners/hero.png".to_string())
        );
        assert_eq!(s3.key_from_url("https://lain.example.com/a.jpg"), None);
        assert_eq!(s3.key_from_url("/uploads/gallery/a.jpg"), None);
        assert_eq!(s3.key_from_url("https://cdn.kelurahan.go.id/"), None);
    }
}
