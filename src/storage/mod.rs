use std::path::Path;
use uuid::Uuid;

use crate::utils::UploadedFile;

pub mod local;
pub mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
pub const UPLOAD_FOLDERS: [&str; 5] = ["banners", "gallery", "potentials", "structure", "posts"];

#[derive(Debug, Default)]
pub struct UploadOptions {
    pub folder: String,
    pub max_size: Option<usize>,
    pub allowed_types: Option<Vec<String>>,
    pub custom_filename: Option<String>,
}

#[derive(Debug)]
pub struct UploadResult {
    pub success: bool,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl UploadResult {
    fn ok(url: String) -> Self {
        UploadResult {
            success: true,
            url: Some(url),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        UploadResult {
            success: false,
            url: None,
            error: Some(message.into()),
        }
    }
}

/// Validasi berjalan SEBELUM ada byte yang ditulis ke penyimpanan.
pub fn validate_file(
    size: usize,
    content_type: &str,
    filename: &str,
    max_size: Option<usize>,
    allowed_types: Option<&[String]>,
) -> Result<(), String> {
    let max_size = max_size.unwrap_or(MAX_FILE_SIZE);
    if size > max_size {
        return Err(format!(
            "File terlalu besar. Maksimal {}MB",
            max_size / 1024 / 1024
        ));
    }

    let type_ok = match allowed_types {
        Some(types) => types.iter().any(|t| t == content_type),
        None => ALLOWED_TYPES.contains(&content_type),
    };
    if !type_ok {
        return Err("Tipe file tidak diperbolehkan. Hanya JPG, PNG, GIF, WEBP".to_string());
    }

    let ext = file_extension(filename);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err("Ekstensi file tidak valid".to_string());
    }

    Ok(())
}

/// Ekstensi lowercase berawalan titik, "" bila tidak ada.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s.to_lowercase()))
        .unwrap_or_default()
}

/// Nama file tersimpan: UUID (atau nama custom) + ekstensi asli,
/// karakter di luar [a-zA-Z0-9.-] diganti underscore.
pub fn build_filename(original: &str, custom: Option<&str>) -> String {
    let ext = file_extension(original);
    let base = match custom {
        Some(name) => name.to_string(),
        None => Uuid::new_v4().simple().to_string(),
    };
    let raw = format!("{}{}", base, ext);
    sanitize_filename::sanitize(&raw)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Penyimpanan file di balik satu kontrak: disk lokal di bawah ./uploads
/// atau bucket S3 dengan URL publik. Pemanggil memperlakukan URL yang
/// dikembalikan sebagai string opaque.
pub enum Storage {
    Local(LocalStorage),
    S3(S3Storage),
}

impl Storage {
    pub async fn from_env() -> Storage {
        let driver = std::env::var("STORAGE_DRIVER").unwrap_or_else(|_| "local".to_string());
        match driver.as_str() {
            "s3" => match S3Storage::from_env().await {
                Ok(s3) => {
                    log::info!("Storage: S3 bucket aktif");
                    Storage::S3(s3)
                }
                Err(e) => {
                    log::error!("Konfigurasi S3 tidak lengkap ({}), fallback ke lokal", e);
                    Storage::Local(LocalStorage::new())
                }
            },
            _ => Storage::Local(LocalStorage::new()),
        }
    }

    /// Validasi lalu tulis; tidak pernah menulis bila validasi gagal.
    pub async fn upload(&self, file: &UploadedFile, options: UploadOptions) -> UploadResult {
        if let Err(msg) = validate_file(
            file.data.len(),
            &file.content_type,
            &file.filename,
            options.max_size,
            options.allowed_types.as_deref(),
        ) {
            return UploadResult::err(msg);
        }

        let filename = build_filename(&file.filename, options.custom_filename.as_deref());
        let written = match self {
            Storage::Local(local) => local.upload(&file.data, &options.folder, &filename).await,
            Storage::S3(s3) => {
                s3.upload(&file.data, &options.folder, &filename, &file.content_type)
                    .await
            }
        };

        match written {
            Ok(url) => UploadResult::ok(url),
            Err(e) => {
                log::error!("Upload gagal: {}", e);
                UploadResult::err("Gagal mengunggah file")
            }
        }
    }

    /// Best-effort: file yang sudah tidak ada dianggap beres, error lain
    /// dicatat tapi tidak pernah dilempar ke pemanggil.
    pub async fn delete(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        match self {
            Storage::Local(local) => local.delete(url).await,
            Storage::S3(s3) => s3.delete(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_rejected() {
        let err = validate_file(MAX_FILE_SIZE + 1, "image/png", "a.png", None, None);
        assert_eq!(err, Err("File terlalu besar. Maksimal 10MB".to_string()));
    }

    #[test]
    fn bad_mime_rejected() {
        assert!(validate_file(10, "application/pdf", "a.pdf", None, None).is_err());
        assert!(validate_file(10, "image/svg+xml", "a.svg", None, None).is_err());
    }

    #[test]
    fn bad_extension_rejected() {
        // MIME lolos tapi ekstensi tidak masuk whitelist
        assert!(validate_file(10, "image/png", "payload.php", None, None).is_err());
        assert!(validate_file(10, "image/png", "tanpa-ekstensi", None, None).is_err());
    }

    #[test]
    fn valid_image_accepted() {
        assert!(validate_file(1024, "image/jpeg", "Foto Lurah.JPG", None, None).is_ok());
        assert!(validate_file(1024, "image/webp", "banner.webp", None, None).is_ok());
    }

    #[test]
    fn custom_max_size_applies() {
        let five_mb = 5 * 1024 * 1024;
        assert!(validate_file(five_mb + 1, "image/png", "a.png", Some(five_mb), None).is_err());
        assert!(validate_file(five_mb, "image/png", "a.png", Some(five_mb), None).is_ok());
    }

    #[test]
    fn filename_is_sanitized() {
        let name = build_filename("foto lurah (1).png", Some("heroImage-123"));
        assert_eq!(name, "heroImage-123.png");

        let name = build_filename("../../etc/passwd.png", Some("a b/c"));
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn generated_filename_keeps_extension() {
        let name = build_filename("Laporan Akhir.JPEG", None);
        assert!(name.ends_with(".jpeg"));
        assert!(!name.contains(' '));
    }
}
