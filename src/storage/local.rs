use std::path::{Component, Path, PathBuf};

/// Penyimpanan di disk lokal. File ditulis ke ./uploads/<folder>/<nama>
/// dan dilayani actix-files pada prefix /uploads.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new() -> Self {
        LocalStorage {
            root: PathBuf::from("./uploads"),
        }
    }

    #[cfg(test)]
    fn with_root(root: impl Into<PathBuf>) -> Self {
        LocalStorage { root: root.into() }
    }

    pub async fn upload(&self, data: &[u8], folder: &str, filename: &str) -> Result<String, String> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| format!("mkdir {}: {}", dir.display(), e))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| format!("write {}: {}", path.display(), e))?;

        Ok(format!("/uploads/{}/{}", folder, filename))
    }

    pub async fn delete(&self, url: &str) -> bool {
        let path = match self.path_from_url(url) {
            Some(p) => p,
            None => return false,
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("Gagal menghapus file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// URL publik kembali menjadi path di bawah root. Hanya menerima URL
    /// /uploads/..., query string dibuang, komponen ".." ditolak.
    pub fn path_from_url(&self, url: &str) -> Option<PathBuf> {
        let without_query = url.split('?').next().unwrap_or(url);
        let rest = without_query.strip_prefix("/uploads/")?;
        if rest.is_empty() {
            return None;
        }
        let relative = Path::new(rest);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_upload_urls_only() {
        let storage = LocalStorage::with_root("/srv/uploads");

        assert_eq!(
            storage.path_from_url("/uploads/gallery/a.jpg"),
            Some(PathBuf::from("/srv/uploads/gallery/a.jpg"))
        );
        assert_eq!(storage.path_from_url("https://cdn.example.com/x.jpg"), None);
        assert_eq!(storage.path_from_url("/etc/passwd"), None);
        assert_eq!(storage.path_from_url("/uploads/"), None);
    }

    #[test]
    fn strips_query_string() {
        let storage = LocalStorage::with_root("/srv/uploads");
        assert_eq!(
            storage.path_from_url("/uploads/banners/hero.jpg?ver=2"),
            Some(PathBuf::from("/srv/uploads/banners/hero.jpg"))
        );
    }

    #[test]
    fn rejects_traversal() {
        let storage = LocalStorage::with_root("/srv/uploads");
        assert_eq!(storage.path_from_url("/uploads/../main.rs"), None);
        assert_eq!(storage.path_from_url("/uploads/a/../../etc/passwd"), None);
    }

    #[tokio::test]
    async fn upload_then_delete_roundtrip() {
        let dir = std::env::temp_dir().join(format!("uploads-test-{}", std::process::id()));
        let storage = LocalStorage::with_root(&dir);

        let url = storage.upload(b"data", "gallery", "foto.jpg").await.unwrap();
        assert_eq!(url, "/uploads/gallery/foto.jpg");
        assert!(dir.join("gallery/foto.jpg").exists());

        assert!(storage.delete(&url).await);
        // sudah hilang: delete kedua jadi false, tanpa error
        assert!(!storage.delete(&url).await);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
