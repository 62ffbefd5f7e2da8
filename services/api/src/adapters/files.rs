//! services/api/src/adapters/files.rs
//!
//! Stores uploads on the local disk under a directory that is also served
//! statically. Files get a random name that keeps the original extension.

use async_trait::async_trait;
use consultancy_core::domain::Upload;
use consultancy_core::ports::{FileStore, PortError, PortResult};
use consultancy_core::uploads::is_allowed_content_type;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct DiskFileStore {
    root: PathBuf,
    url_prefix: String,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Resolves a public path back to a file under the root. Anything that is
    /// not a plain file name directly under the prefix is rejected.
    fn resolve(&self, public_path: &str) -> PortResult<PathBuf> {
        let name = public_path
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| {
                !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.starts_with('.')
            })
            .ok_or_else(|| PortError::Invalid(format!("{} is not an uploaded file", public_path)))?;
        Ok(self.root.join(name))
    }
}

/// The extension of `file_name`, if it is a short alphanumeric one.
fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn save(&self, upload: &Upload) -> PortResult<String> {
        if !is_allowed_content_type(&upload.content_type) {
            return Err(PortError::Invalid(format!(
                "File type {} is not allowed",
                upload.content_type
            )));
        }
        let name = match extension(&upload.file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::write(self.root.join(&name), &upload.bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to store upload: {}", e)))?;
        info!("Stored upload {} ({} bytes)", name, upload.bytes.len());
        Ok(format!("{}/{}", self.url_prefix, name))
    }

    async fn delete(&self, public_path: &str) -> PortResult<()> {
        let path = self.resolve(public_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PortError::NotFound(public_path.to_string()))
            }
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: b"hello".to_vec(),
        }
    }

    #[tokio::test]
    async fn save_then_delete_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path(), "/uploads");

        let public = store.save(&upload("Brief.PDF", "application/pdf")).await.unwrap();
        assert!(public.starts_with("/uploads/"));
        assert!(public.ends_with(".pdf"));

        let on_disk = dir.path().join(public.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"hello");

        store.delete(&public).await.unwrap();
        assert!(!on_disk.exists());
        assert!(matches!(store.delete(&public).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn disallowed_types_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path(), "/uploads");
        let err = store
            .save(&upload("run.exe", "application/x-msdownload"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
    }

    #[tokio::test]
    async fn delete_refuses_paths_outside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path(), "/uploads");
        for bad in ["/uploads/../secret", "/etc/passwd", "/uploads/", "/uploads/a/b.png"] {
            assert!(matches!(store.delete(bad).await, Err(PortError::Invalid(_))), "{}", bad);
        }
    }
}
