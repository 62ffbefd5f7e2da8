//! crates/consultancy_core/src/uploads.rs
//!
//! Best-effort removal of uploaded files. The record mutation is authoritative;
//! a file that cannot be removed is logged and left behind.

use crate::ports::FileStore;
use tracing::warn;

/// Removes `path` from the store, logging instead of failing.
pub async fn discard_upload(files: &dyn FileStore, path: Option<&str>) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = files.delete(path).await {
        warn!("Failed to remove uploaded file {}: {}", path, e);
    }
}

/// Content types accepted for uploads.
pub const ALLOWED_CONTENT_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Upload;
    use crate::mocks::MemoryFileStore;

    #[test]
    fn content_type_allow_list() {
        assert!(is_allowed_content_type("image/png"));
        assert!(is_allowed_content_type("text/plain; charset=utf-8"));
        assert!(!is_allowed_content_type("application/x-msdownload"));
    }

    #[tokio::test]
    async fn discard_removes_file_and_tolerates_missing_ones() {
        let files = MemoryFileStore::new();
        let path = files
            .save(&Upload {
                file_name: "brief.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();
        assert!(files.contains(&path).await);

        discard_upload(&files, Some(&path)).await;
        assert!(!files.contains(&path).await);

        files.fail_deletes(true).await;
        discard_upload(&files, Some("/uploads/missing.pdf")).await;
        discard_upload(&files, None).await;
    }
}
