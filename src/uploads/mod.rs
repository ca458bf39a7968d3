/// Disk-based storage for uploaded case images
///
/// Files are written synchronously under a timestamp-prefixed filename and
/// served back from a static path. Nothing cleans up files orphaned by a
/// later case update; the records only ever point at the newest filename.

use crate::error::{AppError, AppResult};
use std::path::PathBuf;
use tokio::fs;

/// Upload store rooted at a single directory
#[derive(Clone)]
pub struct UploadStore {
    base_path: PathBuf,
}

impl UploadStore {
    /// Create a new upload store
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Store an uploaded file, returning the generated filename
    ///
    /// The stored name is `{unix_millis}-{original}` with any path components
    /// stripped from the original name.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> AppResult<String> {
        let filename = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize(original_name)
        );

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to create upload directory: {}", e)))?;

        let path = self.base_path.join(&filename);
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to write upload {}: {}", filename, e)))?;

        tracing::debug!(filename, bytes = data.len(), "stored upload");

        Ok(filename)
    }
}

/// Keep only the final path component of a client-supplied filename
fn sanitize(name: &str) -> String {
    let name = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_writes_timestamped_file() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let filename = store.save("case.png", b"image bytes").await.unwrap();
        assert!(filename.ends_with("-case.png"));

        // The file lands under the serving directory as-is
        let data = fs::read(dir.path().join(&filename)).await.unwrap();
        assert_eq!(data, b"image bytes".to_vec());
    }

    #[tokio::test]
    async fn test_sanitize_strips_path_components() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let filename = store.save("../../etc/passwd", b"x").await.unwrap();
        assert!(filename.ends_with("-passwd"));
        assert!(!filename.contains('/'));
    }
}
