// src/services/download.rs
use crate::errors::ShelfScanError;
use crate::services::DownloadSink;
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

/// Writes gallery downloads into a local directory.
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for FileDownloadSink {
    async fn save(&self, filename: &str, data: &[u8]) -> Result<(), ShelfScanError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(ShelfScanError::Validation(format!(
                "refusing to save download as '{}'",
                filename
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, data).await?;
        info!("Saved {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileDownloadSink::new(dir.path().join("session"));
        sink.save("Gin_Moody_Macro.png", b"img").await.unwrap();
        let written = tokio::fs::read(dir.path().join("session/Gin_Moody_Macro.png"))
            .await
            .unwrap();
        assert_eq!(written, b"img");
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileDownloadSink::new(dir.path());
        assert!(sink.save("../escape.jpg", b"x").await.is_err());
        assert!(sink.save(".hidden", b"x").await.is_err());
    }
}
