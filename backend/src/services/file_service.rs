//! Local storage for ticket attachments.
//!
//! Files land under `{root}/tickets/` with a random name and the original
//! extension. Oversized files and unexpected extensions are dropped without
//! failing the upload.

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic", "pdf"];

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    max_bytes: usize,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.upload_dir, config.max_file_size_bytes())
    }

    /// Lowercased extension of `file` if it may be stored.
    pub fn accepted_extension(&self, file: &IncomingFile) -> Option<String> {
        if file.bytes.is_empty() || file.bytes.len() > self.max_bytes {
            return None;
        }

        let extension = Path::new(&file.file_name)
            .extension()?
            .to_str()?
            .to_lowercase();
        ALLOWED_EXTENSIONS
            .contains(&extension.as_str())
            .then_some(extension)
    }

    /// Writes every acceptable file and returns their paths relative to the root.
    pub async fn save_all(&self, files: &[IncomingFile]) -> ServiceResult<Vec<String>> {
        let dir = self.root.join("tickets");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::internal_error(format!("Failed to create upload dir: {e}")))?;

        let mut saved = Vec::new();
        for file in files {
            let Some(extension) = self.accepted_extension(file) else {
                tracing::info!(
                    "Dropping attachment '{}' ({} bytes)",
                    file.file_name,
                    file.bytes.len()
                );
                continue;
            };

            let name = format!("{}.{}", Uuid::new_v4().simple(), extension);
            if let Err(e) = tokio::fs::write(dir.join(&name), &file.bytes).await {
                self.remove_all(&saved).await;
                return Err(ServiceError::internal_error(format!(
                    "Failed to store attachment: {e}"
                )));
            }
            saved.push(format!("tickets/{name}"));
        }

        Ok(saved)
    }

    /// Deletes previously saved attachments. Failures are logged only.
    pub async fn remove_all(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(self.root.join(path)).await {
                tracing::warn!("Failed to remove attachment {}: {}", path, e);
            }
        }
    }
}
