use async_trait::async_trait;
use quest_core::proof::{AttachmentLoader, AttachmentSource};
use quest_core::{QuestError, Result};

/// Reads attachment bytes from memory or from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileAttachmentLoader;

impl FileAttachmentLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttachmentLoader for FileAttachmentLoader {
    async fn load(&self, source: &AttachmentSource) -> Result<Vec<u8>> {
        match source {
            AttachmentSource::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    QuestError::io(format!("Cannot read {}: {}", path.display(), e))
                })?;
                if bytes.is_empty() {
                    return Err(QuestError::io(format!("{} is empty", path.display())));
                }
                tracing::debug!(
                    "[FileAttachmentLoader] Read {} bytes from {}",
                    bytes.len(),
                    path.display()
                );
                Ok(bytes)
            }
        }
    }
}
