//! Attachments of a proof submission and the trait that turns them into bytes.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Voice,
}

/// Where an attachment's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Already captured in memory (e.g. a finished voice recording).
    Bytes(Vec<u8>),
    /// A file picked by the user, read at submission time.
    File(PathBuf),
}

/// Reads attachment sources into transport-ready bytes.
#[async_trait]
pub trait AttachmentLoader: Send + Sync {
    /// Loads the bytes behind `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read; the caller aborts the
    /// whole submission in that case.
    async fn load(&self, source: &AttachmentSource) -> Result<Vec<u8>>;
}
