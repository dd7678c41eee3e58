pub mod attachment_loader;
pub mod config_service;
pub mod http;
pub mod logging;
pub mod paths;
pub mod storage;

pub use crate::attachment_loader::FileAttachmentLoader;
pub use crate::config_service::ConfigService;
pub use crate::http::HttpRemoteClient;
pub use crate::paths::QuestPaths;
pub use crate::storage::{SessionFile, StoredSession};
