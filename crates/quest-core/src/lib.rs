//! Domain layer of the quest client: models, errors and the remote boundary.

pub mod config;
pub mod entity;
pub mod error;
pub mod lobby;
pub mod proof;
pub mod quest;
pub mod remote;
pub mod session;

pub use entity::Entity;
pub use error::{ErrorBody, ErrorCode, ErrorKind, QuestError, Result};
pub use remote::{CommandResult, RemoteClient};
