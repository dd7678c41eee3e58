//! Remote boundary module.
//!
//! - `client`: the `RemoteClient` trait consumed by the stores
//! - `envelope`: the `CommandResult` wire envelope

mod client;
mod envelope;

pub use client::RemoteClient;
pub use envelope::CommandResult;
