//! Application layer of the quest client.
//!
//! Holds the client-side stores, the optimistic mutation protocols and the
//! session gate. Everything here talks to the backend through
//! [`quest_core::RemoteClient`] only.

pub mod call;
pub mod context;
pub mod optimistic;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::AppContext;
pub use session::{AuthStatus, Route, RouteDecision, SessionGate};
pub use store::{EntityStore, RefreshOutcome};
