//! Client-side entity stores.

mod entity_store;
mod lobby_store;
mod proof_store;
mod quest_store;

pub use entity_store::{EntityStore, RefreshOutcome};
pub use lobby_store::LobbyStore;
pub use proof_store::{ProofListing, ProofStore};
pub use quest_store::QuestStore;
