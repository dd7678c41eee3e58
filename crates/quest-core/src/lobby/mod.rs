//! Lobby domain module.

mod model;

pub use model::{Lobby, LobbyDetails, LobbyFeedItem, LobbyMember, LobbyPatch, NewLobby, Role};
