//! Quest domain module.

mod model;

pub use model::{Complexity, Quest, QuestEntry, QuestPatch, QuestStatus};
