//! Entity abstraction shared by every client-side store.

/// A record the client keeps a local copy of, keyed by a stable id.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Partial update applied by `EntityStore::patch`.
    type Patch: Send + Sync;

    /// Human-readable type name used in errors and logs.
    const ENTITY_TYPE: &'static str;

    fn id(&self) -> &str;

    /// Merges `patch` into the record. Returns `true` if anything changed.
    fn apply_patch(&mut self, patch: &Self::Patch) -> bool;

    fn patch_is_empty(patch: &Self::Patch) -> bool;
}
