//! Proof domain module.
//!
//! - `model`: published proofs, belief state, submission request/response
//! - `attachment`: attachment sources and the loader trait

mod attachment;
mod model;

pub use attachment::{AttachmentKind, AttachmentLoader, AttachmentSource};
pub use model::{
    BeliefState, MAX_PHOTOS, MAX_VOICES, Pagination, ProofDetails, ProofFeedPage, ProofPatch,
    ProofUpload, SubmitProofRequest, SubmitProofResponse,
};
