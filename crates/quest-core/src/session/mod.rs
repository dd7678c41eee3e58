//! Session domain module.

mod model;

pub use model::{LoginRequest, RegisterRequest, UserSession};
