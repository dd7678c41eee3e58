//! Authentication session and credential models.

use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};

/// The authenticated identity as the client sees it.
///
/// Tokens are deliberately absent: they stay inside the remote client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_ulid: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub level: u32,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(QuestError::validation("Not valid email")),
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(QuestError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let len = self.username.trim().chars().count();
        if !USERNAME_LEN.contains(&len) {
            return Err(QuestError::validation(format!(
                "Username must be {}-{} characters",
                USERNAME_LEN.start(),
                USERNAME_LEN.end()
            )));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}
