//! Moderation API contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of logins Helix accepts in one `GET /users` call.
pub const MAX_LOGINS_PER_LOOKUP: usize = 100;

/// Errors returned by the platform API.
#[derive(Debug, Error)]
pub enum HelixError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Twitch API error: HTTP {status} => {body}")]
    Status { status: u16, body: String },

    #[error("Too many logins in one lookup: {count} (max: {max})")]
    TooManyLogins { count: usize, max: usize },

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// A resolved Twitch account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub login: String,
    pub id: String,
}

/// A single timeout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRequest {
    pub user_id: String,
    pub reason: String,
    pub duration_seconds: u64,
}

/// User lookup and timeouts, as consumed by the moderation commands.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Resolves logins to accounts. Unknown logins are omitted.
    ///
    /// Callers must pass at most [`MAX_LOGINS_PER_LOOKUP`] logins.
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<PlatformUser>, HelixError>;

    /// Times a user out.
    async fn ban_user(&self, request: &BanRequest) -> Result<(), HelixError>;
}
