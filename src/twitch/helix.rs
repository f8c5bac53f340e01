//! Helix HTTP client for user lookup and timeouts.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::api::{BanRequest, HelixError, MAX_LOGINS_PER_LOOKUP, ModerationApi, PlatformUser};
use crate::config::TwitchConfig;

const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix";

/// JSON body for `POST /moderation/bans`.
#[derive(Debug, Serialize)]
struct BanBody<'a> {
    data: BanBodyData<'a>,
}

#[derive(Debug, Serialize)]
struct BanBodyData<'a> {
    user_id: &'a str,
    duration: u64,
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<PlatformUser>,
}

/// Thin wrapper around the Helix endpoints the bot needs.
pub struct HelixClient {
    http: Client,
    base_url: String,
    client_id: String,
    access_token: String,
    broadcaster_id: String,
    moderator_id: String,
}

impl HelixClient {
    /// Creates a client acting as `moderator_id` in `broadcaster_id`'s channel.
    #[must_use]
    pub fn new(config: &TwitchConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            client_id: config.client_id.clone(),
            access_token: config.access_token.clone(),
            broadcaster_id: config.broadcaster_id.clone(),
            moderator_id: config.moderator_id.clone(),
        }
    }

    /// Points the client at another Helix-compatible host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn bans_url(&self) -> String {
        format!(
            "{}/moderation/bans?broadcaster_id={}&moderator_id={}",
            self.base_url, self.broadcaster_id, self.moderator_id
        )
    }

    async fn check(resp: reqwest::Response, call: &str) -> Result<reqwest::Response, HelixError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        warn!("{} => status={} body={}", call, status, body);
        Err(HelixError::Status { status, body })
    }
}

#[async_trait]
impl ModerationApi for HelixClient {
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<PlatformUser>, HelixError> {
        if logins.len() > MAX_LOGINS_PER_LOOKUP {
            return Err(HelixError::TooManyLogins {
                count: logins.len(),
                max: MAX_LOGINS_PER_LOOKUP,
            });
        }
        if logins.is_empty() {
            return Ok(Vec::new());
        }

        let query: Vec<(&str, String)> = logins
            .iter()
            .map(|login| ("login", login.to_lowercase()))
            .collect();

        let resp = self
            .http
            .get(self.users_url())
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let parsed: UsersResponse = Self::check(resp, "lookup_users").await?.json().await?;
        debug!("Resolved {} of {} logins", parsed.data.len(), logins.len());
        Ok(parsed.data)
    }

    async fn ban_user(&self, request: &BanRequest) -> Result<(), HelixError> {
        let body = BanBody {
            data: BanBodyData {
                user_id: &request.user_id,
                duration: request.duration_seconds,
                reason: &request.reason,
            },
        };

        let resp = self
            .http
            .post(self.bans_url())
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        // Success JSON carries nothing the bot needs.
        Self::check(resp, "ban_user").await?;
        Ok(())
    }
}

impl std::fmt::Debug for HelixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixClient")
            .field("base_url", &self.base_url)
            .field("broadcaster_id", &self.broadcaster_id)
            .field("moderator_id", &self.moderator_id)
            .finish_non_exhaustive()
    }
}
