//! Application settings and Twitch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commands::NukeSettings;

/// Twitch API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    /// Application client id (from <https://dev.twitch.tv/console>).
    pub client_id: String,

    /// User access token with `moderator:manage:banned_users`.
    pub access_token: String,

    /// Id of the channel owner.
    pub broadcaster_id: String,

    /// Id of the account the bot acts as.
    pub moderator_id: String,

    /// Login of the channel to join.
    pub channel_name: String,
}

impl TwitchConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `TWITCH_CLIENT_ID`, `TWITCH_ACCESS_TOKEN`,
    /// `TWITCH_BROADCASTER_ID`, `TWITCH_MODERATOR_ID` and
    /// `TWITCH_CHANNEL_NAME` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required("TWITCH_CLIENT_ID")?,
            access_token: required("TWITCH_ACCESS_TOKEN")?,
            broadcaster_id: required("TWITCH_BROADCASTER_ID")?,
            moderator_id: required("TWITCH_MODERATOR_ID")?,
            channel_name: required("TWITCH_CHANNEL_NAME")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingEnvVar(name))
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Command prefix for bot commands.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Number of recent chat messages kept for `nuke`.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Cooldown of the `nuke` command in seconds.
    #[serde(default = "default_nuke_cooldown")]
    pub nuke_cooldown_secs: u64,

    /// Cooldown of the `ping` command in seconds.
    #[serde(default = "default_ping_cooldown")]
    pub ping_cooldown_secs: u64,

    /// Maximum timeouts sent at once.
    #[serde(default = "default_max_concurrent_bans")]
    pub max_concurrent_bans: usize,

    /// Time budget for one `nuke` fan-out in seconds.
    #[serde(default = "default_ban_deadline")]
    pub ban_deadline_secs: u64,

    /// Seconds between announcements.
    #[serde(default = "default_announce_interval")]
    pub announce_interval_secs: u64,

    /// Messages posted periodically, in order.
    #[serde(default)]
    pub announcements: Vec<String>,
}

fn default_command_prefix() -> String {
    "!".to_owned()
}

const fn default_history_capacity() -> usize {
    100
}

const fn default_nuke_cooldown() -> u64 {
    30
}

const fn default_ping_cooldown() -> u64 {
    5
}

fn default_max_concurrent_bans() -> usize {
    std::thread::available_parallelism().map_or(4, usize::from)
}

const fn default_ban_deadline() -> u64 {
    10
}

const fn default_announce_interval() -> u64 {
    600
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            history_capacity: default_history_capacity(),
            nuke_cooldown_secs: default_nuke_cooldown(),
            ping_cooldown_secs: default_ping_cooldown(),
            max_concurrent_bans: default_max_concurrent_bans(),
            ban_deadline_secs: default_ban_deadline(),
            announce_interval_secs: default_announce_interval(),
            announcements: Vec::new(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            command_prefix: std::env::var("COMMAND_PREFIX")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(default_command_prefix),
            history_capacity: parsed("HISTORY_CAPACITY").unwrap_or_else(default_history_capacity),
            nuke_cooldown_secs: parsed("NUKE_COOLDOWN_SECS").unwrap_or_else(default_nuke_cooldown),
            ping_cooldown_secs: parsed("PING_COOLDOWN_SECS").unwrap_or_else(default_ping_cooldown),
            max_concurrent_bans: parsed::<usize>("MAX_CONCURRENT_BANS")
                .filter(|n| *n > 0)
                .unwrap_or_else(default_max_concurrent_bans),
            ban_deadline_secs: parsed("BAN_DEADLINE_SECS").unwrap_or_else(default_ban_deadline),
            announce_interval_secs: parsed::<u64>("ANNOUNCE_INTERVAL_SECS")
                .filter(|n| *n > 0)
                .unwrap_or_else(default_announce_interval),
            announcements: std::env::var("ANNOUNCEMENTS")
                .map(|raw| split_announcements(&raw))
                .unwrap_or_default(),
        }
    }

    /// Settings for the `nuke` command.
    #[must_use]
    pub fn nuke_settings(&self) -> NukeSettings {
        NukeSettings {
            max_concurrent_bans: self.max_concurrent_bans,
            deadline: Duration::from_secs(self.ban_deadline_secs),
            ..NukeSettings::default()
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Splits `|`-separated announcements, dropping empty entries.
fn split_announcements(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
}
