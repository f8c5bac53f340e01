//! Configuration module for the chat bot.
//!
//! Settings come from environment variables (optionally loaded from an env
//! file); credentials are read, never stored.

mod settings;

pub use settings::{BotSettings, ConfigError, TwitchConfig};
