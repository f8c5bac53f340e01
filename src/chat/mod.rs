//! Chat-side types and the transport seam.
//!
//! The wire protocol lives outside this crate; the bot only needs to know
//! who sent a line, what it said, and how to say something back.

mod console;
mod history;
mod listener;

use std::collections::HashSet;

pub use console::{ConsoleChat, parse_console_line};
pub use history::{HistoryError, MessageHistory, SharedHistory};
pub use listener::ChatListener;

/// Known Twitch badge names.
pub mod badges {
    pub const BROADCASTER: &str = "broadcaster";
    pub const MODERATOR: &str = "moderator";
    pub const VIP: &str = "vip";
    pub const SUBSCRIBER: &str = "subscriber";
    pub const FOUNDER: &str = "founder";
    pub const ARTIST: &str = "artist-badge";
    pub const SUB_GIFTER: &str = "sub-gifter";
    pub const BITS: &str = "bits";
    pub const PARTNER: &str = "partner";
    pub const STAFF: &str = "staff";

    /// Every badge the bot knows about.
    pub const ALL: [&str; 10] = [
        BROADCASTER,
        MODERATOR,
        VIP,
        SUBSCRIBER,
        FOUNDER,
        ARTIST,
        SUB_GIFTER,
        BITS,
        PARTNER,
        STAFF,
    ];
}

/// Identity of a chat participant as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    /// Lowercase login name.
    pub username: String,

    /// Platform user id.
    pub id: String,

    /// Badge names attached to the message.
    pub badges: HashSet<String>,
}

impl Sender {
    /// Creates a sender without badges.
    #[must_use]
    pub fn new(username: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id: id.into(),
            badges: HashSet::new(),
        }
    }

    /// Adds badges to the sender.
    #[must_use]
    pub fn with_badges<I, S>(mut self, badges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.badges.extend(badges.into_iter().map(Into::into));
        self
    }

    /// Returns true if the sender holds the named badge.
    #[must_use]
    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.contains(badge)
    }
}

/// A single line of chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    /// Creates a message from `sender`.
    #[must_use]
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

/// Outgoing side of the chat transport.
///
/// Implementations queue the line and return immediately.
pub trait ChatClient: Send + Sync {
    /// Sends a message to a channel.
    fn say(&self, channel: &str, message: &str);
}
