//! Periodic chat announcements.
//!
//! Posts a fixed list of messages to the channel, one per interval,
//! cycling back to the first after the last.

mod runner;

pub use runner::{Announcer, AnnouncerMessage};
