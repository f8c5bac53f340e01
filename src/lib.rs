//! Twitch Chatbot Library
//!
//! A chat bot with composable command pipelines.
//!
//! This crate provides the core functionality for:
//! - Recording recent chat in a fixed-size ring buffer
//! - Dispatching prefixed chat commands through middleware and filters
//! - Timing out everyone who said a keyword (`nuke`) via the Helix API
//! - Posting periodic announcements

pub mod announcer;
pub mod chat;
pub mod commands;
pub mod config;
pub mod twitch;
