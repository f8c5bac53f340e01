//! Twitch platform API module.
//!
//! Defines the narrow moderation interface the commands depend on, a
//! Helix-backed implementation and a dry-run stand-in.

mod api;
mod dry_run;
mod helix;

pub use api::{BanRequest, HelixError, MAX_LOGINS_PER_LOOKUP, ModerationApi, PlatformUser};
pub use dry_run::DryRunModeration;
pub use helix::HelixClient;
