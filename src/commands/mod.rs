//! Command handling module.
//!
//! Commands are triggered by chat lines starting with the configured prefix.
//! Each one is a base handler wrapped by its filters and by the global
//! middleware, composed once when the registry is built.

mod chain;
mod context;
mod controller;
mod error;
mod filters;
mod middleware;
mod nuke;
mod ping;

pub use chain::{BoxedHandler, Filter, Handler, Middleware, compose};
pub use context::InvocationContext;
pub use controller::{CommandController, CommandRegistry};
pub use error::{ArgumentError, CommandError};
pub use filters::{Cooldown, CooldownFilter, RoleFilter};
pub use middleware::{ComposedCommand, ElapsedTime, ErrorHandler};
pub use nuke::{
    ArgumentValidator, BanOutcome, BanStatus, KeywordMatcher, ModerationJob, NukeArgs,
    NukeCommand, NukeSettings, TimeUnit,
};
pub use ping::Ping;
