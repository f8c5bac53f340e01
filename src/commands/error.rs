//! Errors produced while running a command.

use thiserror::Error;

use crate::twitch::HelixError;

/// Reasons a nuke argument list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("expected 3 arguments (<keyword> <duration> <unit>), got {0}")]
    WrongCount(usize),

    #[error("duration must be a number, got '{0}'")]
    NotANumber(String),

    #[error("duration must be positive")]
    NonPositiveDuration,

    #[error("time unit must be one of s, m, h or d, got '{0}'")]
    UnknownUnit(String),

    #[error("timeout of {duration}{unit} is too long")]
    TimeoutOverflow { duration: u64, unit: char },
}

/// Every way a command invocation can fail.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("called a command without a needed role")]
    PermissionDenied,

    #[error("command is on cooldown")]
    OnCooldown,

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] ArgumentError),

    #[error("malformed command line: {0}")]
    MalformedCommandLine(String),

    #[error("failed to look up users: {0}")]
    ExternalLookupFailure(#[source] HelixError),

    #[error("failed to ban {failed} of {attempted} users (deadline exceeded: {timed_out})")]
    ExternalBanFailure {
        attempted: usize,
        failed: usize,
        timed_out: bool,
    },
}

impl CommandError {
    /// Expected control-flow rejections that are dropped without logging.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::OnCooldown)
    }
}
