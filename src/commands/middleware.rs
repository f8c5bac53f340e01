//! Middleware: the terminal error sink and call timing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{Instrument, debug, error};

use super::chain::{BoxedHandler, Handler, Middleware};
use super::{CommandError, InvocationContext};

/// Terminal error sink wrapped around every command.
///
/// Rejections from filters (`PermissionDenied`, `OnCooldown`) are dropped
/// without a reply. Anything else is logged with the command and sender,
/// then dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

/// What the error sink did with a chain result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposal {
    Completed,
    /// Dropped quietly, logged at debug level only.
    Rejected,
    /// Logged as an error with the command and sender.
    Reported,
}

impl ErrorHandler {
    /// Creates the error sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Wraps a chain so that it can no longer report an error.
    #[must_use]
    pub fn seal(self, chain: BoxedHandler) -> ComposedCommand {
        ComposedCommand { sink: self, chain }
    }

    fn absorb(self, ctx: &InvocationContext, result: Result<(), CommandError>) -> Disposal {
        let Err(err) = result else {
            return Disposal::Completed;
        };

        if err.is_silent() {
            debug!(reason = %err, "Command rejected");
            return Disposal::Rejected;
        }

        error!(
            command = %ctx.command_name,
            user = %ctx.sender.username,
            user_id = %ctx.sender.id,
            "Unhandled command error: {}",
            err
        );
        Disposal::Reported
    }
}

/// A fully composed command: error sink, middleware, filters and handler.
pub struct ComposedCommand {
    sink: ErrorHandler,
    chain: BoxedHandler,
}

impl ComposedCommand {
    /// Runs the chain inside the context's span. Never fails.
    pub async fn run(&self, ctx: &InvocationContext, args: &[String]) {
        let result = self
            .chain
            .call(ctx, args)
            .instrument(ctx.span.clone())
            .await;

        let _entered = ctx.span.enter();
        self.sink.absorb(ctx, result);
    }
}

impl std::fmt::Debug for ComposedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedCommand").finish_non_exhaustive()
    }
}

/// Logs how long each command took.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedTime;

struct Timed {
    next: BoxedHandler,
}

#[async_trait]
impl Handler for Timed {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
        let started = Instant::now();
        let result = self.next.call(ctx, args).await;
        debug!(
            elapsed = ?started.elapsed(),
            ok = result.is_ok(),
            "Command finished"
        );
        result
    }
}

impl Middleware for ElapsedTime {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Timed { next })
    }
}
