//! Generic filters: role checks and per-command cooldowns.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::chain::{BoxedHandler, Filter, Handler};
use super::{CommandError, InvocationContext};

/// Lets a call through only if the sender holds one of the listed badges.
///
/// An empty role list denies everyone.
#[derive(Debug, Clone)]
pub struct RoleFilter {
    roles: HashSet<String>,
}

impl RoleFilter {
    /// Creates a role filter from badge names.
    #[must_use]
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if any required role is among the sender's badges.
    #[must_use]
    pub fn allows(&self, badges: &HashSet<String>) -> bool {
        self.roles.iter().any(|role| badges.contains(role))
    }
}

struct RoleGuard {
    filter: RoleFilter,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for RoleGuard {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
        if !self.filter.allows(&ctx.sender.badges) {
            debug!(user = %ctx.sender.username, "Sender lacks a required role");
            return Err(CommandError::PermissionDenied);
        }

        self.next.call(ctx, args).await
    }
}

impl Filter for RoleFilter {
    fn wrap(self: Box<Self>, next: BoxedHandler) -> BoxedHandler {
        Arc::new(RoleGuard {
            filter: *self,
            next,
        })
    }
}

/// Timestamp gate shared by every caller of one command.
#[derive(Debug)]
pub struct Cooldown {
    /// Minimum time between two allowed calls.
    duration: Duration,

    /// When the last call was let through.
    last_allowed: Mutex<Option<Instant>>,
}

impl Cooldown {
    /// Creates a new cooldown that lets the first call through.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last_allowed: Mutex::new(None),
        }
    }

    /// Records a call if the cooldown has elapsed.
    ///
    /// On rejection returns the time left. The check and the update happen
    /// under one lock; a rejected call leaves the timestamp untouched.
    pub async fn try_acquire(&self) -> Result<(), Duration> {
        let mut last = self.last_allowed.lock().await;
        let now = Instant::now();

        if let Some(last_time) = *last {
            let elapsed = now.saturating_duration_since(last_time);
            if elapsed < self.duration {
                return Err(self.duration - elapsed);
            }
        }

        *last = Some(now);
        Ok(())
    }

    /// Time left until the next call is allowed.
    pub async fn remaining(&self) -> Duration {
        let last = self.last_allowed.lock().await;
        last.map_or(Duration::ZERO, |last_time| {
            self.duration.saturating_sub(last_time.elapsed())
        })
    }
}

/// Rejects calls made before `duration` has passed since the last allowed one.
///
/// The state is per command, not per user.
#[derive(Debug, Clone, Copy)]
pub struct CooldownFilter {
    duration: Duration,
}

impl CooldownFilter {
    /// Creates a cooldown filter with the given minimum interval.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Creates a cooldown filter from a number of seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

struct CooldownGuard {
    cooldown: Cooldown,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for CooldownGuard {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
        if let Err(remaining) = self.cooldown.try_acquire().await {
            debug!(remaining = ?remaining, "Command is on cooldown");
            return Err(CommandError::OnCooldown);
        }

        self.next.call(ctx, args).await
    }
}

impl Filter for CooldownFilter {
    fn wrap(self: Box<Self>, next: BoxedHandler) -> BoxedHandler {
        Arc::new(CooldownGuard {
            cooldown: Cooldown::new(self.duration),
            next,
        })
    }
}
