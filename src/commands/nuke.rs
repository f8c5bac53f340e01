//! `nuke` - time out everyone who recently said a keyword.
//!
//! Syntax: `<prefix>nuke <keyword> <duration> <unit>` with unit one of
//! `s`, `m`, `h`, `d`. Matching is case-insensitive and whole-word, so
//! `!nuke buh 5 m` times out for five minutes everyone whose recent message
//! contains the word `buh`.
//!
//! Timeouts are sent with bounded parallelism under an overall deadline.
//! The deadline only stops new requests from starting: timeouts already
//! sent stay in effect and nothing is rolled back.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use super::chain::{BoxedHandler, Filter, Handler};
use super::{ArgumentError, CommandError, InvocationContext};
use crate::chat::{ChatMessage, SharedHistory, badges};
use crate::twitch::{BanRequest, MAX_LOGINS_PER_LOOKUP, ModerationApi, PlatformUser};

/// Upper bound for the fan-out deadline, so `now + deadline` cannot overflow.
const MAX_DEADLINE: Duration = Duration::from_secs(86_400 * 365);

/// Unit of a timeout duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Parses `s`, `m`, `h` or `d`.
    #[must_use]
    pub fn parse(unit: &str) -> Option<Self> {
        match unit {
            "s" => Some(Self::Seconds),
            "m" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            _ => None,
        }
    }

    /// Seconds in one unit.
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
        }
    }

    /// Single-letter form used on the command line.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Seconds => 's',
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Validated `nuke` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NukeArgs {
    pub keyword: String,
    pub duration: u64,
    pub unit: TimeUnit,
}

impl NukeArgs {
    /// Parses `<keyword> <duration> <unit>`.
    pub fn parse(args: &[String]) -> Result<Self, ArgumentError> {
        let [keyword, duration, unit] = args else {
            return Err(ArgumentError::WrongCount(args.len()));
        };

        let unit = TimeUnit::parse(unit).ok_or_else(|| ArgumentError::UnknownUnit(unit.clone()))?;

        let duration: i64 = duration
            .parse()
            .map_err(|_| ArgumentError::NotANumber(duration.clone()))?;
        let duration = u64::try_from(duration)
            .ok()
            .filter(|d| *d > 0)
            .ok_or(ArgumentError::NonPositiveDuration)?;

        let parsed = Self {
            keyword: keyword.clone(),
            duration,
            unit,
        };
        parsed.timeout_seconds()?;
        Ok(parsed)
    }

    /// Duration converted to seconds.
    pub fn timeout_seconds(&self) -> Result<u64, ArgumentError> {
        self.duration
            .checked_mul(self.unit.multiplier())
            .ok_or(ArgumentError::TimeoutOverflow {
                duration: self.duration,
                unit: self.unit.as_char(),
            })
    }
}

/// Case-insensitive whole-word matcher for a literal keyword.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    regex: Regex,
}

impl KeywordMatcher {
    /// Builds a matcher. Regex metacharacters in `keyword` are matched literally.
    pub fn new(keyword: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(keyword));
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    /// Returns true if `text` contains the keyword as a whole word.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Rejects malformed `nuke` arguments before the command runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentValidator;

struct ValidatedNuke {
    next: BoxedHandler,
}

#[async_trait]
impl Handler for ValidatedNuke {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
        NukeArgs::parse(args)?;
        self.next.call(ctx, args).await
    }
}

impl Filter for ArgumentValidator {
    fn wrap(self: Box<Self>, next: BoxedHandler) -> BoxedHandler {
        Arc::new(ValidatedNuke { next })
    }
}

/// Tunables for the nuke command.
#[derive(Debug, Clone)]
pub struct NukeSettings {
    /// Reason attached to every timeout.
    pub reason: String,

    /// Maximum timeouts in flight at once.
    pub max_concurrent_bans: usize,

    /// Overall time budget for sending timeouts.
    pub deadline: Duration,

    /// Senders holding any of these badges are never timed out.
    pub exempt_badges: HashSet<String>,
}

impl Default for NukeSettings {
    fn default() -> Self {
        Self {
            reason: "u got nuked!".to_owned(),
            max_concurrent_bans: std::thread::available_parallelism().map_or(4, usize::from),
            deadline: Duration::from_secs(10),
            exempt_badges: [badges::BROADCASTER, badges::MODERATOR, badges::VIP]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// What happened to one timeout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanStatus {
    /// Never sent; the deadline passed first.
    Unsent,
    /// Sent, but no answer before the deadline (or the task died).
    InFlight,
    Banned,
    Failed(String),
}

/// Timeout result for one resolved user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanOutcome {
    pub user: PlatformUser,
    pub status: BanStatus,
}

/// State of a single nuke invocation.
#[derive(Debug, Clone)]
pub struct ModerationJob {
    pub args: NukeArgs,

    /// Timeout length sent to the platform.
    pub timeout_seconds: u64,

    /// Matched logins, each once, in scan order.
    pub matched: Vec<String>,

    /// Matched users the platform knows about.
    pub resolved: Vec<PlatformUser>,

    /// One entry per resolved user, same order.
    pub outcomes: Vec<BanOutcome>,

    /// Set when the deadline cut the fan-out short.
    pub timed_out: bool,
}

impl ModerationJob {
    fn new(args: NukeArgs, timeout_seconds: u64) -> Self {
        Self {
            args,
            timeout_seconds,
            matched: Vec::new(),
            resolved: Vec::new(),
            outcomes: Vec::new(),
            timed_out: false,
        }
    }

    /// Records every non-exempt sender whose message matches, once each.
    fn collect_matches(
        &mut self,
        snapshot: &[Option<ChatMessage>],
        matcher: &KeywordMatcher,
        exempt_badges: &HashSet<String>,
    ) {
        let mut seen = HashSet::new();

        for message in snapshot.iter().flatten() {
            let login = message.sender.username.to_lowercase();
            if seen.contains(&login) {
                continue;
            }
            if message.sender.badges.iter().any(|b| exempt_badges.contains(b)) {
                continue;
            }

            if matcher.is_match(&message.text) {
                debug!(username = %login, message = %message.text, "Message contains the keyword");
                seen.insert(login.clone());
                self.matched.push(login);
            }
        }
    }

    /// Number of users actually timed out.
    #[must_use]
    pub fn banned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == BanStatus::Banned)
            .count()
    }

    fn into_result(self) -> Result<Self, CommandError> {
        let attempted = self
            .outcomes
            .iter()
            .filter(|o| o.status != BanStatus::Unsent)
            .count();
        let failed = self
            .outcomes
            .iter()
            .filter(|o| matches!(o.status, BanStatus::Failed(_) | BanStatus::InFlight))
            .count();

        if failed > 0 || self.timed_out {
            return Err(CommandError::ExternalBanFailure {
                attempted,
                failed,
                timed_out: self.timed_out,
            });
        }

        Ok(self)
    }
}

/// The `nuke` command.
pub struct NukeCommand {
    history: SharedHistory,
    moderation: Arc<dyn ModerationApi>,
    settings: NukeSettings,
}

impl NukeCommand {
    /// Creates the command over a shared history and a moderation backend.
    #[must_use]
    pub fn new(
        history: SharedHistory,
        moderation: Arc<dyn ModerationApi>,
        settings: NukeSettings,
    ) -> Self {
        Self {
            history,
            moderation,
            settings,
        }
    }

    /// Scans history, resolves matched users and times them out.
    pub async fn execute(&self, args: NukeArgs) -> Result<ModerationJob, CommandError> {
        let timeout_seconds = args.timeout_seconds()?;
        let matcher = KeywordMatcher::new(&args.keyword)
            .map_err(|e| CommandError::MalformedCommandLine(e.to_string()))?;

        let snapshot = self.history.read().await.snapshot();
        let mut job = ModerationJob::new(args, timeout_seconds);
        job.collect_matches(&snapshot, &matcher, &self.settings.exempt_badges);

        debug!(
            matched = job.matched.len(),
            messages = snapshot.len(),
            "Calculated how many users get a timeout"
        );

        if job.matched.is_empty() {
            return Ok(job);
        }

        job.resolved = self.resolve(&job.matched).await?;
        self.ban_all(&mut job).await;
        job.into_result()
    }

    async fn resolve(&self, logins: &[String]) -> Result<Vec<PlatformUser>, CommandError> {
        let mut users = Vec::with_capacity(logins.len());

        for batch in logins.chunks(MAX_LOGINS_PER_LOOKUP) {
            let found = self
                .moderation
                .lookup_users(batch)
                .await
                .map_err(CommandError::ExternalLookupFailure)?;
            users.extend(found);
        }

        Ok(users)
    }

    async fn ban_all(&self, job: &mut ModerationJob) {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_bans.max(1)));
        let deadline = Instant::now() + self.settings.deadline.min(MAX_DEADLINE);
        let mut workers = JoinSet::new();

        job.outcomes = job
            .resolved
            .iter()
            .map(|user| BanOutcome {
                user: user.clone(),
                status: BanStatus::Unsent,
            })
            .collect();

        for (index, user) in job.resolved.iter().enumerate() {
            if Instant::now() >= deadline {
                job.timed_out = true;
                break;
            }
            let Ok(Ok(permit)) = timeout_at(deadline, Arc::clone(&semaphore).acquire_owned()).await
            else {
                job.timed_out = true;
                break;
            };

            let moderation = Arc::clone(&self.moderation);
            let request = BanRequest {
                user_id: user.id.clone(),
                reason: self.settings.reason.clone(),
                duration_seconds: job.timeout_seconds,
            };
            job.outcomes[index].status = BanStatus::InFlight;

            workers.spawn(async move {
                let result = moderation.ban_user(&request).await;
                drop(permit);
                (index, result)
            });
        }

        loop {
            match timeout_at(deadline, workers.join_next()).await {
                Ok(Some(Ok((index, Ok(()))))) => {
                    job.outcomes[index].status = BanStatus::Banned;
                }
                Ok(Some(Ok((index, Err(e))))) => {
                    let login = &job.outcomes[index].user.login;
                    warn!(login = %login, "Failed to time out user: {}", e);
                    job.outcomes[index].status = BanStatus::Failed(e.to_string());
                }
                Ok(Some(Err(e))) => {
                    warn!("Timeout task failed: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        in_flight = workers.len(),
                        "Deadline reached, leaving in-flight timeouts to finish"
                    );
                    job.timed_out = true;
                    workers.detach_all();
                    break;
                }
            }
        }

        if job.timed_out {
            let unsent = job
                .outcomes
                .iter()
                .filter(|o| o.status == BanStatus::Unsent)
                .count();
            warn!(unsent, "Nuke deadline exceeded");
        }
    }
}

#[async_trait]
impl Handler for NukeCommand {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
        let args = NukeArgs::parse(args)
            .map_err(|e| CommandError::MalformedCommandLine(e.to_string()))?;
        let (duration, unit) = (args.duration, args.unit);
        let started = Instant::now();

        let job = self.execute(args).await?;

        info!(
            keyword = %job.args.keyword,
            banned = job.banned(),
            elapsed = ?started.elapsed(),
            "Nuke finished"
        );

        if job.matched.is_empty() {
            ctx.reply(&format!("Nobody said '{}' recently.", job.args.keyword));
        } else {
            ctx.reply(&format!(
                "Nuked {} chatter(s) for {duration}{unit}.",
                job.banned()
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for NukeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NukeCommand")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
