//! Command registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::chain::{BoxedHandler, Filter, Middleware, compose};
use super::middleware::{ComposedCommand, ErrorHandler};
use super::InvocationContext;
use crate::chat::{ChatClient, Sender};

struct Registration {
    base: BoxedHandler,
    filters: Vec<Box<dyn Filter>>,
}

/// Collects commands and middleware during startup.
///
/// Every chain is composed exactly once, in [`build`](Self::build), with the
/// [`ErrorHandler`] as its outermost stage.
pub struct CommandRegistry {
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
    commands: Vec<(String, Registration)>,
}

impl CommandRegistry {
    /// Creates an empty registry for commands starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            middleware: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Adds a middleware applied to every command, after the error handler.
    ///
    /// Middleware run in the order they were added.
    #[must_use]
    pub fn use_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Registers a command under `<prefix><name>`.
    ///
    /// `filters[0]` runs first; the last filter runs right before `handler`.
    /// Registering a name twice keeps the last registration.
    #[must_use]
    pub fn register(
        mut self,
        name: &str,
        handler: BoxedHandler,
        filters: Vec<Box<dyn Filter>>,
    ) -> Self {
        let trigger = format!("{}{name}", self.prefix);
        self.commands.push((
            trigger,
            Registration {
                base: handler,
                filters,
            },
        ));
        self
    }

    /// Composes every chain and freezes the registry.
    #[must_use]
    pub fn build(self, chat: Arc<dyn ChatClient>) -> CommandController {
        let sink = ErrorHandler::new();
        let mut commands = HashMap::with_capacity(self.commands.len());

        for (trigger, registration) in self.commands {
            let chain = compose(registration.base, registration.filters, &self.middleware);
            debug!(command = %trigger, "Registered command");
            commands.insert(trigger, sink.seal(chain));
        }

        CommandController {
            prefix: self.prefix,
            commands,
            chat,
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .field(
                "commands",
                &self.commands.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Immutable command table. Safe to share across concurrent deliveries.
pub struct CommandController {
    prefix: String,
    commands: HashMap<String, ComposedCommand>,
    chat: Arc<dyn ChatClient>,
}

impl CommandController {
    /// Command prefix (e.g. `!`).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `trigger` (prefix included) is registered.
    #[must_use]
    pub fn contains(&self, trigger: &str) -> bool {
        self.commands.contains_key(trigger)
    }

    /// Registered triggers, sorted.
    #[must_use]
    pub fn triggers(&self) -> Vec<&str> {
        let mut triggers: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        triggers.sort_unstable();
        triggers
    }

    /// Runs the command named by the first token of `line`, if any.
    ///
    /// Unknown commands are ignored. Errors never reach this point.
    pub async fn dispatch(&self, line: &str, sender: Sender, channel: &str) {
        let mut tokens = line.split_whitespace();
        let Some(trigger) = tokens.next() else {
            return;
        };
        let Some(command) = self.commands.get(trigger) else {
            return;
        };
        let args: Vec<String> = tokens.map(str::to_owned).collect();

        info!(
            username = %sender.username,
            user_id = %sender.id,
            command_name = %trigger,
            "User called a command"
        );

        let ctx = InvocationContext::new(trigger, sender, channel, Arc::clone(&self.chat));
        command.run(&ctx, &args).await;
    }
}

impl std::fmt::Debug for CommandController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandController")
            .field("prefix", &self.prefix)
            .field("commands", &self.triggers())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::RecordingChat;
    use crate::chat::badges;
    use crate::commands::chain::testing::{Marker, StubHandler, marker_log, markers};
    use crate::commands::{CommandError, CooldownFilter, RoleFilter};

    fn chat() -> Arc<dyn ChatClient> {
        Arc::new(RecordingChat::default())
    }

    #[tokio::test]
    async fn test_dispatch_runs_registered_command() {
        let stub = Arc::new(StubHandler::default());
        let controller = CommandRegistry::new("!")
            .register("ping", Arc::clone(&stub) as BoxedHandler, Vec::new())
            .build(chat());

        controller.dispatch("!ping", Sender::new("alice", "1"), "#c").await;
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_is_noop() {
        let stub = Arc::new(StubHandler::default());
        let controller = CommandRegistry::new("!")
            .register("ping", Arc::clone(&stub) as BoxedHandler, Vec::new())
            .build(chat());

        controller.dispatch("!pong", Sender::new("alice", "1"), "#c").await;
        controller.dispatch("", Sender::new("alice", "1"), "#c").await;
        controller.dispatch("   ", Sender::new("alice", "1"), "#c").await;
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_is_exact_first_token() {
        let stub = Arc::new(StubHandler::default());
        let controller = CommandRegistry::new("!")
            .register("ping", Arc::clone(&stub) as BoxedHandler, Vec::new())
            .build(chat());

        controller.dispatch("ping", Sender::new("alice", "1"), "#c").await;
        controller.dispatch("!PING", Sender::new("alice", "1"), "#c").await;
        controller.dispatch("!pingx", Sender::new("alice", "1"), "#c").await;
        controller.dispatch("hey !ping", Sender::new("alice", "1"), "#c").await;
        assert_eq!(stub.calls(), 0);

        controller.dispatch("  !ping   extra  args", Sender::new("alice", "1"), "#c").await;
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_middleware_wraps_filters_regardless_of_call_order() {
        let log = marker_log();
        let controller = CommandRegistry::new("!")
            .register(
                "test",
                Arc::new(StubHandler::logging(&log)),
                vec![
                    Box::new(Marker::new("F1", &log)),
                    Box::new(Marker::new("F2", &log)),
                ],
            )
            .use_middleware(Marker::new("M", &log))
            .build(chat());

        controller.dispatch("!test", Sender::new("alice", "1"), "#c").await;
        assert_eq!(markers(&log), vec!["M", "F1", "F2", "handler"]);
    }

    #[tokio::test]
    async fn test_filter_errors_are_absorbed() {
        let stub = Arc::new(StubHandler::default());
        let controller = CommandRegistry::new("!")
            .register(
                "mod",
                Arc::clone(&stub) as BoxedHandler,
                vec![
                    Box::new(RoleFilter::new([badges::MODERATOR])),
                    Box::new(CooldownFilter::from_secs(60)),
                ],
            )
            .build(chat());

        let viewer = Sender::new("viewer", "2");
        let moderator = Sender::new("mod", "3").with_badges([badges::MODERATOR]);

        controller.dispatch("!mod", viewer, "#c").await;
        controller.dispatch("!mod", moderator.clone(), "#c").await;
        controller.dispatch("!mod", moderator, "#c").await;

        // Denied viewer did not consume the cooldown; second moderator call did hit it.
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_escape() {
        let stub = Arc::new(StubHandler::failing(|| {
            CommandError::MalformedCommandLine("boom".to_owned())
        }));
        let controller = CommandRegistry::new("!")
            .register("fail", Arc::clone(&stub) as BoxedHandler, Vec::new())
            .build(chat());

        controller.dispatch("!fail", Sender::new("alice", "1"), "#c").await;
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_triggers_include_prefix() {
        let controller = CommandRegistry::new("?")
            .register("b", Arc::new(StubHandler::default()), Vec::new())
            .register("a", Arc::new(StubHandler::default()), Vec::new())
            .build(chat());

        assert_eq!(controller.triggers(), vec!["?a", "?b"]);
        assert!(controller.contains("?a"));
        assert!(!controller.contains("a"));
        assert_eq!(controller.prefix(), "?");
    }
}
