//! Per-call invocation context.

use std::sync::Arc;

use tracing::Span;

use crate::chat::{ChatClient, Sender};

/// Everything a handler may need to know about the current call.
///
/// Built by the controller for a single dispatch and borrowed by every
/// stage of the chain.
pub struct InvocationContext {
    /// Trigger token, prefix included (e.g. `!nuke`).
    pub command_name: String,

    /// Who issued the command.
    pub sender: Sender,

    /// Channel replies go to.
    pub channel: String,

    /// Span every log line of this call is recorded under.
    pub span: Span,

    chat: Arc<dyn ChatClient>,
}

impl InvocationContext {
    /// Creates a context and opens its `command` span.
    #[must_use]
    pub fn new(
        command_name: impl Into<String>,
        sender: Sender,
        channel: impl Into<String>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        let command_name = command_name.into();
        let span = tracing::info_span!(
            "command",
            name = %command_name,
            user = %sender.username,
        );

        Self {
            command_name,
            sender,
            channel: channel.into(),
            span,
            chat,
        }
    }

    /// Sends a message to the channel the command came from.
    pub fn reply(&self, message: &str) {
        self.chat.say(&self.channel, message);
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("command_name", &self.command_name)
            .field("sender", &self.sender)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
