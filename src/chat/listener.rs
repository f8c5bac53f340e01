//! Entry point for every incoming chat line.

use std::sync::Arc;

use tracing::trace;

use super::{ChatMessage, SharedHistory};
use crate::commands::CommandController;

/// Records chat into the history and hands commands to the controller.
///
/// Command lines are not recorded, so a `nuke` invocation never matches itself.
#[derive(Debug, Clone)]
pub struct ChatListener {
    channel: String,
    history: SharedHistory,
    controller: Arc<CommandController>,
}

impl ChatListener {
    /// Creates a listener for one channel.
    #[must_use]
    pub fn new(
        channel: impl Into<String>,
        history: SharedHistory,
        controller: Arc<CommandController>,
    ) -> Self {
        Self {
            channel: channel.into(),
            history,
            controller,
        }
    }

    /// Handles one delivered message. Safe to call concurrently.
    pub async fn on_message(&self, message: ChatMessage) {
        if message.text.starts_with(self.controller.prefix()) {
            self.controller
                .dispatch(&message.text, message.sender, &self.channel)
                .await;
            return;
        }

        trace!(username = %message.sender.username, "Recording message");
        self.history.write().await.add(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::RecordingChat;
    use crate::chat::{ChatClient, MessageHistory, Sender};
    use crate::commands::{CommandRegistry, Ping};

    #[tokio::test]
    async fn test_records_chat_and_dispatches_commands() {
        let history = MessageHistory::shared(4).unwrap();
        let chat = Arc::new(RecordingChat::default());
        let controller = CommandRegistry::new("!")
            .register("ping", Arc::new(Ping), Vec::new())
            .build(Arc::clone(&chat) as Arc<dyn ChatClient>);
        let listener = ChatListener::new("#streamer", Arc::clone(&history), Arc::new(controller));

        listener
            .on_message(ChatMessage::new(Sender::new("alice", "1"), "hello"))
            .await;
        listener
            .on_message(ChatMessage::new(Sender::new("bob", "2"), "!ping"))
            .await;

        let recorded: Vec<String> = history
            .read()
            .await
            .snapshot()
            .into_iter()
            .flatten()
            .map(|m| m.text)
            .collect();
        assert_eq!(recorded, vec!["hello".to_owned()]);
        assert_eq!(
            chat.lines(),
            vec![("#streamer".to_owned(), "Pong! @bob".to_owned())]
        );
    }
}
