//! `ping` - liveness check.

use async_trait::async_trait;

use super::chain::Handler;
use super::{CommandError, InvocationContext};

/// Replies `Pong! @<user>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

#[async_trait]
impl Handler for Ping {
    async fn call(&self, ctx: &InvocationContext, _args: &[String]) -> Result<(), CommandError> {
        ctx.reply(&format!("Pong! @{}", ctx.sender.username));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::testing::RecordingChat;
    use crate::chat::{ChatClient, Sender};

    #[tokio::test]
    async fn test_ping_replies_in_channel() {
        let chat = Arc::new(RecordingChat::default());
        let ctx = InvocationContext::new(
            "!ping",
            Sender::new("alice", "1"),
            "#streamer",
            Arc::clone(&chat) as Arc<dyn ChatClient>,
        );

        Ping.call(&ctx, &[]).await.unwrap();

        assert_eq!(
            chat.lines(),
            vec![("#streamer".to_owned(), "Pong! @alice".to_owned())]
        );
    }
}
