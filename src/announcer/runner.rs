//! Announcement loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info};

use crate::chat::ChatClient;

/// Messages that can be sent to the announcer.
#[derive(Debug, Clone)]
pub enum AnnouncerMessage {
    /// Post the next announcement now.
    AnnounceNow,
    /// Stop the announcer.
    Shutdown,
}

/// Posts announcements round-robin.
pub struct Announcer {
    chat: Arc<dyn ChatClient>,
    channel: String,
    messages: Vec<String>,
    interval: Duration,
}

impl Announcer {
    /// Creates an announcer for `channel` posting every `interval`.
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatClient>,
        channel: impl Into<String>,
        messages: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            chat,
            channel: channel.into(),
            messages,
            interval,
        }
    }

    /// Runs until `Shutdown` arrives or the sender side is dropped.
    ///
    /// Returns immediately if there is nothing to announce. The first
    /// announcement goes out one interval after start.
    pub async fn run(&self, mut rx: mpsc::Receiver<AnnouncerMessage>) {
        if self.messages.is_empty() {
            error!("The list of announcements is empty");
            return;
        }

        info!(
            "Announcer started ({} messages every {:?})",
            self.messages.len(),
            self.interval
        );

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        let mut next = 0;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    next = self.announce(next);
                }
                msg = rx.recv() => {
                    match msg {
                        Some(AnnouncerMessage::AnnounceNow) => {
                            debug!("Received announce-now message");
                            next = self.announce(next);
                        }
                        Some(AnnouncerMessage::Shutdown) | None => {
                            info!("Announcer shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Posts message `index` and returns the index of the following one.
    fn announce(&self, index: usize) -> usize {
        let index = index % self.messages.len();
        self.chat.say(&self.channel, &self.messages[index]);
        info!(message_index = index, "Sent an announcement to the chat");
        (index + 1) % self.messages.len()
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("channel", &self.channel)
            .field("messages", &self.messages.len())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::RecordingChat;

    fn announcer(chat: &Arc<RecordingChat>, messages: &[&str], interval: Duration) -> Announcer {
        Announcer::new(
            Arc::clone(chat) as Arc<dyn ChatClient>,
            "#streamer",
            messages.iter().map(|m| (*m).to_owned()).collect(),
            interval,
        )
    }

    #[tokio::test]
    async fn test_empty_list_returns_immediately() {
        let chat = Arc::new(RecordingChat::default());
        let (_tx, rx) = mpsc::channel(1);

        announcer(&chat, &[], Duration::from_millis(1)).run(rx).await;
        assert!(chat.lines().is_empty());
    }

    #[tokio::test]
    async fn test_cycles_through_messages() {
        let chat = Arc::new(RecordingChat::default());
        let (tx, rx) = mpsc::channel(4);
        let task = {
            let announcer = announcer(&chat, &["one", "two"], Duration::from_secs(3600));
            tokio::spawn(async move { announcer.run(rx).await })
        };

        for _ in 0..3 {
            tx.send(AnnouncerMessage::AnnounceNow).await.unwrap();
        }
        tx.send(AnnouncerMessage::Shutdown).await.unwrap();
        task.await.unwrap();

        let sent: Vec<String> = chat.lines().into_iter().map(|(_, m)| m).collect();
        assert_eq!(sent, vec!["one", "two", "one"]);
    }

    #[tokio::test]
    async fn test_announces_on_interval() {
        let chat = Arc::new(RecordingChat::default());
        let (tx, rx) = mpsc::channel(1);
        let task = {
            let announcer = announcer(&chat, &["hello"], Duration::from_millis(30));
            tokio::spawn(async move { announcer.run(rx).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(tx);
        task.await.unwrap();

        assert!(!chat.lines().is_empty());
        assert!(chat.lines().iter().all(|(c, m)| c == "#streamer" && m == "hello"));
    }
}
