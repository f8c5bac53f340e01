//! Ring buffer of recent chat messages.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use super::ChatMessage;

/// History shared between the transport and the commands that scan it.
pub type SharedHistory = Arc<RwLock<MessageHistory>>;

/// Errors raised while building a history buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Message history capacity must be greater than 0")]
    ZeroCapacity,
}

/// Fixed-capacity FIFO ring of chat messages.
///
/// Once full, every insert overwrites the oldest slot. The capacity never
/// changes after construction.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    slots: Vec<Option<ChatMessage>>,
    next_index: usize,
}

impl MessageHistory {
    /// Creates an empty history with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }

        Ok(Self {
            slots: vec![None; capacity],
            next_index: 0,
        })
    }

    /// Creates a history already wrapped for sharing.
    pub fn shared(capacity: usize) -> Result<SharedHistory, HistoryError> {
        Ok(Arc::new(RwLock::new(Self::new(capacity)?)))
    }

    /// Stores a message, overwriting the oldest one when full.
    pub fn add(&mut self, message: ChatMessage) {
        self.slots[self.next_index] = Some(message);
        self.next_index = (self.next_index + 1) % self.slots.len();
    }

    /// Returns an owned copy of every slot, in slot order.
    ///
    /// The copy always has `capacity` entries; slots never written are `None`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<ChatMessage>> {
        self.slots.clone()
    }

    /// Maximum number of messages kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Sender;

    fn message(n: usize) -> ChatMessage {
        ChatMessage::new(Sender::new(format!("user{n}"), n.to_string()), format!("msg {n}"))
    }

    fn texts(snapshot: &[Option<ChatMessage>]) -> Vec<Option<String>> {
        snapshot
            .iter()
            .map(|slot| slot.as_ref().map(|m| m.text.clone()))
            .collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(MessageHistory::new(0).err(), Some(HistoryError::ZeroCapacity));
    }

    #[test]
    fn test_snapshot_sized_to_capacity_when_not_full() {
        let mut history = MessageHistory::new(4).unwrap();
        history.add(message(1));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(
            texts(&snapshot),
            vec![Some("msg 1".to_owned()), None, None, None]
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_wraparound_keeps_most_recent() {
        let mut history = MessageHistory::new(3).unwrap();
        for n in 1..=5 {
            history.add(message(n));
        }

        // Slots 0 and 1 were overwritten by messages 4 and 5.
        assert_eq!(
            texts(&history.snapshot()),
            vec![
                Some("msg 4".to_owned()),
                Some("msg 5".to_owned()),
                Some("msg 3".to_owned()),
            ]
        );
        assert_eq!(history.capacity(), 3);
    }

    #[test]
    fn test_wraparound_for_many_capacities() {
        for capacity in 1..8 {
            let mut history = MessageHistory::new(capacity).unwrap();
            let total = capacity * 2 + 1;
            for n in 0..total {
                history.add(message(n));
            }

            let mut got: Vec<String> = history
                .snapshot()
                .into_iter()
                .flatten()
                .map(|m| m.text)
                .collect();
            got.sort();
            let mut expected: Vec<String> =
                ((total - capacity)..total).map(|n| format!("msg {n}")).collect();
            expected.sort();
            assert_eq!(got, expected, "capacity {capacity}");
        }
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut history = MessageHistory::new(2).unwrap();
        history.add(message(1));
        let snapshot = history.snapshot();

        history.add(message(2));
        history.add(message(3));

        assert_eq!(texts(&snapshot), vec![Some("msg 1".to_owned()), None]);
    }
}
