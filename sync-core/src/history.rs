//! Message history ring for picochat.
//!
//! This module provides the fixed-capacity store of the most recent
//! messages with:
//! - Arrival ordering (the order events appear in the decoded timeline)
//! - Oldest-first eviction once capacity is reached
//! - Truncation of sender and body on the way in
//!
//! Capacity is fixed at construction and storage is reserved up front, so
//! the ring never reallocates after startup.

use std::collections::vec_deque::{self, VecDeque};

use picochat_types::Message;

/// Fixed-capacity, insertion-ordered message store.
///
/// `len() <= capacity()` holds after every call; eviction and insertion
/// happen inside one `&mut self` method, so callers never observe an
/// overflowed ring.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    capacity: usize,
    body_max_chars: usize,
    entries: VecDeque<Message>,
}

impl MessageHistory {
    /// Create an empty ring.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, body_max_chars: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            body_max_chars,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Truncate and append a message, evicting the oldest if full.
    ///
    /// Returns the evicted message, if any.
    pub fn append(&mut self, sender: &str, body: &str) -> Option<Message> {
        self.push(Message::new(sender, body, self.body_max_chars))
    }

    /// Append an already-built message, evicting the oldest if full.
    ///
    /// The body is re-truncated to this ring's cap, so a message built with
    /// a looser cap still fits.
    pub fn push(&mut self, message: Message) -> Option<Message> {
        let message = if message.body().chars().count() > self.body_max_chars {
            Message::new(message.sender(), message.body(), self.body_max_chars)
        } else {
            message
        };
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        evicted
    }

    /// Messages oldest first.
    ///
    /// The iterator is `Clone`, and calling `iter()` again starts over.
    pub fn iter(&self) -> vec_deque::Iter<'_, Message> {
        self.entries.iter()
    }

    /// The most recently appended message.
    pub fn latest(&self) -> Option<&Message> {
        self.entries.back()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no messages are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of stored messages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Body cap applied on append, in characters.
    pub fn body_max_chars(&self) -> usize {
        self.body_max_chars
    }
}

impl<'a> IntoIterator for &'a MessageHistory {
    type Item = &'a Message;
    type IntoIter = vec_deque::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picochat_types::{DEFAULT_BODY_MAX_CHARS, SENDER_MAX_CHARS};

    fn bodies(history: &MessageHistory) -> Vec<String> {
        history.iter().map(|m| m.body().to_string()).collect()
    }

    #[test]
    fn length_is_min_of_appends_and_capacity() {
        for capacity in 1..=6 {
            for appends in 0..=12 {
                let mut history = MessageHistory::new(capacity, DEFAULT_BODY_MAX_CHARS);
                for i in 0..appends {
                    history.append("@a:hs", &format!("m{}", i));
                }
                assert_eq!(history.len(), appends.min(capacity));

                let expected: Vec<String> = (appends.saturating_sub(capacity)..appends)
                    .map(|i| format!("m{}", i))
                    .collect();
                assert_eq!(bodies(&history), expected);
            }
        }
    }

    #[test]
    fn append_returns_evicted_oldest() {
        let mut history = MessageHistory::new(2, DEFAULT_BODY_MAX_CHARS);
        assert!(history.append("@a:hs", "one").is_none());
        assert!(history.append("@a:hs", "two").is_none());

        let evicted = history.append("@a:hs", "three").unwrap();
        assert_eq!(evicted.body(), "one");
        assert_eq!(bodies(&history), vec!["two", "three"]);
    }

    #[test]
    fn iteration_is_restartable() {
        let mut history = MessageHistory::new(3, DEFAULT_BODY_MAX_CHARS);
        history.append("@a:hs", "x");
        history.append("@b:hs", "y");

        let iter = history.iter();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(history.iter().count(), 2);
    }

    #[test]
    fn append_truncates_sender_and_body() {
        let mut history = MessageHistory::new(3, 20);
        let sender = "s".repeat(50);
        let body = "b".repeat(200);

        history.append(&sender, &body);

        let msg = history.latest().unwrap();
        assert_eq!(msg.sender().len(), SENDER_MAX_CHARS);
        assert_eq!(msg.body().len(), 20);
    }

    #[test]
    fn push_applies_ring_body_cap() {
        let mut history = MessageHistory::new(3, 5);
        history.push(Message::new("@a:hs", "abcdefghij", 119));
        assert_eq!(history.latest().unwrap().body(), "abcde");
    }

    #[test]
    fn zero_capacity_raised_to_one() {
        let mut history = MessageHistory::new(0, DEFAULT_BODY_MAX_CHARS);
        assert_eq!(history.capacity(), 1);
        history.append("@a:hs", "one");
        history.append("@a:hs", "two");
        assert_eq!(bodies(&history), vec!["two"]);
    }

    #[test]
    fn new_history_is_empty() {
        let history = MessageHistory::new(10, DEFAULT_BODY_MAX_CHARS);
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
