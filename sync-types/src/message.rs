//! History entries for picochat.

/// Longest sender id kept in history, in characters.
pub const SENDER_MAX_CHARS: usize = 31;

/// Default body cap, in characters.
pub const DEFAULT_BODY_MAX_CHARS: usize = 119;

/// Default number of messages kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Return the longest prefix of `s` holding at most `max_chars` characters.
///
/// Cuts on a char boundary, so multi-byte text is never split.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// One admitted text message.
///
/// Both fields are truncated on construction and the storage is sized to
/// the truncated text exactly. Immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Box<str>,
    body: Box<str>,
}

impl Message {
    /// Build a message, truncating the sender to [`SENDER_MAX_CHARS`] and
    /// the body to `body_max_chars`.
    pub fn new(sender: &str, body: &str, body_max_chars: usize) -> Self {
        Self {
            sender: truncate_chars(sender, SENDER_MAX_CHARS).into(),
            body: truncate_chars(body, body_max_chars).into(),
        }
    }

    /// The (possibly truncated) sender id.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The (possibly truncated) body.
    pub fn body(&self) -> &str {
        &self.body
    }
}
