//! Cursor and identity types for picochat.

use std::fmt;

/// Longest continuation token the client will hold, in bytes.
///
/// Homeservers issue tokens well under this; anything longer is treated as
/// garbage rather than grown into.
pub const MAX_TOKEN_LEN: usize = 255;

/// Which half of the two-phase sync protocol the next request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No token yet: probe for a baseline cursor.
    Initial,
    /// Token held: fetch everything after it.
    Incremental,
}

/// The server-issued `next_batch` cursor.
///
/// An empty token means no sync has succeeded yet. The phase is always
/// derived from emptiness, never stored beside it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyncToken(String);

impl SyncToken {
    /// The empty token.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap a token received from the server.
    ///
    /// Returns `None` if the token is longer than [`MAX_TOKEN_LEN`].
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.len() > MAX_TOKEN_LEN {
            return None;
        }
        Some(Self(token))
    }

    /// Whether a sync has established a cursor yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The phase the next sync request belongs to.
    pub fn phase(&self) -> SyncPhase {
        if self.is_empty() {
            SyncPhase::Initial
        } else {
            SyncPhase::Incremental
        }
    }

    /// Borrow the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Forget the cursor, forcing the next cycle back to the probe.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "SyncToken(<empty>)")
        } else {
            write!(f, "SyncToken({})", self.0)
        }
    }
}

/// Client-generated idempotency key for a send.
///
/// Built from a monotonic clock reading plus a per-session attempt counter,
/// so two attempts in the same millisecond still differ. The server
/// deduplicates retries that reuse an id; the client never does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Build an id from a monotonic millisecond reading and attempt number.
    pub fn from_clock(now_ms: u64, attempt: u32) -> Self {
        Self(format!("m{}.{}", now_ms, attempt))
    }

    /// Borrow the id as it appears in the request path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_initial_phase() {
        let token = SyncToken::empty();
        assert!(token.is_empty());
        assert_eq!(token.phase(), SyncPhase::Initial);
    }

    #[test]
    fn non_empty_token_is_incremental_phase() {
        let token = SyncToken::new("s72594_4483_1934").unwrap();
        assert_eq!(token.phase(), SyncPhase::Incremental);
        assert_eq!(token.as_str(), "s72594_4483_1934");
    }

    #[test]
    fn clear_returns_to_initial() {
        let mut token = SyncToken::new("s1").unwrap();
        token.clear();
        assert_eq!(token.phase(), SyncPhase::Initial);
    }

    #[test]
    fn oversized_token_rejected() {
        let long = "x".repeat(MAX_TOKEN_LEN + 1);
        assert!(SyncToken::new(long).is_none());
        assert!(SyncToken::new("x".repeat(MAX_TOKEN_LEN)).is_some());
    }

    #[test]
    fn debug_marks_empty_token() {
        assert_eq!(format!("{:?}", SyncToken::empty()), "SyncToken(<empty>)");
    }

    #[test]
    fn transaction_ids_differ_within_same_millisecond() {
        let a = TransactionId::from_clock(1_000, 1);
        let b = TransactionId::from_clock(1_000, 2);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "m1000.1");
    }
}
