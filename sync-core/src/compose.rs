//! Compose/send state machine for picochat.
//!
//! Owns the draft text and gates it against sync activity:
//! - The first keystroke moves `Viewing -> Composing` and suspends sync
//! - Commit with a non-empty draft emits one send with a fresh transaction id
//! - A successful send clears the draft, resumes sync and forces a cycle
//! - A failed send keeps the draft so the user can retry or cancel
//!
//! Like the sync state machine, this performs no I/O; the send itself is
//! issued by sync-client, which reports the result back as an event.

use picochat_types::{truncate_chars, TransactionId};

/// Where the user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposeState {
    /// Reading history; sync runs on schedule.
    #[default]
    Viewing,
    /// Typing a draft; periodic sync is deferred.
    Composing,
}

/// Input and send results fed to the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeEvent {
    /// A printable character was typed.
    Key(char),
    /// Delete the last character of the draft.
    Backspace,
    /// Explicit send action.
    Commit {
        /// Monotonic clock reading in milliseconds.
        now_ms: u64,
    },
    /// Discard the draft.
    Cancel,
    /// The server accepted the send.
    SendSucceeded,
    /// The send failed; the draft is kept.
    SendFailed,
}

/// Actions to be executed by the sync-client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    /// Defer periodic sync triggers.
    SuspendSync,
    /// Accept sync triggers again.
    ResumeSync,
    /// Issue one send.
    Send {
        /// Idempotency key for this attempt.
        txn: TransactionId,
        /// Draft text.
        body: String,
    },
    /// Run one sync on the next tick, outside the periodic schedule.
    ForceSync,
}

/// Draft owner and compose state.
#[derive(Debug, Clone)]
pub struct Composer {
    state: ComposeState,
    draft: String,
    body_max_chars: usize,
    attempts: u32,
    pending: Option<TransactionId>,
}

impl Composer {
    /// Create a composer whose draft holds at most `body_max_chars`.
    pub fn new(body_max_chars: usize) -> Self {
        Self {
            state: ComposeState::Viewing,
            draft: String::new(),
            body_max_chars,
            attempts: 0,
            pending: None,
        }
    }

    /// Process an event and return the actions to execute.
    pub fn on_event(&mut self, event: ComposeEvent) -> Vec<ComposeAction> {
        match (self.state, event) {
            (
                _,
                ComposeEvent::Key(_)
                | ComposeEvent::Backspace
                | ComposeEvent::Commit { .. }
                | ComposeEvent::Cancel,
            ) if self.pending.is_some() => vec![],

            (ComposeState::Viewing, ComposeEvent::Key(c)) => {
                if c.is_control() {
                    return vec![];
                }
                self.draft.push(c);
                self.state = ComposeState::Composing;
                vec![ComposeAction::SuspendSync]
            }

            (ComposeState::Composing, ComposeEvent::Key(c)) => {
                if !c.is_control() && self.draft.chars().count() < self.body_max_chars {
                    self.draft.push(c);
                }
                vec![]
            }
            (ComposeState::Composing, ComposeEvent::Backspace) => {
                self.draft.pop();
                vec![]
            }
            (ComposeState::Composing, ComposeEvent::Commit { now_ms }) => {
                if self.draft.is_empty() {
                    return vec![];
                }
                self.attempts = self.attempts.wrapping_add(1);
                let txn = TransactionId::from_clock(now_ms, self.attempts);
                self.pending = Some(txn.clone());
                vec![ComposeAction::Send {
                    txn,
                    body: self.draft.clone(),
                }]
            }
            (ComposeState::Composing, ComposeEvent::Cancel) => {
                self.draft.clear();
                self.state = ComposeState::Viewing;
                vec![ComposeAction::ResumeSync]
            }
            (ComposeState::Composing, ComposeEvent::SendSucceeded) if self.pending.is_some() => {
                self.pending = None;
                self.draft.clear();
                self.state = ComposeState::Viewing;
                vec![ComposeAction::ResumeSync, ComposeAction::ForceSync]
            }
            (ComposeState::Composing, ComposeEvent::SendFailed) => {
                self.pending = None;
                vec![]
            }

            _ => vec![],
        }
    }

    /// Type a whole line at once, as a line-buffered terminal delivers it.
    ///
    /// Equivalent to one `Key` event per character.
    pub fn type_text(&mut self, text: &str) -> Vec<ComposeAction> {
        let text = truncate_chars(text, self.body_max_chars);
        let mut actions = Vec::new();
        for c in text.chars() {
            actions.extend(self.on_event(ComposeEvent::Key(c)));
        }
        actions
    }

    /// Current state.
    pub fn state(&self) -> ComposeState {
        self.state
    }

    /// Check if the user is composing.
    pub fn is_composing(&self) -> bool {
        self.state == ComposeState::Composing
    }

    /// The current draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// The transaction id of the send awaiting a result, if any.
    pub fn pending(&self) -> Option<&TransactionId> {
        self.pending.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composing(text: &str) -> Composer {
        let mut composer = Composer::new(119);
        composer.type_text(text);
        composer
    }

    fn sent(actions: &[ComposeAction]) -> Option<(&TransactionId, &str)> {
        actions.iter().find_map(|a| match a {
            ComposeAction::Send { txn, body } => Some((txn, body.as_str())),
            _ => None,
        })
    }

    #[test]
    fn starts_viewing() {
        let composer = Composer::new(119);
        assert_eq!(composer.state(), ComposeState::Viewing);
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn first_keystroke_starts_composing_and_suspends() {
        let mut composer = Composer::new(119);
        let actions = composer.on_event(ComposeEvent::Key('h'));

        assert!(composer.is_composing());
        assert_eq!(actions, vec![ComposeAction::SuspendSync]);

        let actions = composer.on_event(ComposeEvent::Key('i'));
        assert!(actions.is_empty());
        assert_eq!(composer.draft(), "hi");
    }

    #[test]
    fn control_characters_ignored() {
        let mut composer = Composer::new(119);
        assert!(composer.on_event(ComposeEvent::Key('\n')).is_empty());
        assert_eq!(composer.state(), ComposeState::Viewing);
    }

    #[test]
    fn draft_capped_at_body_max() {
        let mut composer = Composer::new(3);
        for c in "abcdef".chars() {
            composer.on_event(ComposeEvent::Key(c));
        }
        assert_eq!(composer.draft(), "abc");
    }

    #[test]
    fn backspace_edits_draft() {
        let mut composer = composing("abc");
        composer.on_event(ComposeEvent::Backspace);
        assert_eq!(composer.draft(), "ab");
    }

    #[test]
    fn commit_emits_send_with_fresh_txn() {
        let mut composer = composing("hello");
        let actions = composer.on_event(ComposeEvent::Commit { now_ms: 5000 });

        let (txn, body) = sent(&actions).unwrap();
        assert_eq!(body, "hello");
        assert_eq!(txn.as_str(), "m5000.1");
        assert_eq!(composer.pending(), Some(txn));
    }

    #[test]
    fn empty_commit_does_nothing() {
        let mut composer = composing("a");
        composer.on_event(ComposeEvent::Backspace);
        let actions = composer.on_event(ComposeEvent::Commit { now_ms: 1 });
        assert!(actions.is_empty());
        assert!(composer.is_composing());
    }

    #[test]
    fn send_success_clears_and_forces_sync() {
        let mut composer = composing("hello");
        composer.on_event(ComposeEvent::Commit { now_ms: 1 });
        let actions = composer.on_event(ComposeEvent::SendSucceeded);

        assert_eq!(
            actions,
            vec![ComposeAction::ResumeSync, ComposeAction::ForceSync]
        );
        assert_eq!(composer.state(), ComposeState::Viewing);
        assert!(composer.draft().is_empty());
        assert!(composer.pending().is_none());
    }

    #[test]
    fn send_failure_keeps_draft() {
        let mut composer = composing("hello");
        composer.on_event(ComposeEvent::Commit { now_ms: 1 });
        let actions = composer.on_event(ComposeEvent::SendFailed);

        assert!(actions.is_empty());
        assert!(composer.is_composing());
        assert_eq!(composer.draft(), "hello");
    }

    #[test]
    fn retry_after_failure_uses_new_txn() {
        let mut composer = composing("hello");
        let first = composer.on_event(ComposeEvent::Commit { now_ms: 7 });
        composer.on_event(ComposeEvent::SendFailed);
        let second = composer.on_event(ComposeEvent::Commit { now_ms: 7 });

        let (txn1, _) = sent(&first).unwrap();
        let (txn2, _) = sent(&second).unwrap();
        assert_ne!(txn1, txn2);
    }

    #[test]
    fn cancel_discards_and_resumes() {
        let mut composer = composing("draft");
        let actions = composer.on_event(ComposeEvent::Cancel);

        assert_eq!(actions, vec![ComposeAction::ResumeSync]);
        assert_eq!(composer.state(), ComposeState::Viewing);
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn cancel_while_viewing_is_no_op() {
        let mut composer = Composer::new(119);
        assert!(composer.on_event(ComposeEvent::Cancel).is_empty());
    }

    #[test]
    fn input_ignored_while_send_pending() {
        let mut composer = composing("x");
        composer.on_event(ComposeEvent::Commit { now_ms: 1 });

        assert!(composer.on_event(ComposeEvent::Key('y')).is_empty());
        assert!(composer.on_event(ComposeEvent::Commit { now_ms: 2 }).is_empty());
        assert_eq!(composer.draft(), "x");
    }

    #[test]
    fn type_text_truncates_long_line() {
        let mut composer = Composer::new(4);
        let actions = composer.type_text("abcdefgh");
        assert_eq!(actions, vec![ComposeAction::SuspendSync]);
        assert_eq!(composer.draft(), "abcd");
    }
}
