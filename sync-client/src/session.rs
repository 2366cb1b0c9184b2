//! ChatSession - the single-threaded loop body.
//!
//! A driver (terminal, firmware main loop) calls [`ChatSession::tick`] with
//! the clock and at most one input. Each tick applies the input to the
//! composer, executes whatever the composer asks for, then runs a sync cycle
//! if one is due. Nothing here spawns threads or blocks beyond the
//! transport's own timeout.

use std::collections::VecDeque;

use picochat_core::{ComposeAction, ComposeEvent, Composer, MessageHistory, SyncSchedule};
use picochat_types::{SyncStatus, TransactionId};

use crate::config::ClientConfig;
use crate::engine::{ClientError, CycleOutcome, SyncEngine};
use crate::memory::MemoryProbe;
use crate::transport::Transport;

/// Tick wait while sync is suspended for composition.
pub const SUSPENDED_POLL_MS: u64 = 1_000;

/// One unit of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A single typed character.
    Char(char),
    /// Delete the last draft character.
    Backspace,
    /// A whole line from a line-buffered terminal: typed, then committed.
    ///
    /// If a failed draft is still kept, the text is appended to it.
    Line(String),
    /// Send the draft.
    Commit,
    /// Discard the draft.
    Cancel,
}

/// Result of one send attempt.
#[derive(Debug)]
pub struct SendReport {
    /// Transaction id used for the attempt.
    pub txn: TransactionId,
    /// What the server said.
    pub result: Result<(), ClientError>,
}

/// What a tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// The sync cycle outcome, if a cycle was due.
    pub sync: Option<CycleOutcome>,
    /// The send attempt, if the input committed a draft.
    pub send: Option<SendReport>,
}

/// Engine, composer and schedule wired together.
pub struct ChatSession<T: Transport, M: MemoryProbe> {
    engine: SyncEngine<T, M>,
    composer: Composer,
    schedule: SyncSchedule,
}

impl<T: Transport, M: MemoryProbe> ChatSession<T, M> {
    /// Create a session. The first tick always syncs.
    pub fn new(config: &ClientConfig, transport: T, memory: M) -> Self {
        Self {
            engine: SyncEngine::new(config, transport, memory),
            composer: Composer::new(config.history.body_max_chars),
            schedule: SyncSchedule::new(config.sync_interval()),
        }
    }

    /// Advance the session to `now_ms`.
    pub fn tick(&mut self, now_ms: u64, input: Option<Input>) -> TickReport {
        let mut report = TickReport::default();

        if let Some(input) = input {
            let actions = match input {
                Input::Char(c) => self.composer.on_event(ComposeEvent::Key(c)),
                Input::Backspace => self.composer.on_event(ComposeEvent::Backspace),
                Input::Line(text) => {
                    let mut actions = self.composer.type_text(&text);
                    actions.extend(self.composer.on_event(ComposeEvent::Commit { now_ms }));
                    actions
                }
                Input::Commit => self.composer.on_event(ComposeEvent::Commit { now_ms }),
                Input::Cancel => self.composer.on_event(ComposeEvent::Cancel),
            };
            report.send = self.execute(actions);
        }

        if self.schedule.is_due(now_ms) {
            let outcome = self.engine.run_sync_cycle();
            if outcome.consumed_trigger() {
                self.schedule.mark_ran(now_ms);
            }
            report.sync = Some(outcome);
        }

        report
    }

    /// Execute composer actions, feeding send results back in.
    fn execute(&mut self, actions: Vec<ComposeAction>) -> Option<SendReport> {
        let mut queue: VecDeque<ComposeAction> = actions.into();
        let mut send = None;

        while let Some(action) = queue.pop_front() {
            match action {
                ComposeAction::SuspendSync => self.engine.suspend(),
                ComposeAction::ResumeSync => self.engine.resume(),
                ComposeAction::ForceSync => self.schedule.force(),
                ComposeAction::Send { txn, body } => {
                    let result = self.engine.send(&txn, &body);
                    let event = match &result {
                        Ok(()) => ComposeEvent::SendSucceeded,
                        Err(e) => {
                            tracing::warn!(%txn, error = %e, "send failed; draft kept");
                            ComposeEvent::SendFailed
                        }
                    };
                    queue.extend(self.composer.on_event(event));
                    send = Some(SendReport { txn, result });
                }
            }
        }
        send
    }

    /// The message history.
    pub fn history(&self) -> &MessageHistory {
        self.engine.history()
    }

    /// The current draft.
    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    /// Check if the user is composing.
    pub fn is_composing(&self) -> bool {
        self.composer.is_composing()
    }

    /// The user-facing sync indicator.
    pub fn status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Milliseconds the driver may wait before the next tick.
    ///
    /// While composing, a due sync can only run after an input, so this is
    /// the input poll interval rather than zero.
    pub fn next_due_ms(&self, now_ms: u64) -> u64 {
        if self.engine.state().is_suspended() {
            return SUSPENDED_POLL_MS;
        }
        self.schedule.remaining_ms(now_ms)
    }

    /// The underlying engine.
    pub fn engine(&self) -> &SyncEngine<T, M> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemory;
    use crate::transport::MockTransport;
    use picochat_types::SyncPhase;

    const INTERVAL_MS: u64 = 10_000;

    fn session() -> (ChatSession<MockTransport, FixedMemory>, MockTransport) {
        let config = ClientConfig::new("https://hs", "!room:hs", "tok");
        let transport = MockTransport::new();
        let session = ChatSession::new(&config, transport.clone(), FixedMemory::new(1 << 20));
        (session, transport)
    }

    /// A session that has completed its startup probe at t=0.
    fn started() -> (ChatSession<MockTransport, FixedMemory>, MockTransport) {
        let (mut session, transport) = session();
        transport.queue_get(200, r#"{"next_batch":"s1"}"#);
        session.tick(0, None);
        (session, transport)
    }

    fn gets(transport: &MockTransport) -> usize {
        transport
            .requests()
            .iter()
            .filter(|r| r.method == "GET")
            .count()
    }

    #[test]
    fn first_tick_probes() {
        let (mut session, transport) = session();
        transport.queue_get(200, r#"{"next_batch":"s1"}"#);

        let report = session.tick(0, None);

        assert_eq!(
            report.sync,
            Some(CycleOutcome::Synced {
                phase: SyncPhase::Initial,
                appended: 0
            })
        );
        assert_eq!(session.status(), SyncStatus::Ok);
    }

    #[test]
    fn periodic_sync_waits_for_interval() {
        let (mut session, transport) = started();

        assert!(session.tick(INTERVAL_MS - 1, None).sync.is_none());
        assert_eq!(session.next_due_ms(INTERVAL_MS - 1), 1);

        transport.queue_get(200, r#"{"next_batch":"s2"}"#);
        assert!(session.tick(INTERVAL_MS, None).sync.is_some());
        assert_eq!(gets(&transport), 2);
    }

    #[test]
    fn composing_defers_sync_until_cancel() {
        let (mut session, transport) = started();

        session.tick(1_000, Some(Input::Char('h')));
        assert!(session.is_composing());

        for t in [INTERVAL_MS, 2 * INTERVAL_MS, 3 * INTERVAL_MS] {
            let report = session.tick(t, None);
            assert_eq!(report.sync, Some(CycleOutcome::Deferred));
        }
        assert_eq!(gets(&transport), 1);
        assert_eq!(session.status(), SyncStatus::Deferred);

        transport.queue_get(200, r#"{"next_batch":"s2"}"#);
        let report = session.tick(3 * INTERVAL_MS + 1, Some(Input::Cancel));
        assert!(matches!(report.sync, Some(CycleOutcome::Synced { .. })));
        assert!(!session.is_composing());
        assert!(session.draft().is_empty());

        // exactly one catch-up cycle
        assert!(session.tick(3 * INTERVAL_MS + 2, None).sync.is_none());
        assert_eq!(gets(&transport), 2);
    }

    #[test]
    fn successful_send_forces_sync() {
        let (mut session, transport) = started();
        transport.queue_get(200, r#"{"next_batch":"s2"}"#);

        let report = session.tick(500, Some(Input::Line("hello".into())));

        let send = report.send.unwrap();
        assert!(send.result.is_ok());
        assert_eq!(send.txn.as_str(), "m500.1");
        assert!(matches!(
            report.sync,
            Some(CycleOutcome::Synced {
                phase: SyncPhase::Incremental,
                ..
            })
        ));
        assert!(!session.is_composing());

        let put = transport
            .requests()
            .into_iter()
            .find(|r| r.method == "PUT")
            .unwrap();
        assert_eq!(put.body, r#"{"msgtype":"m.text","body":"hello"}"#);
    }

    #[test]
    fn failed_send_keeps_draft_and_stays_suspended() {
        let (mut session, transport) = started();
        transport.queue_put(500);

        let report = session.tick(500, Some(Input::Line("hello".into())));

        assert!(matches!(
            report.send.unwrap().result,
            Err(ClientError::Rejected(500))
        ));
        assert!(report.sync.is_none());
        assert_eq!(session.draft(), "hello");
        assert!(session.is_composing());

        // the deferred sync does not turn into a zero wait
        for t in INTERVAL_MS..INTERVAL_MS + 5 {
            assert_eq!(session.tick(t, None).sync, Some(CycleOutcome::Deferred));
            assert_eq!(session.next_due_ms(t), SUSPENDED_POLL_MS);
        }

        // retry with a fresh transaction id
        let report = session.tick(INTERVAL_MS + 10, Some(Input::Commit));
        let send = report.send.unwrap();
        assert!(send.result.is_ok());
        assert_eq!(send.txn.as_str(), format!("m{}.2", INTERVAL_MS + 10));
    }

    #[test]
    fn send_connection_failure_keeps_draft() {
        let (mut session, transport) = started();
        transport.fail_next_put("connection reset");

        let report = session.tick(500, Some(Input::Line("hello".into())));

        assert!(matches!(
            report.send.unwrap().result,
            Err(ClientError::Transport(_))
        ));
        assert_eq!(session.draft(), "hello");
        assert!(session.engine().state().is_suspended());
    }

    #[test]
    fn typing_edits_draft() {
        let (mut session, _) = started();

        for c in "hix".chars() {
            session.tick(100, Some(Input::Char(c)));
        }
        session.tick(100, Some(Input::Backspace));

        assert_eq!(session.draft(), "hi");
    }

    #[test]
    fn empty_commit_sends_nothing() {
        let (mut session, transport) = started();

        let report = session.tick(100, Some(Input::Commit));

        assert!(report.send.is_none());
        assert!(transport.requests().iter().all(|r| r.method == "GET"));
    }
}
