//! Sync state machine for picochat.
//!
//! This module provides a pure, side-effect-free state machine for the
//! two-phase sync protocol. The state machine takes events as input and
//! produces a new state plus a list of actions to execute.
//!
//! The continuation token is not stored here: the phase of a trigger is
//! derived from the token by the caller and passed in, and token changes
//! come back out as actions. The actual I/O is performed by sync-client.

use picochat_types::{Message, SyncError, SyncPhase, SyncStatus, SyncToken};

/// Sync state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Waiting for a trigger.
    #[default]
    Idle,
    /// Phase-one request in flight: establishing a baseline token.
    InitialProbe,
    /// Phase-two request in flight: fetching events after the token.
    IncrementalFetch,
    /// Triggers are deferred while the user composes.
    BackoffSuspended,
}

impl SyncState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // From Idle
            (Self::Idle, Event::Triggered { phase }) => match phase {
                SyncPhase::Initial => (Self::InitialProbe, vec![Action::IssueProbe]),
                SyncPhase::Incremental => (Self::IncrementalFetch, vec![Action::IssueFetch]),
            },
            (Self::Idle, Event::AdmissionDenied { error }) => {
                (Self::Idle, vec![Action::Report(error.status())])
            }
            (Self::Idle, Event::Suspend) => (Self::BackoffSuspended, vec![]),

            // From InitialProbe
            (Self::InitialProbe, Event::ProbeCompleted { token }) => (
                Self::Idle,
                vec![Action::StoreToken(token), Action::Report(SyncStatus::Ok)],
            ),
            (Self::InitialProbe, Event::ProbeFailed { error }) => {
                let mut actions = Vec::with_capacity(2);
                if error.invalidates_token() {
                    actions.push(Action::ClearToken);
                }
                actions.push(Action::Report(error.status()));
                (Self::Idle, actions)
            }

            // From IncrementalFetch
            (Self::IncrementalFetch, Event::FetchCompleted { token, messages }) => {
                let mut actions = vec![Action::StoreToken(token)];
                if !messages.is_empty() {
                    actions.push(Action::AppendMessages(messages));
                }
                actions.push(Action::Report(SyncStatus::Ok));
                (Self::Idle, actions)
            }
            (Self::IncrementalFetch, Event::FetchFailed { error }) => {
                let mut actions = Vec::with_capacity(2);
                if error.invalidates_token() {
                    actions.push(Action::ClearToken);
                }
                actions.push(Action::Report(error.status()));
                (Self::Idle, actions)
            }

            // From BackoffSuspended
            (Self::BackoffSuspended, Event::Triggered { .. }) => (
                Self::BackoffSuspended,
                vec![Action::Report(SyncStatus::Deferred)],
            ),
            (Self::BackoffSuspended, Event::Resume) => (Self::Idle, vec![]),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a request is in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InitialProbe | Self::IncrementalFetch)
    }

    /// Check if triggers are currently deferred.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::BackoffSuspended)
    }
}

/// Events that drive the sync lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A sync is due (timer, post-send, or startup).
    Triggered {
        /// Phase derived from the current token.
        phase: SyncPhase,
    },
    /// Admission control refused the cycle before any request.
    AdmissionDenied {
        /// The breach that caused the refusal.
        error: SyncError,
    },
    /// The probe located a token.
    ProbeCompleted {
        /// The baseline token.
        token: SyncToken,
    },
    /// The probe failed or the token was not found.
    ProbeFailed {
        /// Why the probe failed.
        error: SyncError,
    },
    /// The incremental body decoded completely.
    FetchCompleted {
        /// The refreshed token.
        token: SyncToken,
        /// Admitted messages in timeline order.
        messages: Vec<Message>,
    },
    /// The incremental request or decode failed.
    FetchFailed {
        /// Why the fetch failed.
        error: SyncError,
    },
    /// Composition started: defer triggers.
    Suspend,
    /// Composition ended: accept triggers again.
    Resume,
}

/// Actions to be executed by the sync-client.
///
/// These are instructions, not side effects. The sync-client interprets
/// these and performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the phase-one probe request.
    IssueProbe,
    /// Send the phase-two request with the current token.
    IssueFetch,
    /// Replace the token.
    StoreToken(SyncToken),
    /// Drop the token so the next trigger re-probes.
    ClearToken,
    /// Append messages to history, in order.
    AppendMessages(Vec<Message>),
    /// Update the user-facing indicator.
    Report(SyncStatus),
}
