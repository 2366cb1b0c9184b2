//! SyncEngine - the I/O half of the sync protocol.
//!
//! This module provides [`SyncEngine`], which owns the session context
//! (continuation token and message history) and runs sync cycles.
//!
//! # Architecture
//!
//! SyncEngine uses a pure state machine (from sync-core) for protocol logic
//! and interprets the actions to perform actual I/O via the Transport trait.
//!
//! ```text
//! ChatSession → SyncEngine → Transport → Network
//!                   ↓
//!              sync-core (state machine, bounded extractor)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use picochat_client::{ClientConfig, FixedMemory, MockTransport, SyncEngine};
//!
//! let config = ClientConfig::new("https://hs", "!room:hs", "token");
//! let mut engine = SyncEngine::new(&config, MockTransport::new(), FixedMemory::new(1 << 20));
//!
//! engine.run_sync_cycle(); // probe: establishes the token
//! engine.run_sync_cycle(); // incremental: appends new messages
//! ```

use picochat_core::{
    decode_incremental, probe_token, Action, Endpoints, Event, MessageHistory, SyncState,
};
use picochat_types::{SyncError, SyncPhase, SyncStatus, SyncToken, TransactionId};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::memory::MemoryProbe;
use crate::transport::{Transport, TransportError};

/// Client errors for the send path.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The server answered with a non-200 status.
    #[error("send rejected (HTTP {0})")]
    Rejected(u16),
}

/// What one call to [`SyncEngine::run_sync_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle completed and committed its token.
    Synced {
        /// Which phase ran.
        phase: SyncPhase,
        /// Messages appended to history.
        appended: usize,
    },
    /// Composition is in progress; the trigger stays pending.
    Deferred,
    /// Admission control refused the cycle; no request was issued.
    Skipped(SyncError),
    /// The request or decode failed; token handling follows the error.
    Failed {
        /// Which phase ran.
        phase: SyncPhase,
        /// Why it failed.
        error: SyncError,
    },
}

impl CycleOutcome {
    /// Whether the trigger was consumed (anything but a deferral).
    pub fn consumed_trigger(&self) -> bool {
        !matches!(self, Self::Deferred)
    }
}

/// Session context: everything a sync cycle reads or writes.
#[derive(Debug)]
struct SyncContext {
    token: SyncToken,
    history: MessageHistory,
    status: SyncStatus,
}

/// Owns the sync session and drives it one cycle at a time.
///
/// Not `Clone` and takes `&mut self` for every cycle, so at most one sync
/// is ever in flight.
pub struct SyncEngine<T: Transport, M: MemoryProbe> {
    transport: T,
    memory: M,
    endpoints: Endpoints,
    memory_floor: u64,
    decode_ceiling: usize,
    state: SyncState,
    ctx: SyncContext,
}

impl<T: Transport, M: MemoryProbe> SyncEngine<T, M> {
    /// Create an engine with an empty token and empty history.
    pub fn new(config: &ClientConfig, transport: T, memory: M) -> Self {
        Self {
            transport,
            memory,
            endpoints: Endpoints::new(&config.homeserver.url, &config.homeserver.room_id),
            memory_floor: config.sync.memory_floor_bytes,
            decode_ceiling: config.sync.decode_ceiling_bytes,
            state: SyncState::new(),
            ctx: SyncContext {
                token: SyncToken::empty(),
                history: MessageHistory::new(
                    config.history.capacity,
                    config.history.body_max_chars,
                ),
                status: SyncStatus::Idle,
            },
        }
    }

    /// Run one sync cycle.
    ///
    /// Performs zero or one round trip. The token and history change only
    /// after a response has been fully decoded, so a failed cycle leaves
    /// them as they were (except that a rejected token is cleared).
    pub fn run_sync_cycle(&mut self) -> CycleOutcome {
        debug_assert!(!self.state.is_in_flight());
        if self.state.is_suspended() {
            self.step(Event::Triggered {
                phase: self.ctx.token.phase(),
            });
            return CycleOutcome::Deferred;
        }

        let available = self.memory.available_bytes();
        if available < self.memory_floor {
            let error = SyncError::MemoryFloorBreach {
                available,
                floor: self.memory_floor,
            };
            tracing::warn!(available, floor = self.memory_floor, "sync skipped: low memory");
            self.step(Event::AdmissionDenied {
                error: error.clone(),
            });
            return CycleOutcome::Skipped(error);
        }

        let phase = self.ctx.token.phase();
        let result = match self.step(Event::Triggered { phase }) {
            Some(Request::Probe) => self.probe(),
            Some(Request::Fetch) => self.fetch(),
            None => return CycleOutcome::Deferred,
        };

        match result {
            Ok(event) => {
                let appended = match &event {
                    Event::FetchCompleted { messages, .. } => messages.len(),
                    _ => 0,
                };
                self.step(event);
                CycleOutcome::Synced { phase, appended }
            }
            Err(error) => {
                let event = match phase {
                    SyncPhase::Initial => Event::ProbeFailed {
                        error: error.clone(),
                    },
                    SyncPhase::Incremental => Event::FetchFailed {
                        error: error.clone(),
                    },
                };
                self.step(event);
                CycleOutcome::Failed { phase, error }
            }
        }
    }

    /// Phase one: locate the token in the raw stream.
    fn probe(&mut self) -> Result<Event, SyncError> {
        let response = self.transport.get(&self.endpoints.probe_url())?;
        if !response.is_success() {
            return Err(SyncError::from_status(response.status));
        }

        match probe_token(response.body)? {
            Some(token) if !token.is_empty() => {
                tracing::info!("sync token acquired");
                Ok(Event::ProbeCompleted { token })
            }
            _ => Err(SyncError::DecodeMalformed("next_batch not found".into())),
        }
    }

    /// Phase two: filtered decode of everything after the token.
    fn fetch(&mut self) -> Result<Event, SyncError> {
        let url = self.endpoints.incremental_url(&self.ctx.token);
        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(SyncError::from_status(response.status));
        }

        let batch = decode_incremental(
            response.body,
            self.endpoints.room_id(),
            self.decode_ceiling,
            self.ctx.history.body_max_chars(),
        )?;
        if !batch.room_present {
            tracing::trace!("target room absent from this batch");
        }
        tracing::debug!(messages = batch.messages.len(), "incremental sync decoded");
        Ok(Event::FetchCompleted {
            token: batch.token,
            messages: batch.messages,
        })
    }

    /// Feed an event to the state machine and apply its actions.
    ///
    /// Returns the request the machine asked for, if any.
    fn step(&mut self, event: Event) -> Option<Request> {
        let (state, actions) = std::mem::take(&mut self.state).on_event(event);
        self.state = state;

        let mut request = None;
        for action in actions {
            match action {
                Action::IssueProbe => request = Some(Request::Probe),
                Action::IssueFetch => request = Some(Request::Fetch),
                Action::StoreToken(token) => self.ctx.token = token,
                Action::ClearToken => {
                    tracing::warn!("sync token rejected; re-probing next cycle");
                    self.ctx.token.clear();
                }
                Action::AppendMessages(messages) => {
                    for message in messages {
                        self.ctx.history.push(message);
                    }
                }
                Action::Report(status) => {
                    if status != self.ctx.status {
                        tracing::debug!(status = status.label(), "sync status changed");
                    }
                    self.ctx.status = status;
                }
            }
        }
        request
    }

    /// Send a text message with the given transaction id.
    ///
    /// No client-side dedup: every call is one PUT. Success is HTTP 200.
    pub fn send(&mut self, txn: &TransactionId, text: &str) -> Result<(), ClientError> {
        let body =
            Endpoints::send_body(text).map_err(|e| ClientError::Serialization(e.to_string()))?;
        let status = self.transport.put(&self.endpoints.send_url(txn), &body)?;
        if status != 200 {
            tracing::warn!(%txn, status, "send rejected");
            return Err(ClientError::Rejected(status));
        }
        tracing::info!(%txn, "message sent");
        Ok(())
    }

    /// Defer sync triggers (composition started).
    pub fn suspend(&mut self) {
        self.step(Event::Suspend);
    }

    /// Accept sync triggers again (composition ended).
    pub fn resume(&mut self) {
        self.step(Event::Resume);
    }

    /// The current continuation token.
    pub fn token(&self) -> &SyncToken {
        &self.ctx.token
    }

    /// The message history.
    pub fn history(&self) -> &MessageHistory {
        &self.ctx.history
    }

    /// The user-facing status indicator.
    pub fn status(&self) -> SyncStatus {
        self.ctx.status
    }

    /// The state machine's current state.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// The transport (for inspection in tests and drivers).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Request kinds the state machine can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Probe,
    Fetch,
}
