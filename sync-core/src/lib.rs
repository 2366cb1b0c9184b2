//! # sync-core
//!
//! Pure logic for picochat (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms of the sync
//! engine without any network access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! State machines here take an event and return actions. The bounded JSON
//! extractor works over any [`std::io::Read`], so tests feed it byte slices
//! while the client feeds it a live response body. The actual I/O is
//! performed by `sync-client`, which interprets the actions.
//!
//! ## Modules
//!
//! - [`extract`]: token probe and keep-path filtered decode under a byte ceiling
//! - [`state`]: the sync state machine (probe, fetch, invalidation recovery)
//! - [`history`]: fixed-capacity message ring
//! - [`compose`]: draft editing and the send handshake
//! - [`schedule`]: periodic and forced sync timing
//! - [`request`]: URL and body shaping for the homeserver API
//! - [`response`]: turning a filtered sync body into a token and messages

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compose;
pub mod extract;
pub mod history;
pub mod request;
pub mod response;
pub mod schedule;
pub mod state;

pub use compose::{ComposeAction, ComposeEvent, ComposeState, Composer};
pub use extract::{decode_filtered, probe_token, ExtractError, KeepPaths};
pub use history::MessageHistory;
pub use request::{Endpoints, PROBE_FILTER};
pub use response::{decode_incremental, IncrementalBatch};
pub use schedule::SyncSchedule;
pub use state::{Action, Event, SyncState};
