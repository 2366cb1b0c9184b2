//! # sync-types
//!
//! Data types shared by the picochat crates.
//!
//! This crate provides the foundational types used across the workspace:
//! - [`SyncToken`], [`SyncPhase`] - The continuation cursor and the phase it implies
//! - [`TransactionId`] - Idempotency key for outbound sends
//! - [`Message`], [`TimelineEvent`] - Admitted history entries and raw timeline events
//! - [`SyncError`], [`SyncStatus`] - Error taxonomy and the user-facing indicator

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod event;
mod ids;
mod message;

pub use error::{SyncError, SyncStatus};
pub use event::{EventContent, TimelineEvent, MSGTYPE_TEXT, ROOM_MESSAGE_EVENT};
pub use ids::{SyncPhase, SyncToken, TransactionId, MAX_TOKEN_LEN};
pub use message::{
    truncate_chars, Message, DEFAULT_BODY_MAX_CHARS, DEFAULT_HISTORY_CAPACITY, SENDER_MAX_CHARS,
};
