//! Bounded JSON extraction for sync responses.
//!
//! A sync response can be arbitrarily large, so nothing here ever holds a
//! whole body. Two modes:
//!
//! - [`probe_token`] scans the raw stream for the `next_batch` field and
//!   returns its string verbatim. Used on the tiny phase-one payload.
//! - [`decode_filtered`] decodes the stream structurally but keeps only the
//!   fields on a [`KeepPaths`] filter, charging each retained node against a
//!   byte ceiling.
//!
//! # Example
//!
//! ```
//! use picochat_core::extract::{decode_filtered, KeepPaths};
//!
//! let body = br#"{"next_batch":"s9","presence":{"events":[1,2,3]}}"#;
//! let keep = KeepPaths::new(["next_batch"]);
//! let value = decode_filtered(&body[..], &keep, 1024).unwrap();
//! assert_eq!(value["next_batch"], "s9");
//! assert!(value.get("presence").is_none());
//! ```

mod decode;
mod filter;
mod guard;
mod probe;

pub use decode::{decode_filtered, NODE_COST};
pub use filter::{KeepPaths, Verdict};
pub use probe::{probe_token, TOKEN_MARKER};

use picochat_types::SyncError;
use thiserror::Error;

/// Extraction errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Retained data would exceed the ceiling.
    #[error("retained data exceeds {ceiling} bytes")]
    Overflow {
        /// The ceiling in bytes.
        ceiling: usize,
    },

    /// The stream is not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// Reading the stream failed.
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractError> for SyncError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Overflow { ceiling } => SyncError::DecodeOverflow { ceiling },
            ExtractError::Malformed(msg) => SyncError::DecodeMalformed(msg),
            ExtractError::Io(e) => SyncError::TransientNetwork(e.to_string()),
        }
    }
}
