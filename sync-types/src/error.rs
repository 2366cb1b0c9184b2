//! Error types for picochat.

use thiserror::Error;

/// Why a sync cycle did not complete.
///
/// None of these is fatal. Each is absorbed by the engine and surfaced only
/// as a [`SyncStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Connection failure or a non-2xx status not otherwise classified.
    /// Retried by the next periodic trigger with the token untouched.
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    /// The server rejected the token or credentials. The token is cleared.
    #[error("token rejected (HTTP {status})")]
    TokenInvalid {
        /// HTTP status that triggered the classification.
        status: u16,
    },

    /// Retained data would have exceeded the decode ceiling.
    #[error("decode exceeded {ceiling} byte ceiling")]
    DecodeOverflow {
        /// Configured ceiling in bytes.
        ceiling: usize,
    },

    /// The response body was not valid JSON, or lacked required fields.
    #[error("malformed response: {0}")]
    DecodeMalformed(String),

    /// Free memory was below the admission floor; no request was issued.
    #[error("free memory {available} below floor {floor}")]
    MemoryFloorBreach {
        /// Free bytes reported by the probe.
        available: u64,
        /// Configured floor in bytes.
        floor: u64,
    },
}

impl SyncError {
    /// Classify a non-success HTTP status.
    ///
    /// 400, 401 and 404 mean the token or credentials are no longer good;
    /// everything else is transient.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 401 | 404 => Self::TokenInvalid { status },
            _ => Self::TransientNetwork(format!("HTTP {}", status)),
        }
    }

    /// Whether this error clears the continuation token.
    pub fn invalidates_token(&self) -> bool {
        matches!(self, Self::TokenInvalid { .. })
    }

    /// The indicator shown to the user for this error.
    pub fn status(&self) -> SyncStatus {
        match self {
            Self::TokenInvalid { .. } => SyncStatus::Reauthenticating,
            Self::MemoryFloorBreach { .. } => SyncStatus::LowMemory,
            Self::TransientNetwork(_) | Self::DecodeOverflow { .. } | Self::DecodeMalformed(_) => {
                SyncStatus::Retrying
            }
        }
    }
}

/// Best-effort sync indicator for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No sync has run yet.
    #[default]
    Idle,
    /// The last cycle succeeded.
    Ok,
    /// A due sync is waiting for composition to finish.
    Deferred,
    /// The last cycle failed and will be retried as-is.
    Retrying,
    /// The token was dropped; the next cycle re-probes.
    Reauthenticating,
    /// The last cycle was skipped by admission control.
    LowMemory,
}

impl SyncStatus {
    /// Short label for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ok => "ok",
            Self::Deferred => "deferred",
            Self::Retrying => "retrying",
            Self::Reauthenticating => "re-sync",
            Self::LowMemory => "low mem",
        }
    }
}
