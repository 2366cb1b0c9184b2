//! Transport abstraction for picochat.
//!
//! This module provides a pluggable HTTP layer that abstracts the underlying
//! client (ureq over TLS, mock for testing).
//!
//! # Design
//!
//! The transport is blocking and request-oriented:
//! - `get()` returns a status code and a streaming body reader
//! - `put()` sends a JSON body and returns the status code
//!
//! The bearer token is bound at construction, so the engine never handles
//! credentials. A non-2xx status is a successful transport call; only
//! connection-level failures are [`TransportError`]s.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_get(200, br#"{"next_batch":"s1"}"#.to_vec());
//! let response = transport.get("https://hs/_matrix/client/v3/sync")?;
//! assert_eq!(response.status, 200);
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};

use std::io::Read;

use picochat_types::SyncError;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS or TLS failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No response arrived before the transport's timeout.
    #[error("request timed out")]
    Timeout,

    /// The peer closed the connection before responding.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        SyncError::TransientNetwork(err.to_string())
    }
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Streaming body. Read at most once.
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Transport trait for the homeserver calls.
///
/// Implementations handle the underlying connection mechanism and add the
/// `Authorization: Bearer` header.
pub trait Transport: Send + Sync {
    /// Issue a GET and return the status plus an unread body.
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Issue a PUT with a JSON body and return the status.
    fn put(&self, url: &str, body: &str) -> Result<u16, TransportError>;
}
