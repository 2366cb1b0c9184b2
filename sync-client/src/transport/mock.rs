//! Mock transport for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{HttpResponse, Transport, TransportError};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// `GET` or `PUT`.
    pub method: &'static str,
    /// Full request URL.
    pub url: String,
    /// Request body (empty for GET).
    pub body: String,
}

/// Mock transport for testing.
///
/// Allows queueing responses and capturing sent requests for verification.
/// Clones share state, so a test can keep a handle after moving one into
/// the engine.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    requests: Vec<RecordedRequest>,
    get_queue: VecDeque<(u16, Vec<u8>)>,
    put_queue: VecDeque<u16>,
    fail_next_get: Option<String>,
    fail_next_put: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `get()` call.
    pub fn queue_get(&self, status: u16, body: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.get_queue.push_back((status, body.into()));
    }

    /// Queue a status for the next `put()` call.
    ///
    /// With nothing queued, `put()` answers 200.
    pub fn queue_put(&self, status: u16) {
        let mut inner = self.inner.lock().unwrap();
        inner.put_queue.push_back(status);
    }

    /// Get all requests that were issued.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Get the last request that was issued.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }

    /// Cause the next get() to fail with the given error.
    pub fn fail_next_get(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_get = Some(error.to_string());
    }

    /// Cause the next put() to fail with the given error.
    pub fn fail_next_put(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_put = Some(error.to_string());
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: String::new(),
        });

        // Check for forced failure
        if let Some(error) = inner.fail_next_get.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        let (status, body) = inner
            .get_queue
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)?;
        Ok(HttpResponse {
            status,
            body: Box::new(Cursor::new(body)),
        })
    }

    fn put(&self, url: &str, body: &str) -> Result<u16, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(RecordedRequest {
            method: "PUT",
            url: url.to_string(),
            body: body.to_string(),
        });

        // Check for forced failure
        if let Some(error) = inner.fail_next_put.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        Ok(inner.put_queue.pop_front().unwrap_or(200))
    }
}
