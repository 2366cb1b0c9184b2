//! HTTPS transport backed by ureq.
//!
//! Blocking calls with a per-request timeout. Response bodies are handed
//! back as ureq's streaming reader, so nothing here buffers a whole body.

use std::error::Error as _;
use std::io::{self, Read};

use super::{HttpResponse, Transport, TransportError};
use crate::config::ClientConfig;

/// ureq-based transport with the bearer token bound in.
pub struct HttpTransport {
    agent: ureq::Agent,
    authorization: String,
}

impl HttpTransport {
    /// Create a transport using the configured access token and timeout.
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .build();
        Self {
            agent,
            authorization: format!("Bearer {}", config.homeserver.access_token),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("authorization", &"Bearer [REDACTED]")
            .finish()
    }
}

fn map_transport_error(err: ureq::Transport) -> TransportError {
    if is_timeout(&err) {
        TransportError::Timeout
    } else {
        TransportError::ConnectionFailed(err.to_string())
    }
}

/// An I/O failure whose source is a socket timeout.
fn is_timeout(err: &ureq::Transport) -> bool {
    if !matches!(err.kind(), ureq::ErrorKind::Io) {
        return false;
    }
    err.source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|io_err| {
            matches!(
                io_err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            )
        })
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = match self
            .agent
            .get(url)
            .set("Authorization", &self.authorization)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => return Err(map_transport_error(err)),
        };

        let status = response.status();
        let body: Box<dyn Read + Send> = response.into_reader();
        Ok(HttpResponse { status, body })
    }

    fn put(&self, url: &str, body: &str) -> Result<u16, TransportError> {
        let result = self
            .agent
            .put(url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_string(body);

        match result {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(status, _)) => Ok(status),
            Err(ureq::Error::Transport(err)) => Err(map_transport_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_access_token() {
        let config = ClientConfig::new("https://hs", "!r:hs", "syt_secret");
        let transport = HttpTransport::new(&config);
        assert!(!format!("{:?}", transport).contains("syt_secret"));
    }

    #[test]
    fn silent_server_is_timeout() {
        // accepted by the kernel backlog, never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/_matrix/client/v3/sync", listener.local_addr().unwrap());

        let mut config = ClientConfig::new("http://127.0.0.1", "!r:hs", "tok");
        config.sync.request_timeout_secs = 1;
        let transport = HttpTransport::new(&config);

        let result = transport.get(&url);
        assert!(matches!(result, Err(TransportError::Timeout)), "{:?}", result.err());
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let mut config = ClientConfig::new("http://127.0.0.1:9", "!r:hs", "tok");
        config.sync.request_timeout_secs = 1;
        let transport = HttpTransport::new(&config);

        let result = transport.get("http://127.0.0.1:9/_matrix/client/v3/sync");
        assert!(result.is_err());
    }
}
