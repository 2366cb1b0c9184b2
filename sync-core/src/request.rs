//! Request shaping for the homeserver API.
//!
//! Builds the URLs and bodies for the three calls the client makes. The
//! transport adds the bearer header; nothing here touches the network.

use picochat_types::{SyncToken, TransactionId, MSGTYPE_TEXT, ROOM_MESSAGE_EVENT};
use serde::Serialize;

/// Client-server API prefix appended to the homeserver base URL.
pub const CLIENT_API_PREFIX: &str = "/_matrix/client/v3";

/// Request-side filter for the probe: one timeline event per room.
pub const PROBE_FILTER: &str = r#"{"room":{"timeline":{"limit":1}}}"#;

/// Body of an outbound text message.
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'a str,
    body: &'a str,
}

/// URL builder bound to one homeserver and one room.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    room_id: String,
}

impl Endpoints {
    /// Bind to a homeserver base URL (with or without trailing slash) and a room.
    pub fn new(homeserver: &str, room_id: &str) -> Self {
        Self {
            base: format!("{}{}", homeserver.trim_end_matches('/'), CLIENT_API_PREFIX),
            room_id: room_id.to_string(),
        }
    }

    /// The room this client follows.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Phase-one URL: no wait, minimal timeline.
    pub fn probe_url(&self) -> String {
        format!(
            "{}/sync?timeout=0&filter={}",
            self.base,
            urlencoding::encode(PROBE_FILTER)
        )
    }

    /// Phase-two URL: no wait, resume after `since`.
    pub fn incremental_url(&self, since: &SyncToken) -> String {
        format!(
            "{}/sync?timeout=0&since={}",
            self.base,
            urlencoding::encode(since.as_str())
        )
    }

    /// PUT target for one send attempt.
    pub fn send_url(&self, txn: &TransactionId) -> String {
        format!(
            "{}/rooms/{}/send/{}/{}",
            self.base,
            urlencoding::encode(&self.room_id),
            ROOM_MESSAGE_EVENT,
            urlencoding::encode(txn.as_str())
        )
    }

    /// JSON body for a text message.
    pub fn send_body(text: &str) -> Result<String, serde_json::Error> {
        serde_json::to_string(&TextMessage {
            msgtype: MSGTYPE_TEXT,
            body: text,
        })
    }
}
