//! Timeline events as they arrive in a sync response.

use serde::Deserialize;

use crate::message::Message;

/// Event type of a room message.
pub const ROOM_MESSAGE_EVENT: &str = "m.room.message";

/// Message type of a plain text message.
pub const MSGTYPE_TEXT: &str = "m.text";

/// One timeline event, reduced to the fields the client looks at.
///
/// Transient: lives only for the decode cycle that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimelineEvent {
    /// Event type, e.g. `m.room.message`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Sender user id.
    #[serde(default)]
    pub sender: Option<String>,
    /// Event content.
    #[serde(default)]
    pub content: EventContent,
}

/// The part of an event's `content` the client reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventContent {
    /// Message type, e.g. `m.text`.
    #[serde(default)]
    pub msgtype: Option<String>,
    /// Message text.
    #[serde(default)]
    pub body: Option<String>,
}

impl TimelineEvent {
    /// Admit the event into history if it is a text message with both a
    /// sender and a body. Everything else is discarded.
    pub fn into_message(self, body_max_chars: usize) -> Option<Message> {
        if self.event_type != ROOM_MESSAGE_EVENT {
            return None;
        }
        if self.content.msgtype.as_deref() != Some(MSGTYPE_TEXT) {
            return None;
        }
        let sender = self.sender?;
        let body = self.content.body?;
        Some(Message::new(&sender, &body, body_max_chars))
    }
}
