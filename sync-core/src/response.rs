//! Interpretation of an incremental sync body.

use std::io::Read;

use picochat_types::{Message, SyncToken, TimelineEvent};
use serde::Deserialize;
use serde_json::Value;

use crate::extract::{decode_filtered, ExtractError, KeepPaths};

/// Paths retained from an incremental response.
///
/// The whole joined-rooms subtree, never a single room key. The target room
/// is looked up after decode.
pub const INCREMENTAL_KEEP_PATHS: [&str; 2] = ["next_batch", "rooms.join"];

/// What one incremental cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalBatch {
    /// The refreshed token.
    pub token: SyncToken,
    /// Admitted messages for the target room, in timeline order.
    pub messages: Vec<Message>,
    /// Whether the target room appeared in this response at all.
    pub room_present: bool,
}

/// Decode an incremental response for `room_id`.
///
/// A room absent from `rooms.join` is the normal keep-alive case and yields
/// zero messages. Events that are not text messages, or that do not have
/// the expected shape, are dropped one by one without failing the batch.
///
/// # Errors
///
/// - [`ExtractError::Overflow`] if the retained subset exceeds `ceiling`.
/// - [`ExtractError::Malformed`] if the body is not JSON or has no usable
///   `next_batch`.
/// - [`ExtractError::Io`] if reading the body fails.
pub fn decode_incremental<R: Read>(
    reader: R,
    room_id: &str,
    ceiling: usize,
    body_max_chars: usize,
) -> Result<IncrementalBatch, ExtractError> {
    let keep = KeepPaths::new(INCREMENTAL_KEEP_PATHS);
    let doc = decode_filtered(reader, &keep, ceiling)?;

    let token = doc
        .get("next_batch")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractError::Malformed("missing next_batch".into()))?;
    let token = SyncToken::new(token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractError::Malformed("unusable next_batch".into()))?;

    let room = doc
        .get("rooms")
        .and_then(|rooms| rooms.get("join"))
        .and_then(|join| join.get(room_id));

    let messages = room
        .and_then(|room| room.get("timeline"))
        .and_then(|timeline| timeline.get("events"))
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|event| TimelineEvent::deserialize(event).ok())
                .filter_map(|event| event.into_message(body_max_chars))
                .collect()
        })
        .unwrap_or_default();

    Ok(IncrementalBatch {
        token,
        messages,
        room_present: room.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "!target:hs";

    fn decode(body: &str) -> Result<IncrementalBatch, ExtractError> {
        decode_incremental(body.as_bytes(), ROOM, 8192, 119)
    }

    #[test]
    fn extracts_text_messages_in_order() {
        let body = r#"{
            "next_batch": "s2",
            "rooms": {"join": {"!target:hs": {"timeline": {"events": [
                {"type": "m.room.message", "sender": "@a:hs", "content": {"msgtype": "m.text", "body": "first"}},
                {"type": "m.room.member", "sender": "@b:hs", "content": {"membership": "join"}},
                {"type": "m.room.message", "sender": "@b:hs", "content": {"msgtype": "m.notice", "body": "bot"}},
                {"type": "m.room.message", "sender": "@b:hs", "content": {"msgtype": "m.text", "body": "second"}}
            ]}}}}
        }"#;

        let batch = decode(body).unwrap();
        assert_eq!(batch.token.as_str(), "s2");
        assert!(batch.room_present);
        let bodies: Vec<_> = batch.messages.iter().map(|m| m.body()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn absent_room_is_zero_messages_not_error() {
        let body = r#"{"next_batch":"s3","rooms":{"join":{"!other:hs":{"timeline":{"events":[
            {"type":"m.room.message","sender":"@a:hs","content":{"msgtype":"m.text","body":"elsewhere"}}
        ]}}}}}"#;

        let batch = decode(body).unwrap();
        assert_eq!(batch.token.as_str(), "s3");
        assert!(!batch.room_present);
        assert!(batch.messages.is_empty());
    }

    #[test]
    fn keepalive_without_rooms_is_empty() {
        let batch = decode(r#"{"next_batch":"s4"}"#).unwrap();
        assert!(batch.messages.is_empty());
        assert!(!batch.room_present);
    }

    #[test]
    fn room_key_order_does_not_matter() {
        let body = r#"{"rooms":{"join":{"!a:hs":{},"!target:hs":{"timeline":{"events":[
            {"type":"m.room.message","sender":"@a:hs","content":{"msgtype":"m.text","body":"x"}}
        ]}},"!z:hs":{}}},"next_batch":"s5"}"#;

        let batch = decode(body).unwrap();
        assert_eq!(batch.messages.len(), 1);
    }

    #[test]
    fn missing_next_batch_is_malformed() {
        let result = decode(r#"{"rooms":{"join":{}}}"#);
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn empty_next_batch_is_malformed() {
        let result = decode(r#"{"next_batch":""}"#);
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn odd_shaped_event_is_skipped() {
        let body = r#"{"next_batch":"s6","rooms":{"join":{"!target:hs":{"timeline":{"events":[
            {"sender":"@a:hs"},
            42,
            {"type":"m.room.message","sender":"@a:hs","content":{"msgtype":"m.text","body":"ok"}}
        ]}}}}}"#;

        let batch = decode(body).unwrap();
        assert_eq!(batch.messages.len(), 1);
        assert_eq!(batch.messages[0].body(), "ok");
    }

    #[test]
    fn body_truncated_to_cap() {
        let long = "z".repeat(300);
        let body = format!(
            r#"{{"next_batch":"s7","rooms":{{"join":{{"!target:hs":{{"timeline":{{"events":[
                {{"type":"m.room.message","sender":"@a:hs","content":{{"msgtype":"m.text","body":"{}"}}}}
            ]}}}}}}}}}}"#,
            long
        );
        let batch = decode(&body).unwrap();
        assert_eq!(batch.messages[0].body().len(), 119);
    }

    #[test]
    fn oversized_join_subtree_overflows() {
        let filler = "f".repeat(2000);
        let body = format!(
            r#"{{"next_batch":"s8","rooms":{{"join":{{"!big:hs":{{"blob":"{}"}}}}}}}}"#,
            filler
        );
        let result = decode_incremental(body.as_bytes(), ROOM, 512, 119);
        assert!(matches!(result, Err(ExtractError::Overflow { .. })));
    }
}
