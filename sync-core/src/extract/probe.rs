//! Token-probe scanning.
//!
//! Not a JSON parser. Finds the literal `"next_batch"` marker, then the next
//! `:`, then the next `"`, and returns the bytes up to the closing quote.
//! No escape decoding. Only used on the phase-one payload, which the probe
//! filter keeps tiny.

use std::io::{BufReader, Read};

use picochat_types::{SyncToken, MAX_TOKEN_LEN};

use super::ExtractError;

/// The quoted field name that anchors the scan.
pub const TOKEN_MARKER: &[u8] = b"\"next_batch\"";

const PROBE_READ_BUF: usize = 128;

/// Scan `reader` for the continuation token.
///
/// Returns `Ok(None)` if any anchor is missing before the stream ends, or if
/// the token is longer than [`MAX_TOKEN_LEN`] or not UTF-8.
///
/// # Errors
///
/// Returns [`ExtractError::Io`] if reading the stream fails.
pub fn probe_token<R: Read>(reader: R) -> Result<Option<SyncToken>, ExtractError> {
    let mut bytes = BufReader::with_capacity(PROBE_READ_BUF, reader).bytes();

    let mut matched = 0;
    while matched < TOKEN_MARKER.len() {
        let Some(byte) = bytes.next().transpose()? else {
            return Ok(None);
        };
        matched = advance(TOKEN_MARKER, matched, byte);
    }

    if !skip_past(&mut bytes, b':')? || !skip_past(&mut bytes, b'"')? {
        return Ok(None);
    }

    let mut token = Vec::new();
    loop {
        let Some(byte) = bytes.next().transpose()? else {
            return Ok(None);
        };
        if byte == b'"' {
            break;
        }
        if token.len() == MAX_TOKEN_LEN {
            return Ok(None);
        }
        token.push(byte);
    }

    Ok(String::from_utf8(token).ok().and_then(SyncToken::new))
}

/// Consume bytes up to and including `target`. False if the stream ends first.
fn skip_past<I>(bytes: &mut I, target: u8) -> Result<bool, ExtractError>
where
    I: Iterator<Item = std::io::Result<u8>>,
{
    for byte in bytes {
        if byte? == target {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Marker match length after seeing `byte` with `matched` bytes already matched.
///
/// On a mismatch, falls back to the longest proper suffix of the matched
/// text that is still a marker prefix.
fn advance(marker: &[u8], matched: usize, byte: u8) -> usize {
    if marker[matched] == byte {
        return matched + 1;
    }
    (0..matched)
        .rev()
        .find(|&k| marker[matched - k..matched] == marker[..k] && marker[k] == byte)
        .map_or(0, |k| k + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(body: &str) -> Option<SyncToken> {
        probe_token(body.as_bytes()).unwrap()
    }

    #[test]
    fn finds_top_level_token() {
        let body = r#"{"account_data":{"events":[]},"next_batch":"s72594_4483_1934","rooms":{}}"#;
        assert_eq!(probe(body).unwrap().as_str(), "s72594_4483_1934");
    }

    #[test]
    fn tolerates_whitespace_around_colon() {
        let body = "{\n  \"next_batch\" :\n   \"s1_2\"\n}";
        assert_eq!(probe(body).unwrap().as_str(), "s1_2");
    }

    #[test]
    fn missing_marker_is_not_found() {
        assert!(probe(r#"{"errcode":"M_UNKNOWN_TOKEN"}"#).is_none());
    }

    #[test]
    fn missing_value_quote_is_not_found() {
        assert!(probe(r#"{"next_batch":"#).is_none());
        assert!(probe(r#"{"next_batch":"s1"#).is_none());
    }

    #[test]
    fn unquoted_key_text_does_not_match() {
        let body = r#"{"body":"next_batch is here","next_batch":"s9"}"#;
        assert_eq!(probe(body).unwrap().as_str(), "s9");
    }

    #[test]
    fn oversized_token_is_not_found() {
        let body = format!(r#"{{"next_batch":"{}"}}"#, "a".repeat(MAX_TOKEN_LEN + 1));
        assert!(probe(&body).is_none());
    }

    #[test]
    fn empty_stream_is_not_found() {
        assert!(probe("").is_none());
    }

    #[test]
    fn advance_recovers_from_partial_match() {
        let marker = b"aab";
        let mut matched = 0;
        for &b in b"aaab" {
            matched = advance(marker, matched, b);
        }
        assert_eq!(matched, 3);
    }
}
