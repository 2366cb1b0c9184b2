//! Byte-level limit on JSON string runs.
//!
//! `serde_json` copies every key and every string it hands to a visitor
//! into a scratch buffer first, so a ceiling checked in the visitor comes
//! too late for one huge string. [`StringGuard`] sits under the
//! deserializer and fails the stream as soon as a single string grows past
//! the limit, before those bytes reach the scratch buffer.

use std::cell::Cell;
use std::io::{self, Read};

/// Reader adapter that refuses any string longer than `limit` raw bytes.
///
/// Tracks only quote and backslash state; it is not a validator. On a
/// trip it sets `tripped` and returns an `InvalidData` error, which the
/// deserializer surfaces as an I/O error.
pub(crate) struct StringGuard<'a, R> {
    inner: R,
    limit: usize,
    in_string: bool,
    escaped: bool,
    run: usize,
    tripped: &'a Cell<bool>,
}

impl<'a, R: Read> StringGuard<'a, R> {
    pub(crate) fn new(inner: R, limit: usize, tripped: &'a Cell<bool>) -> Self {
        Self {
            inner,
            limit,
            in_string: false,
            escaped: false,
            run: 0,
            tripped,
        }
    }
}

impl<R: Read> Read for StringGuard<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.tripped.get() {
            return Err(self.overflow());
        }
        let n = self.inner.read(buf)?;
        for &byte in &buf[..n] {
            if !self.in_string {
                if byte == b'"' {
                    self.in_string = true;
                    self.run = 0;
                }
                continue;
            }
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                continue;
            }
            self.run += 1;
            if self.run > self.limit {
                self.tripped.set(true);
                return Err(self.overflow());
            }
        }
        Ok(n)
    }
}

impl<R> StringGuard<'_, R> {
    fn overflow(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("string exceeds {} bytes", self.limit),
        )
    }
}
