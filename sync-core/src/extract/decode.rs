//! Filtered structural decode over a byte stream.
//!
//! Pulls tokens from `serde_json`'s reader-backed deserializer and decides
//! keep-or-skip per field. Skipped values go through [`IgnoredAny`], which
//! consumes them without allocating. Only the retained subset and the
//! current path are ever resident.

use std::cell::Cell;
use std::fmt;
use std::io::{BufReader, Read};

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use super::filter::{KeepPaths, Verdict};
use super::guard::StringGuard;
use super::ExtractError;

/// Fixed charge per retained node, on top of key and string bytes.
pub const NODE_COST: usize = 16;

const DECODE_READ_BUF: usize = 256;

/// Decode `reader`, keeping only fields on `keep`, within `ceiling` bytes.
///
/// Returns the retained subset as a [`Value`]. Fields off every keep path
/// are absent from the result. Containers on the way to a keep path are
/// present with only their kept children.
///
/// # Errors
///
/// - [`ExtractError::Overflow`] if retained data would exceed `ceiling`, or
///   if any single string or key in the stream is longer than `ceiling`,
///   kept or not.
/// - [`ExtractError::Malformed`] if the stream is not one JSON value.
/// - [`ExtractError::Io`] if reading the stream fails.
pub fn decode_filtered<R: Read>(
    reader: R,
    keep: &KeepPaths,
    ceiling: usize,
) -> Result<Value, ExtractError> {
    let budget = Budget::new(ceiling);
    let guarded = StringGuard::new(
        BufReader::with_capacity(DECODE_READ_BUF, reader),
        ceiling,
        &budget.overflowed,
    );
    let mut de = serde_json::Deserializer::from_reader(guarded);

    let path: Vec<String> = Vec::new();
    let seed = FilterSeed {
        keep,
        budget: &budget,
        path: &path,
    };
    let value = seed
        .deserialize(&mut de)
        .and_then(|v| de.end().map(|_| v))
        .map_err(|e| classify(e, &budget))?;
    Ok(value)
}

fn classify(err: serde_json::Error, budget: &Budget) -> ExtractError {
    if budget.overflowed.get() {
        return ExtractError::Overflow {
            ceiling: budget.ceiling,
        };
    }
    if err.is_io() {
        return ExtractError::Io(err.into());
    }
    ExtractError::Malformed(err.to_string())
}

/// Running total of retained bytes.
struct Budget {
    ceiling: usize,
    used: Cell<usize>,
    overflowed: Cell<bool>,
}

impl Budget {
    fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            used: Cell::new(0),
            overflowed: Cell::new(false),
        }
    }

    fn charge<E: de::Error>(&self, bytes: usize) -> Result<(), E> {
        let total = self.used.get().saturating_add(bytes);
        if total > self.ceiling {
            self.overflowed.set(true);
            return Err(E::custom(format_args!(
                "retained data exceeds {} bytes",
                self.ceiling
            )));
        }
        self.used.set(total);
        Ok(())
    }
}

/// Decodes a value whose fate depends on its path.
struct FilterSeed<'a> {
    keep: &'a KeepPaths,
    budget: &'a Budget,
    path: &'a [String],
}

impl<'de, 'a> DeserializeSeed<'de> for FilterSeed<'a> {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        match self.keep.verdict(self.path) {
            Verdict::Skip => {
                deserializer.deserialize_ignored_any(IgnoredAny)?;
                Ok(Value::Null)
            }
            Verdict::Keep => KeepSeed {
                budget: self.budget,
            }
            .deserialize(deserializer),
            Verdict::Descend => deserializer.deserialize_any(self),
        }
    }
}

impl<'de, 'a> Visitor<'de> for FilterSeed<'a> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        self.budget.charge(NODE_COST)?;
        let mut out = Map::new();
        let mut child = self.path.to_vec();
        while let Some(key) = map.next_key::<String>()? {
            child.push(key);
            match self.keep.verdict(&child) {
                Verdict::Skip => {
                    map.next_value::<IgnoredAny>()?;
                    child.pop();
                }
                _ => {
                    let value = map.next_value_seed(FilterSeed {
                        keep: self.keep,
                        budget: self.budget,
                        path: &child,
                    })?;
                    if let Some(key) = child.pop() {
                        self.budget.charge(key.len())?;
                        out.insert(key, value);
                    }
                }
            }
        }
        Ok(Value::Object(out))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        self.budget.charge(NODE_COST)?;
        let mut out = Vec::new();
        while let Some(value) = seq.next_element_seed(FilterSeed {
            keep: self.keep,
            budget: self.budget,
            path: self.path,
        })? {
            out.push(value);
        }
        Ok(Value::Array(out))
    }

    // Scalars sitting where the filter expected a container carry nothing
    // the filter asked for.
    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
}

/// Decodes a whole subtree, charging every node.
#[derive(Clone, Copy)]
struct KeepSeed<'a> {
    budget: &'a Budget,
}

impl<'de, 'a> DeserializeSeed<'de> for KeepSeed<'a> {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for KeepSeed<'a> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        self.budget.charge(NODE_COST)?;
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        self.budget.charge(NODE_COST)?;
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        self.budget.charge(NODE_COST)?;
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        self.budget.charge(NODE_COST)?;
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        self.budget.charge(NODE_COST + v.len())?;
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        self.budget.charge(NODE_COST + v.len())?;
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        self.budget.charge(NODE_COST)?;
        Ok(Value::Null)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        self.budget.charge(NODE_COST)?;
        let mut out = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            self.budget.charge(key.len())?;
            let value = map.next_value_seed(self)?;
            out.insert(key, value);
        }
        Ok(Value::Object(out))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        self.budget.charge(NODE_COST)?;
        let mut out = Vec::new();
        while let Some(value) = seq.next_element_seed(self)? {
            out.push(value);
        }
        Ok(Value::Array(out))
    }
}
