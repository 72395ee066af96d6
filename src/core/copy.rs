//! Purpose: Produce independent copies of value trees, optionally materialized as a shape.
//! Exports: `detach`, `round_trip`, `copy_into`.
//! Role: Backing for shape converters and for the facade's copy operations.
//! Invariants: A copy shares no node or list storage with its source.
//! Notes: `RoundTrip` goes through JSON text, so temporal and decimal values come back as strings.

use std::collections::BTreeMap;

use tracing::trace;

use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::registry::{CopyStrategy, Registry};
use crate::core::shape::{Shape, ShapeTag};
use crate::core::value::Value;
use crate::json::parse;

/// Deep copy that turns materialized nodes and lists back into raw maps and arrays.
pub fn detach(value: &Value) -> Value {
    match value {
        Value::Map(entries) => Value::Map(detach_entries(entries)),
        Value::Node(node) => Value::Map(node.with_entries(detach_entries)),
        Value::Array(items) => Value::Array(items.iter().map(detach).collect()),
        Value::List(list) => Value::Array(
            list.nodes()
                .iter()
                .map(|node| Value::Map(node.with_entries(detach_entries)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn detach_entries(entries: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), detach(value)))
        .collect()
}

/// Copy by serializing to JSON text and parsing it back.
pub fn round_trip(value: &Value) -> Result<Value, Error> {
    let text = parse::to_json_string(value).map_err(|err| {
        Error::new(ErrorKind::Serialize)
            .with_message("value cannot be copied through JSON text")
            .with_source(err)
    })?;
    parse::from_json_str(&text).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("copied JSON text did not parse back")
            .with_source(err)
    })
}

/// Copies a map-like `value` into a fresh node of shape `S`.
///
/// Abstract shapes are materialized as plain [`Node`]s. Nested maps stay raw
/// until they are read or the node is optimized.
pub fn copy_into<S: Shape>(registry: &Registry, value: &Value) -> Result<S, Error> {
    let copied = match registry.copy_strategy() {
        CopyStrategy::Structural => detach(value),
        CopyStrategy::RoundTrip => round_trip(value)?,
    };
    let Value::Map(entries) = copied else {
        return Err(Error::conversion(value, S::NAME));
    };
    trace!(shape = S::NAME, entries = entries.len(), "copied map into shape");
    Ok(materialize::<S>(entries))
}

/// Wraps raw entries in a new node of shape `S` (plain `Node` for abstract shapes).
pub(crate) fn materialize<S: Shape>(entries: BTreeMap<String, Value>) -> S {
    let shape = if S::ABSTRACT {
        ShapeTag::of::<Node>()
    } else {
        S::tag()
    };
    S::from_node(Node::shaped(entries, shape))
}
