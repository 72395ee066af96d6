//! Purpose: Define the dynamic value tree produced by parsing and refined by conversion.
//! Exports: `Value`, `Opaque`.
//! Role: Closed tagged union every accessor, converter and the optimizer switch on.
//! Invariants: `Map`/`Array` are generic parser output; `Node`/`List` are materialized handles.
//! Invariants: Cloning a `Node`/`List` variant aliases the same underlying storage.
//! Invariants: Serialized maps omit null entries and emit keys in sorted order.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::core::list::NodeList;
use crate::core::node::Node;
use crate::core::temporal::Temporal;

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    Decimal(BigDecimal),
    String(String),
    Temporal(Temporal),
    Map(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Node(Node),
    List(NodeList),
    Opaque(Opaque),
}

impl Value {
    /// Runtime type name used in conversion diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::BigInt(_) => "big integer",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Temporal(temporal) => temporal.type_name(),
            Self::Map(_) => "map",
            Self::Array(_) => "array",
            Self::Node(node) => node.shape().name(),
            Self::List(_) => "node list",
            Self::Opaque(opaque) => opaque.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NodeList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// True for both the generic map variant and a materialized node.
    pub fn is_map_like(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Node(_))
    }

    /// Elements of a generic array or a node list, as values.
    pub fn to_items(&self) -> Option<Vec<Value>> {
        match self {
            Self::Array(items) => Some(items.clone()),
            Self::List(list) => Some(list.nodes().into_iter().map(Value::Node).collect()),
            _ => None,
        }
    }
}

fn map_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Map(a), Value::Map(b)) => a == b,
        (Value::Node(a), Value::Node(b)) => a == b,
        (Value::Node(node), Value::Map(map)) | (Value::Map(map), Value::Node(node)) => {
            node.with_entries(|entries| entries == map)
        }
        _ => false,
    }
}

fn seq_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => a == b,
        (Value::List(a), Value::List(b)) => a == b,
        (Value::List(list), Value::Array(items)) | (Value::Array(items), Value::List(list)) => {
            let nodes = list.nodes();
            nodes.len() == items.len()
                && nodes
                    .into_iter()
                    .zip(items)
                    .all(|(node, item)| map_eq(&Value::Node(node), item))
        }
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Temporal(a), Self::Temporal(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a.ptr_eq(b),
            (Self::Map(_) | Self::Node(_), Self::Map(_) | Self::Node(_)) => map_eq(self, other),
            (Self::Array(_) | Self::List(_), Self::Array(_) | Self::List(_)) => {
                seq_eq(self, other)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::String(text) => write!(f, "{text}"),
            Self::Temporal(temporal) => write!(f, "{temporal}"),
            Self::Opaque(opaque) => write!(f, "{opaque}"),
            Self::Map(_) | Self::Array(_) | Self::Node(_) | Self::List(_) => {
                match serde_json::to_string(self) {
                    Ok(encoded) => write!(f, "{encoded}"),
                    Err(_) => write!(f, "<{}>", self.type_name()),
                }
            }
        }
    }
}

/// An arbitrary Rust object carried through the tree; compares by identity.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            value: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.type_name, Rc::as_ptr(&self.value) as *const ())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => {
                if let Ok(small) = i64::try_from(n) {
                    serializer.serialize_i64(small)
                } else if let Ok(unsigned) = u64::try_from(n) {
                    serializer.serialize_u64(unsigned)
                } else {
                    serializer.serialize_str(&n.to_string())
                }
            }
            // Decimal text keeps the scale that a float would lose.
            Self::Decimal(n) => serializer.serialize_str(&n.to_string()),
            Self::String(text) => serializer.serialize_str(text),
            Self::Temporal(temporal) => {
                serializer.serialize_str(&temporal.to_text().map_err(S::Error::custom)?)
            }
            Self::Map(entries) => serialize_entries(serializer, entries),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Node(node) => node.serialize(serializer),
            Self::List(list) => list.serialize(serializer),
            Self::Opaque(opaque) => Err(S::Error::custom(format!(
                "opaque {} value cannot be serialized",
                opaque.type_name()
            ))),
        }
    }
}

pub(crate) fn serialize_entries<S: Serializer>(
    serializer: S,
    entries: &BTreeMap<String, Value>,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    for (key, value) in entries {
        if value.is_null() {
            continue;
        }
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON or YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::BigInt(BigInt::from(v))))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(i64::try_from(v)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::BigInt(BigInt::from(v))))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(i64::try_from(v)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::BigInt(BigInt::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some(key) = map.next_key_seed(KeySeed)? {
            let value = map.next_value()?;
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }
}

/// Map keys are always strings; YAML scalars such as `1:` keep their text.
struct KeySeed;

impl<'de> DeserializeSeed<'de> for KeySeed {
    type Value = String;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar map key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Self::BigInt(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Temporal> for Value {
    fn from(value: Temporal) -> Self {
        Self::Temporal(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<NodeList> for Value {
    fn from(value: NodeList) -> Self {
        Self::List(value)
    }
}

impl From<Opaque> for Value {
    fn from(value: Opaque) -> Self {
        Self::Opaque(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
