//! Purpose: Mutable string-keyed document map with typed, caching accessors.
//! Exports: `Node`.
//! Role: The map abstraction callers navigate after parsing; every typed read goes
//! through `dispatch::convert`.
//! Invariants: A converted nested map or list is stored back under its key, so a
//! repeated read returns the same handle (`ptr_eq`), not a fresh copy.
//! Invariants: No `RefCell` borrow is held while a converter runs.
//! Notes: `Node` is a shared handle; `clone` aliases, it does not copy.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::copy;
use crate::core::dispatch;
use crate::core::error::Error;
use crate::core::list::NodeList;
use crate::core::registry::Registry;
use crate::core::shape::{Shape, ShapeTag};
use crate::core::target::Target;
use crate::core::value::{self, Value};

struct NodeData {
    entries: BTreeMap<String, Value>,
    shape: ShapeTag,
    optimized_for: Option<ShapeTag>,
}

#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeData>>,
}

impl Node {
    pub fn new() -> Self {
        Self::from_entries(BTreeMap::new())
    }

    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self::shaped(entries, ShapeTag::of::<Node>())
    }

    pub(crate) fn shaped(entries: BTreeMap<String, Value>, shape: ShapeTag) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                entries,
                shape,
                optimized_for: None,
            })),
        }
    }

    /// The concrete shape this node was materialized as.
    pub fn shape(&self) -> ShapeTag {
        self.inner.borrow().shape
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Stored value, with a missing key read as null.
    fn raw(&self, key: &str) -> Value {
        self.get(key).unwrap_or_default()
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.inner
            .borrow()
            .entries
            .values()
            .any(|stored| stored == value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Runs `f` against the entries without cloning them.
    pub fn with_entries<R>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> R) -> R {
        f(&self.inner.borrow().entries)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn get_as<T: Target>(&self, registry: &Registry, key: &str) -> Result<Option<T>, Error> {
        dispatch::convert::<T>(registry, &self.raw(key)).map_err(|err| err.with_key(key))
    }

    pub fn get_as_string(&self, registry: &Registry, key: &str) -> Result<Option<String>, Error> {
        self.get_as::<String>(registry, key)
    }

    /// True iff the stored value is boolean `true`.
    pub fn is(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// With `condition == false`, a missing or null value counts as "not true".
    pub fn is_with(&self, key: &str, condition: bool) -> bool {
        self.is(key) == condition
    }

    pub fn is_value(&self, key: &str, value: impl Into<Value>) -> bool {
        self.is_value_with(key, value, true)
    }

    pub fn is_value_with(&self, key: &str, value: impl Into<Value>, condition: bool) -> bool {
        condition == (self.raw(key) == value.into())
    }

    pub fn list_contains(
        &self,
        registry: &Registry,
        key: &str,
        item: impl Into<Value>,
    ) -> Result<bool, Error> {
        self.list_contains_with(registry, key, item, true)
    }

    /// A missing list contains nothing, so the negated form holds for it.
    pub fn list_contains_with(
        &self,
        registry: &Registry,
        key: &str,
        item: impl Into<Value>,
        condition: bool,
    ) -> Result<bool, Error> {
        let item = item.into();
        Ok(match self.get_as::<Vec<Value>>(registry, key)? {
            Some(items) => condition == items.contains(&item),
            None => !condition,
        })
    }

    pub fn map_contains_key(
        &self,
        registry: &Registry,
        key: &str,
        inner_key: &str,
    ) -> Result<bool, Error> {
        self.map_contains_key_with(registry, key, inner_key, true)
    }

    pub fn map_contains_key_with(
        &self,
        registry: &Registry,
        key: &str,
        inner_key: &str,
        condition: bool,
    ) -> Result<bool, Error> {
        let map = self.get_as_map(registry, key)?;
        Ok(condition == map.is_some_and(|map| map.contains_key(inner_key)))
    }

    pub fn map_contains_value(
        &self,
        registry: &Registry,
        key: &str,
        inner_value: impl Into<Value>,
    ) -> Result<bool, Error> {
        self.map_contains_value_with(registry, key, inner_value, true)
    }

    pub fn map_contains_value_with(
        &self,
        registry: &Registry,
        key: &str,
        inner_value: impl Into<Value>,
        condition: bool,
    ) -> Result<bool, Error> {
        let inner_value = inner_value.into();
        let map = self.get_as_map(registry, key)?;
        Ok(condition == map.is_some_and(|map| map.contains_value(&inner_value)))
    }

    /// Raw value stored under `inner_key` of the nested map at `key`; not converted.
    pub fn get_map_value(
        &self,
        registry: &Registry,
        key: &str,
        inner_key: &str,
    ) -> Result<Option<Value>, Error> {
        let map = self.get_as_map(registry, key)?;
        Ok(map.and_then(|map| map.get(inner_key)))
    }

    pub fn get_as_map(&self, registry: &Registry, key: &str) -> Result<Option<Node>, Error> {
        self.get_as_map_of::<Node>(registry, key)
    }

    /// Reads `key` as a nested map of shape `S`, storing the converted node back.
    ///
    /// Installs a structural-copy converter for `S` if none is registered.
    pub fn get_as_map_of<S: Shape>(
        &self,
        registry: &Registry,
        key: &str,
    ) -> Result<Option<S>, Error> {
        let tag = S::tag();
        if self.is_optimized_for(tag) {
            match self.raw(key) {
                Value::Null => return Ok(None),
                Value::Node(node) if node.shape().conforms_to(tag) => {
                    return Ok(Some(S::from_node(node)));
                }
                // replaced by a put since optimization; convert below
                _ => {}
            }
        }
        registry.ensure_shape::<S>();
        let converted = self.get_as::<S>(registry, key)?;
        if let Some(shape) = &converted {
            self.put(key, Value::Node(shape.node().clone()));
        }
        Ok(converted)
    }

    pub fn get_as_list(&self, registry: &Registry, key: &str) -> Result<Option<NodeList>, Error> {
        self.get_as_list_of::<Node>(registry, key)
    }

    /// Reads `key` as a list of nodes of shape `S`, storing the list back.
    pub fn get_as_list_of<S: Shape>(
        &self,
        registry: &Registry,
        key: &str,
    ) -> Result<Option<NodeList>, Error> {
        let tag = S::tag();
        if let Value::List(list) = self.raw(key) {
            if self.is_optimized_for(tag) || list.conforms_to(tag) {
                return Ok(Some(list));
            }
        }
        let Some(items) = self.get_as::<Vec<Value>>(registry, key)? else {
            return Ok(None);
        };
        let mut nodes = Vec::with_capacity(items.len());
        for item in &items {
            let shape = match S::cast(item) {
                Some(shape) => shape,
                None => copy::copy_into::<S>(registry, item).map_err(|err| err.with_key(key))?,
            };
            nodes.push(shape.node().clone());
        }
        let list = NodeList::from_nodes(nodes);
        self.put(key, Value::List(list.clone()));
        Ok(Some(list))
    }

    pub fn set_optimized_for(&self, tag: Option<ShapeTag>) {
        self.inner.borrow_mut().optimized_for = tag;
    }

    pub fn is_optimized_for(&self, tag: ShapeTag) -> bool {
        self.inner.borrow().optimized_for == Some(tag)
    }

    pub fn optimized_for(&self) -> Option<ShapeTag> {
        self.inner.borrow().optimized_for
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.borrow().entries == other.inner.borrow().entries
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Node")
            .field("shape", &data.shape.name())
            .field("entries", &data.entries)
            .finish()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        value::serialize_entries(serializer, &self.inner.borrow().entries)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Map(entries) => Ok(Self::from_entries(entries)),
            other => Err(de::Error::invalid_type(
                Unexpected::Other(other.type_name()),
                &"a map",
            )),
        }
    }
}

impl From<BTreeMap<String, Value>> for Node {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::Node;
    use crate::core::error::ErrorKind;
    use crate::core::registry::Registry;
    use crate::core::value::Value;

    fn node(json: &str) -> Node {
        serde_json::from_str(json).expect("parse node")
    }

    #[test]
    fn boolean_predicates_treat_missing_as_not_true() {
        let car = node(r#"{"metallic":true,"4wd":false,"color":"red"}"#);
        assert!(car.is("metallic"));
        assert!(!car.is("4wd"));
        assert!(!car.is("color"));
        assert!(car.is_with("missing", false));
        assert!(!car.is_with("missing", true));
        assert!(car.is_with("4wd", false));
    }

    #[test]
    fn value_predicates_compare_stored_values() {
        let car = node(r#"{"color":"red","price":25000}"#);
        assert!(car.is_value("color", "red"));
        assert!(car.is_value_with("color", "blue", false));
        assert!(car.is_value("price", 25000));
        assert!(!car.is_value("price", "25000"));
        assert!(car.is_value("missing", Value::Null));
    }

    #[test]
    fn list_predicates_handle_missing_lists() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"extras":["tire","radio"]}"#);
        assert!(car.list_contains(&registry, "extras", "tire").expect("list"));
        assert!(!car.list_contains(&registry, "extras", "horn").expect("list"));
        assert!(!car.list_contains(&registry, "missing", "tire").expect("list"));
        assert!(
            car.list_contains_with(&registry, "missing", "tire", false)
                .expect("list")
        );
        assert!(
            car.list_contains_with(&registry, "extras", "horn", false)
                .expect("list")
        );
    }

    #[test]
    fn negated_map_predicates_hold_for_absent_maps() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"translation":{"1":"eins","2":"zwei"}}"#);
        assert!(car.map_contains_key(&registry, "translation", "1").expect("map"));
        assert!(
            car.map_contains_key_with(&registry, "translation", "3", false)
                .expect("map")
        );
        assert!(
            car.map_contains_key_with(&registry, "missing", "1", false)
                .expect("map")
        );
        assert!(!car.map_contains_key(&registry, "missing", "1").expect("map"));
        assert!(
            car.map_contains_value(&registry, "translation", "zwei")
                .expect("map")
        );
        assert!(
            car.map_contains_value_with(&registry, "missing", "zwei", false)
                .expect("map")
        );
    }

    #[test]
    fn get_map_value_reads_raw_inner_value() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"translation":{"1":"eins"}}"#);
        assert_eq!(
            car.get_map_value(&registry, "translation", "1").expect("value"),
            Some(Value::from("eins"))
        );
        assert_eq!(car.get_map_value(&registry, "missing", "1").expect("value"), None);
        assert_eq!(car.get_map_value(&registry, "translation", "9").expect("value"), None);
    }

    #[test]
    fn nested_map_is_stored_back_and_aliased() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"translation":{"1":"eins"}}"#);
        let first = car.get_as_map(&registry, "translation").expect("map").expect("present");
        let second = car.get_as_map(&registry, "translation").expect("map").expect("present");
        assert!(first.ptr_eq(&second));
        assert!(matches!(car.get("translation"), Some(Value::Node(_))));

        first.put("2", "zwei");
        let third = car.get_as_map(&registry, "translation").expect("map").expect("present");
        assert_eq!(third.get("2"), Some(Value::from("zwei")));
    }

    #[test]
    fn missing_nested_map_is_not_stored() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"color":"red"}"#);
        assert_eq!(car.get_as_map(&registry, "missing").expect("map"), None);
        assert!(!car.contains_key("missing"));
    }

    #[test]
    fn scalar_under_map_key_is_a_conversion_error() {
        let registry = Registry::with_defaults();
        let car = node(r#"{"color":"red"}"#);
        let err = car.get_as_map(&registry, "color").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(err.key(), Some("color"));
    }

    #[test]
    fn list_of_maps_becomes_node_list() {
        let registry = Registry::with_defaults();
        let garage = node(r#"{"cars":[{"name":"audi"},{"name":"porsche"}]}"#);
        let list = garage.get_as_list(&registry, "cars").expect("list").expect("present");
        assert_eq!(list.len(), 2);
        let again = garage.get_as_list(&registry, "cars").expect("list").expect("present");
        assert!(list.ptr_eq(&again));
        assert_eq!(garage.get_as_list(&registry, "missing").expect("list"), None);
    }

    #[test]
    fn put_returns_previous_value() {
        let map = Node::new();
        assert_eq!(map.put("a", 1), None);
        assert_eq!(map.put("a", 2), Some(Value::from(1)));
        assert_eq!(map.remove("a"), Some(Value::from(2)));
        assert!(map.is_empty());
    }

    #[test]
    fn deserializing_a_scalar_as_node_fails() {
        assert!(serde_json::from_str::<Node>("[1,2]").is_err());
    }
}
