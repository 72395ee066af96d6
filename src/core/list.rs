//! Purpose: Ordered, mutable sequence of document nodes.
//! Exports: `NodeList`.
//! Role: Materialized form of a JSON/YAML array of objects.
//! Invariants: `find` succeeds only on exactly one match.
//! Notes: `NodeList` is a shared handle; `clone` aliases, it does not copy.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::shape::{Shape, ShapeTag};
use crate::core::value::Value;

#[derive(Clone, Default)]
pub struct NodeList {
    inner: Rc<RefCell<Vec<Node>>>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(nodes)),
        }
    }

    pub fn push(&self, node: Node) {
        self.inner.borrow_mut().push(node);
    }

    pub fn get(&self, index: usize) -> Option<Node> {
        self.inner.borrow().get(index).cloned()
    }

    /// Element at `index` viewed as shape `S`, if it was materialized as one.
    pub fn get_as<S: Shape>(&self, index: usize) -> Option<S> {
        self.get(index)
            .filter(|node| node.shape().conforms_to(S::tag()))
            .map(S::from_node)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Snapshot of the element handles; the handles themselves alias.
    pub fn nodes(&self) -> Vec<Node> {
        self.inner.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &NodeList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn conforms_to(&self, tag: ShapeTag) -> bool {
        self.inner
            .borrow()
            .iter()
            .all(|node| node.shape().conforms_to(tag))
    }

    /// The single element whose `key` equals `value`.
    pub fn find(&self, key: &str, value: impl Into<Value>) -> Result<Node, Error> {
        let value = value.into();
        self.find_unique(key, |node| node.is_value(key, value.clone()))
    }

    /// The single element whose boolean `key` matches `condition`.
    pub fn find_flag(&self, key: &str, condition: bool) -> Result<Node, Error> {
        self.find_unique(key, |node| node.is_with(key, condition))
    }

    fn find_unique(&self, key: &str, matches: impl Fn(&Node) -> bool) -> Result<Node, Error> {
        let mut found = self.nodes().into_iter().filter(|node| matches(node));
        let first = found.next().ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message(format!("key={key} cannot be found"))
                .with_key(key)
        })?;
        if found.next().is_some() {
            return Err(Error::new(ErrorKind::NotUnique)
                .with_message(format!("key={key} not unique"))
                .with_key(key));
        }
        Ok(first)
    }
}

impl PartialEq for NodeList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.inner.borrow() == *other.inner.borrow()
    }
}

impl fmt::Debug for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}

impl Serialize for NodeList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.inner.borrow().iter())
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::from_nodes(iter.into_iter().collect())
    }
}
