//! Purpose: Identify the concrete node shapes documents are materialized into.
//! Exports: `Shape`, `ShapeTag`, `AnyNode`.
//! Role: The optimization tag; records which shape a node's children were normalized to.
//! Invariants: Only concrete shapes may tag a node; abstract shapes are capabilities.
//! Invariants: Tag equality is type identity, never name equality.

use std::any::TypeId;
use std::fmt;

use crate::core::node::Node;

/// A typed view over a [`Node`]. Newtypes over `Node` implement this to add
/// typed getters; the node itself is the default concrete shape.
pub trait Shape: Clone + 'static {
    const NAME: &'static str;
    /// Abstract shapes accept any node but cannot be instantiated or used as tags.
    const ABSTRACT: bool = false;

    fn from_node(node: Node) -> Self;
    fn node(&self) -> &Node;

    fn tag() -> ShapeTag {
        ShapeTag {
            id: TypeId::of::<Self>(),
            name: Self::NAME,
            is_abstract: Self::ABSTRACT,
        }
    }
}

#[derive(Clone, Copy)]
pub struct ShapeTag {
    id: TypeId,
    name: &'static str,
    is_abstract: bool,
}

impl ShapeTag {
    pub fn of<S: Shape>() -> Self {
        S::tag()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether a node materialized as `self` can be viewed as `target` without copying.
    pub fn conforms_to(&self, target: ShapeTag) -> bool {
        target.is_abstract || *self == target
    }
}

impl PartialEq for ShapeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShapeTag {}

impl fmt::Debug for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeTag({})", self.name)
    }
}

impl Shape for Node {
    const NAME: &'static str = "Node";

    fn from_node(node: Node) -> Self {
        node
    }

    fn node(&self) -> &Node {
        self
    }
}

/// Capability view accepting a node of any shape.
#[derive(Clone, Debug, PartialEq)]
pub struct AnyNode(Node);

impl AnyNode {
    pub fn into_node(self) -> Node {
        self.0
    }
}

impl Shape for AnyNode {
    const NAME: &'static str = "AnyNode";
    const ABSTRACT: bool = true;

    fn from_node(node: Node) -> Self {
        Self(node)
    }

    fn node(&self) -> &Node {
        &self.0
    }
}
