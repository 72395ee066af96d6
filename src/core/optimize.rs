//! Purpose: Eagerly normalize a document tree into nodes of one concrete shape.
//! Exports: `Node::optimize`.
//! Role: One-time depth-first pass run on freshly parsed roots; afterwards nested
//! reads hit the cast fast path instead of converting.
//! Invariants: An abstract target is rejected before the node's tag is touched.
//! Invariants: The tag is set only after every child has been normalized.
//! Notes: No rollback; a failure leaves the tree as normalized so far, untagged.

use tracing::{debug, trace};

use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::registry::Registry;
use crate::core::shape::{Shape, ShapeTag};
use crate::core::value::Value;

enum Step {
    Map,
    List,
    Skip,
}

fn step_for(value: &Value, tag: ShapeTag) -> Step {
    match value {
        Value::Map(_) | Value::Node(_) => Step::Map,
        Value::Array(items) => match items.first() {
            Some(Value::Map(_)) => Step::List,
            Some(Value::Node(node)) if !node.shape().conforms_to(tag) => Step::List,
            _ => Step::Skip,
        },
        Value::List(list) => match list.get(0) {
            Some(node) if !node.shape().conforms_to(tag) => Step::List,
            _ => Step::Skip,
        },
        _ => Step::Skip,
    }
}

impl Node {
    /// Materializes every nested map as `S` and every list of maps as a list of `S`,
    /// then tags this node as optimized for `S`.
    pub fn optimize<S: Shape>(&self, registry: &Registry) -> Result<(), Error> {
        let tag = S::tag();
        if tag.is_abstract() {
            return Err(Error::new(ErrorKind::Optimization)
                .with_message(format!(
                    "node cannot be optimized for abstract shape {}",
                    tag.name()
                ))
                .with_hint("optimize for a concrete shape such as Node")
                .with_target(S::NAME));
        }
        debug!(shape = tag.name(), entries = self.len(), "optimizing node");
        self.optimize_tree::<S>(registry)
    }

    fn optimize_tree<S: Shape>(&self, registry: &Registry) -> Result<(), Error> {
        let tag = S::tag();
        self.set_optimized_for(None);
        for key in self.keys() {
            let Some(value) = self.get(&key) else {
                continue;
            };
            match step_for(&value, tag) {
                Step::Map => {
                    if let Some(child) = self.get_as_map_of::<S>(registry, &key)? {
                        child.node().optimize_tree::<S>(registry)?;
                    }
                }
                Step::List => {
                    if let Some(list) = self.get_as_list_of::<S>(registry, &key)? {
                        trace!(key = %key, len = list.len(), "normalized list");
                        for node in list.nodes() {
                            node.optimize_tree::<S>(registry)?;
                        }
                    }
                }
                Step::Skip => {}
            }
        }
        self.set_optimized_for(Some(tag));
        Ok(())
    }
}
