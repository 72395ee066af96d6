//! Purpose: Dynamic JSON/YAML document maps with a pluggable type-conversion registry.
//! Exports: `core` (value tree, registry, dispatcher, nodes, optimizer, errors), `api` (facade).
//! Role: Library crate; callers parse text with `api::Mapper` and navigate typed accessors.
//! Invariants: Every typed read goes through one dispatcher backed by an explicit `Registry`.
//! Invariants: Handles are single-threaded (`!Send`/`!Sync`); confine each tree and registry to one thread.
pub mod api;
pub mod core;
mod json;
