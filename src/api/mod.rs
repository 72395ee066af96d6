//! Purpose: Define the stable public Rust API boundary for docmap.
//! Exports: The facade plus the document, conversion, and error types callers touch.
//! Role: Public, additive-only surface; `core` stays reachable for advanced use.
//! Invariants: Everything a typical caller needs is importable from here.

mod mapper;

pub use crate::core::dispatch::{Conversion, ConversionKind, convert};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::list::NodeList;
pub use crate::core::node::Node;
pub use crate::core::registry::{Converter, CopyStrategy, Registry, TypeKey};
pub use crate::core::shape::{AnyNode, Shape, ShapeTag};
pub use crate::core::target::Target;
pub use crate::core::temporal::{Instant, OffsetTime, Temporal, ZonedDateTime};
pub use crate::core::value::{Opaque, Value};
pub use mapper::{Mapper, MapperOptions};
