//! Purpose: Facade that turns JSON/YAML text into optimized documents and back.
//! Exports: `Mapper`, `MapperOptions`.
//! Role: Composition root owning the conversion registry used by every accessor.
//! Invariants: Freshly read root documents are optimized unless disabled in options.
//! Invariants: Abstract shapes are never used as optimization targets.
//! Notes: Parse/serialize failures carry a category/context hint, never the payload.

use std::any::Any;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::copy;
use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::registry::{CopyStrategy, Registry};
use crate::core::shape::Shape;
use crate::core::value::Value;
use crate::json::parse::{self, ParseFailureCategory};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MapperOptions {
    pub copy_strategy: CopyStrategy,
    pub optimize_on_read: bool,
}

impl MapperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_copy_strategy(mut self, strategy: CopyStrategy) -> Self {
        self.copy_strategy = strategy;
        self
    }

    pub fn with_optimize_on_read(mut self, enabled: bool) -> Self {
        self.optimize_on_read = enabled;
        self
    }
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            copy_strategy: CopyStrategy::Structural,
            optimize_on_read: true,
        }
    }
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

#[derive(Debug)]
pub struct Mapper {
    registry: Registry,
    options: MapperOptions,
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_options(MapperOptions::default())
    }

    pub fn with_options(options: MapperOptions) -> Self {
        Self::with_registry(Registry::with_defaults(), options)
    }

    /// Uses `registry` as is, apart from applying the configured copy strategy.
    pub fn with_registry(registry: Registry, options: MapperOptions) -> Self {
        registry.set_copy_strategy(options.copy_strategy);
        Self { registry, options }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> MapperOptions {
        self.options
    }

    /// Parses JSON into any deserializable type; a `Node` result is optimized.
    pub fn read_json<T: DeserializeOwned + 'static>(&self, text: &str) -> Result<T, Error> {
        debug!(format = "json", bytes = text.len(), "reading document");
        let parsed = parse::from_json_str(text).map_err(|err| {
            parse_error(Format::Json, parse::categorize_json_error(&err), "mapper.read_json")
                .with_source(err)
        })?;
        self.optimize_root(&parsed)?;
        Ok(parsed)
    }

    /// Parses YAML into any deserializable type; a `Node` result is optimized.
    pub fn read_yaml<T: DeserializeOwned + 'static>(&self, text: &str) -> Result<T, Error> {
        debug!(format = "yaml", bytes = text.len(), "reading document");
        let parsed = parse::from_yaml_str(text).map_err(|err| {
            parse_error(Format::Yaml, parse::categorize_yaml_error(&err), "mapper.read_yaml")
                .with_source(err)
        })?;
        self.optimize_root(&parsed)?;
        Ok(parsed)
    }

    /// Parses a JSON object straight into shape `S`, optimized for `S` when concrete.
    pub fn read_json_doc<S: Shape>(&self, text: &str) -> Result<S, Error> {
        let value: Value = self.read_json(text)?;
        self.as_document::<S>(value)
    }

    /// Parses a YAML mapping straight into shape `S`, optimized for `S` when concrete.
    pub fn read_yaml_doc<S: Shape>(&self, text: &str) -> Result<S, Error> {
        let value: Value = self.read_yaml(text)?;
        self.as_document::<S>(value)
    }

    pub fn write_value_as_string<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, Error> {
        parse::to_json_string(data).map_err(|err| serialize_error(Format::Json).with_source(err))
    }

    pub fn write_value_as_yaml<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, Error> {
        parse::to_yaml_string(data).map_err(|err| serialize_error(Format::Yaml).with_source(err))
    }

    /// Copies `data` into a new optimized document by way of JSON text.
    pub fn write_value_as_map<T: Serialize + ?Sized>(&self, data: &T) -> Result<Node, Error> {
        self.write_value_as_map_of::<Node, T>(data)
    }

    pub fn write_value_as_map_of<S: Shape, T: Serialize + ?Sized>(
        &self,
        data: &T,
    ) -> Result<S, Error> {
        let text = self.write_value_as_string(data)?;
        self.read_json_doc::<S>(&text)
    }

    /// Structural copy of any serializable graph into `D` through JSON text.
    pub fn copy_value<T, D>(&self, data: &T) -> Result<D, Error>
    where
        T: Serialize + ?Sized,
        D: DeserializeOwned + 'static,
    {
        let text = self.write_value_as_string(data)?;
        self.read_json(&text)
    }

    fn optimize_root<T: 'static>(&self, parsed: &T) -> Result<(), Error> {
        if !self.options.optimize_on_read {
            return Ok(());
        }
        if let Some(node) = (parsed as &dyn Any).downcast_ref::<Node>() {
            node.optimize::<Node>(&self.registry)?;
        }
        Ok(())
    }

    fn as_document<S: Shape>(&self, value: Value) -> Result<S, Error> {
        let Value::Map(entries) = value else {
            return Err(Error::conversion(&value, S::NAME)
                .with_hint("the document root must be a map"));
        };
        let document = copy::materialize::<S>(entries);
        if self.options.optimize_on_read && !S::ABSTRACT {
            document.node().optimize::<S>(&self.registry)?;
        }
        Ok(document)
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(format: Format, category: ParseFailureCategory, context: &str) -> Error {
    Error::new(ErrorKind::Parse)
        .with_message(format!("invalid {} document", format.label()))
        .with_hint(parse::hint_for_category(category, context))
}

fn serialize_error(format: Format) -> Error {
    Error::new(ErrorKind::Serialize)
        .with_message(format!("value cannot be written as {}", format.label()))
}
