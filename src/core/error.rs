use std::error::Error as StdError;
use std::fmt;

use crate::core::value::Value;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Conversion,
    NotFound,
    NotUnique,
    Optimization,
    Parse,
    Serialize,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    key: Option<String>,
    target: Option<&'static str>,
    source: Option<BoxError>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            key: None,
            target: None,
            source: None,
        }
    }

    /// Conversion failure naming the value's runtime type, the value, and the target.
    pub fn conversion(value: &Value, target: &'static str) -> Self {
        Self::new(ErrorKind::Conversion)
            .with_message(conversion_message(value, target))
            .with_target(target)
    }

    /// Conversion failure for a target nothing can produce; lists what is registered.
    pub fn converter_missing(value: &Value, target: &'static str, registered: &[&str]) -> Self {
        Self::new(ErrorKind::Conversion)
            .with_message(format!(
                "Converter missing: {}. Converters are registered for {}",
                conversion_message(value, target),
                registered.join(", ")
            ))
            .with_target(target)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn target(&self) -> Option<&'static str> {
        self.target
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub(crate) fn with_boxed_source(mut self, source: BoxError) -> Self {
        self.source = Some(source);
        self
    }
}

fn conversion_message(value: &Value, target: &'static str) -> String {
    format!(
        "{} with value={value} cannot be converted to {target}",
        value.type_name()
    )
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
