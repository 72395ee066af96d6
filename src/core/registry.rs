//! Purpose: Hold one converter per target type and the built-in default set.
//! Exports: `Registry`, `TypeKey`, `Converter`, `CopyStrategy`.
//! Role: Shared conversion table consulted by the dispatcher and node accessors.
//! Invariants: Every installed converter reports failures as `Conversion` errors.
//! Invariants: Enum converters are synthesized at most once per type, on first lookup.
//! Notes: The registry is `!Sync` by construction; confine it to one thread or lock it externally.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use time::{Date, OffsetDateTime, Time};
use tracing::debug;

use crate::core::copy;
use crate::core::error::{BoxError, Error, ErrorKind};
use crate::core::shape::Shape;
use crate::core::target::Target;
use crate::core::temporal::{self, Instant, OffsetTime, ZonedDateTime};
use crate::core::value::Value;

/// Type-erased converter; the boxed output is always the registered target type.
pub type Converter = Rc<dyn Fn(&Value, &Registry) -> Result<Box<dyn Any>, Error>>;

/// How structural copies (shape conversion) are produced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CopyStrategy {
    /// Deep copy of the value tree.
    #[default]
    Structural,
    /// Serialize to JSON text and parse it back.
    RoundTrip,
}

#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Target>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::type_name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub struct Registry {
    converters: RefCell<HashMap<TypeKey, Converter>>,
    defaults: RefCell<Vec<TypeKey>>,
    copy_strategy: Cell<CopyStrategy>,
}

impl Registry {
    /// A registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            converters: RefCell::new(HashMap::new()),
            defaults: RefCell::new(Vec::new()),
            copy_strategy: Cell::new(CopyStrategy::default()),
        }
    }

    /// Bootstrap: a registry with the built-in scalar and date/time converters.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.install_defaults();
        registry
    }

    pub fn copy_strategy(&self) -> CopyStrategy {
        self.copy_strategy.get()
    }

    pub fn set_copy_strategy(&self, strategy: CopyStrategy) {
        self.copy_strategy.set(strategy);
    }

    /// Installs or overwrites the converter for `T`.
    ///
    /// Failures other than `Conversion` errors are rewrapped with the offending
    /// value and the target type; `Conversion` errors pass through unchanged.
    pub fn register<T, F, E>(&self, convert: F)
    where
        T: Target,
        F: Fn(&Value) -> Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        debug!(target_type = T::type_name(), "registering converter");
        self.converters
            .borrow_mut()
            .insert(TypeKey::of::<T>(), wrap::<T, _, _>(convert));
    }

    /// Installs the converter only if `T` has none yet.
    pub fn register_if_absent<T, F, E>(&self, convert: F)
    where
        T: Target,
        F: Fn(&Value) -> Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        self.install_if_absent::<T>(|| wrap::<T, _, _>(convert));
    }

    pub fn unregister<T: Target>(&self) {
        if self
            .converters
            .borrow_mut()
            .remove(&TypeKey::of::<T>())
            .is_some()
        {
            debug!(target_type = T::type_name(), "unregistered converter");
        }
    }

    /// The converter for `T`, synthesizing and caching one for enums.
    pub fn lookup<T: Target>(&self) -> Option<Converter> {
        let key = TypeKey::of::<T>();
        let found = self.converters.borrow().get(&key).cloned();
        if found.is_some() || !T::ENUM {
            return found;
        }
        debug!(target_type = T::type_name(), "synthesizing enum converter");
        let convert = enum_converter::<T>();
        self.converters.borrow_mut().insert(key, convert.clone());
        Some(convert)
    }

    pub fn is_convertible<T: Target>(&self) -> bool {
        T::ENUM || self.is_registered::<T>()
    }

    pub fn is_registered<T: Target>(&self) -> bool {
        self.converters.borrow().contains_key(&TypeKey::of::<T>())
    }

    /// Types with an installed converter, sorted by name.
    pub fn registrations(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.converters.borrow().keys().copied().collect();
        keys.sort_by_key(|key| key.name);
        keys
    }

    /// Types installed by the bootstrap, sorted by name.
    pub fn default_registrations(&self) -> Vec<TypeKey> {
        let mut keys = self.defaults.borrow().clone();
        keys.sort_by_key(|key| key.name);
        keys
    }

    pub(crate) fn registration_names(&self) -> Vec<&'static str> {
        self.registrations().iter().map(TypeKey::name).collect()
    }

    /// Ensures shape `S` can be produced from maps by structural copy.
    ///
    /// An existing converter for `S` is left alone.
    pub fn ensure_shape<S: Shape>(&self) {
        self.install_if_absent::<S>(|| {
            debug!(shape = S::NAME, "installing structural copy converter");
            let copy: Converter = Rc::new(|value: &Value, registry: &Registry| {
                copy::copy_into::<S>(registry, value)
                    .map(|shape| Box::new(shape) as Box<dyn Any>)
                    .map_err(|err| rewrap(value, S::NAME, Box::new(err)))
            });
            copy
        });
    }

    fn install_if_absent<T: Target>(&self, build: impl FnOnce() -> Converter) {
        self.converters
            .borrow_mut()
            .entry(TypeKey::of::<T>())
            .or_insert_with(build);
    }

    fn register_default<T, F, E>(&self, convert: F)
    where
        T: Target,
        F: Fn(&Value) -> Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        self.defaults.borrow_mut().push(TypeKey::of::<T>());
        self.register(convert);
    }

    fn install_defaults(&self) {
        // enums need no registration; they are synthesized on lookup
        self.register_default(|value: &Value| Ok::<_, BoxError>(value.to_string()));
        self.register_default(|value: &Value| match value {
            Value::String(text) => Ok(text.eq_ignore_ascii_case("true")),
            other => Err(unsupported::<bool>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::String(text) => text.trim().parse::<i32>().map_err(BoxError::from),
            other => Err(unsupported::<i32>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::String(text) => text.trim().parse::<i64>().map_err(BoxError::from),
            other => Err(unsupported::<i64>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::Int(n) => Ok(*n as f64),
            Value::String(text) => text.trim().parse::<f64>().map_err(BoxError::from),
            other => Err(unsupported::<f64>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::Int(n) => Ok(BigInt::from(*n)),
            Value::String(text) => BigInt::from_str(text.trim()).map_err(BoxError::from),
            other => Err(unsupported::<BigInt>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::Int(n) => Ok(BigDecimal::from(*n)),
            Value::BigInt(n) => Ok(BigDecimal::new(n.clone(), 0)),
            // shortest round-trip text, so 0.1 stays 0.1
            Value::Float(n) => BigDecimal::from_str(&n.to_string()).map_err(BoxError::from),
            Value::String(text) => BigDecimal::from_str(text.trim()).map_err(BoxError::from),
            other => Err(unsupported::<BigDecimal>(other)),
        });

        self.register_default(|value: &Value| match value {
            Value::String(text) => temporal::parse_date(text).map_err(BoxError::from),
            other => Err(unsupported::<Date>(other)),
        });
        self.register_default(|value: &Value| match value {
            Value::String(text) => temporal::parse_time(text).map_err(BoxError::from),
            other => Err(unsupported::<Time>(other)),
        });
        self.register_default(|value: &Value| from_text::<OffsetTime>(value));
        self.register_default(|value: &Value| match value {
            Value::String(text) => temporal::parse_offset_date_time(text).map_err(BoxError::from),
            other => Err(unsupported::<OffsetDateTime>(other)),
        });
        self.register_default(|value: &Value| from_text::<ZonedDateTime>(value));
        self.register_default(|value: &Value| from_text::<Instant>(value));
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("registrations", &self.registration_names())
            .field("copy_strategy", &self.copy_strategy.get())
            .finish()
    }
}

fn unsupported<T: Target>(value: &Value) -> BoxError {
    Box::new(Error::conversion(value, T::type_name()))
}

fn from_text<T>(value: &Value) -> Result<T, BoxError>
where
    T: Target + FromStr<Err = Error>,
{
    match value {
        Value::String(text) => text.parse::<T>().map_err(BoxError::from),
        other => Err(unsupported::<T>(other)),
    }
}

fn wrap<T, F, E>(convert: F) -> Converter
where
    T: Target,
    F: Fn(&Value) -> Result<T, E> + 'static,
    E: Into<BoxError>,
{
    Rc::new(move |value: &Value, _registry: &Registry| {
        convert(value)
            .map(|converted| Box::new(converted) as Box<dyn Any>)
            .map_err(|err| rewrap(value, T::type_name(), err.into()))
    })
}

fn rewrap(value: &Value, target: &'static str, err: BoxError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) if err.kind() == ErrorKind::Conversion => *err,
        Ok(err) => Error::conversion(value, target).with_source(*err),
        Err(other) => Error::conversion(value, target).with_boxed_source(other),
    }
}

fn enum_converter<T: Target>() -> Converter {
    wrap::<T, _, _>(|value: &Value| match value {
        Value::String(name) => T::from_name(name).ok_or_else(|| {
            Error::conversion(value, T::type_name())
                .with_hint(format!("no {} variant is named `{name}`", T::type_name()))
        }),
        other => Err(Error::conversion(other, T::type_name())),
    })
}

#[cfg(test)]
mod tests {
    use super::{Registry, TypeKey};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::value::Value;

    #[derive(Clone, Debug, PartialEq)]
    enum Fuel {
        Petrol,
        Diesel,
    }

    crate::enum_target!(Fuel { Petrol, Diesel });

    #[test]
    fn defaults_cover_scalars_and_dates() {
        let registry = Registry::with_defaults();
        let names: Vec<&str> = registry
            .default_registrations()
            .iter()
            .map(TypeKey::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "BigDecimal",
                "BigInt",
                "Date",
                "Instant",
                "OffsetDateTime",
                "OffsetTime",
                "String",
                "Time",
                "ZonedDateTime",
                "bool",
                "f64",
                "i32",
                "i64",
            ]
        );
        assert_eq!(registry.registrations(), registry.default_registrations());
    }

    #[test]
    fn enum_converter_is_synthesized_once() {
        let registry = Registry::empty();
        assert!(registry.is_convertible::<Fuel>());
        assert!(!registry.is_registered::<Fuel>());

        let first = registry.lookup::<Fuel>().expect("synthesized");
        assert!(registry.is_registered::<Fuel>());
        let second = registry.lookup::<Fuel>().expect("cached");
        assert!(std::rc::Rc::ptr_eq(&first, &second));

        let converted = first(&Value::from("Diesel"), &registry).expect("convert");
        assert_eq!(converted.downcast_ref::<Fuel>(), Some(&Fuel::Diesel));

        let err = first(&Value::from("Electric"), &registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("cannot be converted to Fuel"));
    }

    #[test]
    fn register_if_absent_keeps_existing_converter() {
        let registry = Registry::empty();
        registry.register(|_: &Value| Ok::<_, Error>(Fuel::Petrol));
        registry.register_if_absent(|_: &Value| Ok::<_, Error>(Fuel::Diesel));
        let convert = registry.lookup::<Fuel>().expect("registered");
        let converted = convert(&Value::from("x"), &registry).expect("convert");
        assert_eq!(converted.downcast_ref::<Fuel>(), Some(&Fuel::Petrol));
    }

    #[test]
    fn foreign_failures_are_rewrapped_with_context() {
        let registry = Registry::with_defaults();
        let convert = registry.lookup::<i64>().expect("default");
        let err = convert(&Value::from("12x"), &registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(
            err.to_string()
                .contains("string with value=12x cannot be converted to i64")
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn conversion_failures_pass_through_unchanged() {
        let registry = Registry::empty();
        registry.register(|_: &Value| -> Result<Fuel, Error> {
            Err(Error::new(ErrorKind::Conversion).with_message("custom refusal"))
        });
        let convert = registry.lookup::<Fuel>().expect("registered");
        let err = convert(&Value::from("x"), &registry).unwrap_err();
        assert_eq!(err.message(), Some("custom refusal"));
    }
}
