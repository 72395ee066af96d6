//! Purpose: Decide how a dynamic value becomes a requested target type.
//! Exports: `Conversion`, `ConversionKind`, `convert`.
//! Role: Single dispatch point behind every typed accessor.
//! Invariants: Null input yields `Ok(None)`, never an error.
//! Invariants: A value whose shape already matches is returned as-is (no converter runs).

use std::fmt;

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Converter, Registry};
use crate::core::target::Target;
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConversionKind {
    Null,
    Cast,
    Convert,
    Impossible,
}

/// Classification of a (value, target) pair, carrying what is needed to finish it.
pub enum Conversion<T> {
    Null,
    Cast(T),
    Convert(Converter),
    Impossible,
}

impl<T: Target> Conversion<T> {
    pub fn classify(value: &Value, registry: &Registry) -> Self {
        if value.is_null() {
            return Self::Null;
        }
        if let Some(cast) = T::cast(value) {
            return Self::Cast(cast);
        }
        match registry.lookup::<T>() {
            Some(converter) => Self::Convert(converter),
            None => Self::Impossible,
        }
    }

    pub fn kind(&self) -> ConversionKind {
        match self {
            Self::Null => ConversionKind::Null,
            Self::Cast(_) => ConversionKind::Cast,
            Self::Convert(_) => ConversionKind::Convert,
            Self::Impossible => ConversionKind::Impossible,
        }
    }
}

impl<T> fmt::Debug for Conversion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Null => "Null",
            Self::Cast(_) => "Cast",
            Self::Convert(_) => "Convert",
            Self::Impossible => "Impossible",
        };
        f.write_str(label)
    }
}

pub fn convert<T: Target>(registry: &Registry, value: &Value) -> Result<Option<T>, Error> {
    match Conversion::<T>::classify(value, registry) {
        Conversion::Null => Ok(None),
        Conversion::Cast(cast) => Ok(Some(cast)),
        Conversion::Convert(converter) => {
            let converted = converter(value, registry)?;
            converted.downcast::<T>().map(|out| Some(*out)).map_err(|_| {
                Error::new(ErrorKind::Internal)
                    .with_message(format!(
                        "converter registered for {} produced another type",
                        T::type_name()
                    ))
                    .with_target(T::type_name())
            })
        }
        Conversion::Impossible => Err(Error::converter_missing(
            value,
            T::type_name(),
            &registry.registration_names(),
        )),
    }
}
