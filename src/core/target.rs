//! Purpose: Describe the Rust types a dynamic value can be converted into.
//! Exports: `Target`, `enum_target!`.
//! Role: Static replacement for runtime type checks; each target knows how to
//! recognize a value that already has its shape.
//! Invariants: `cast` never converts; it only re-views a value of matching shape.
//! Invariants: Node-backed casts alias the stored node instead of copying it.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use time::{Date, OffsetDateTime, Time};

use crate::core::list::NodeList;
use crate::core::shape::Shape;
use crate::core::temporal::{Instant, OffsetTime, Temporal, ZonedDateTime};
use crate::core::value::{Opaque, Value};

pub trait Target: Sized + 'static {
    /// Enumerations get a by-name converter synthesized on first use.
    const ENUM: bool = false;

    fn type_name() -> &'static str;

    /// Identity view of `value` when its runtime shape already matches.
    fn cast(value: &Value) -> Option<Self>;

    fn from_name(_name: &str) -> Option<Self> {
        None
    }
}

impl<S: Shape> Target for S {
    fn type_name() -> &'static str {
        S::NAME
    }

    fn cast(value: &Value) -> Option<Self> {
        match value {
            Value::Node(node) if node.shape().conforms_to(S::tag()) => {
                Some(S::from_node(node.clone()))
            }
            _ => None,
        }
    }
}

macro_rules! cast_target {
    ($ty:ty, $name:literal, $pattern:pat => $out:expr) => {
        impl Target for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn cast(value: &Value) -> Option<Self> {
                match value {
                    $pattern => Some($out),
                    _ => None,
                }
            }
        }
    };
}

cast_target!(String, "String", Value::String(text) => text.clone());
cast_target!(bool, "bool", Value::Bool(flag) => *flag);
cast_target!(i64, "i64", Value::Int(n) => *n);
cast_target!(f64, "f64", Value::Float(n) => *n);
cast_target!(BigInt, "BigInt", Value::BigInt(n) => n.clone());
cast_target!(BigDecimal, "BigDecimal", Value::Decimal(n) => n.clone());
cast_target!(NodeList, "NodeList", Value::List(list) => list.clone());
cast_target!(Opaque, "Opaque", Value::Opaque(opaque) => opaque.clone());
cast_target!(Date, "Date", Value::Temporal(Temporal::Date(date)) => *date);
cast_target!(Time, "Time", Value::Temporal(Temporal::Time(time)) => *time);
cast_target!(OffsetTime, "OffsetTime", Value::Temporal(Temporal::OffsetTime(time)) => *time);
cast_target!(
    OffsetDateTime,
    "OffsetDateTime",
    Value::Temporal(Temporal::OffsetDateTime(datetime)) => *datetime
);
cast_target!(
    ZonedDateTime,
    "ZonedDateTime",
    Value::Temporal(Temporal::Zoned(zoned)) => zoned.clone()
);
cast_target!(Instant, "Instant", Value::Temporal(Temporal::Instant(instant)) => *instant);

impl Target for i32 {
    fn type_name() -> &'static str {
        "i32"
    }

    fn cast(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }
}

/// Any value is already a `Value`.
impl Target for Value {
    fn type_name() -> &'static str {
        "Value"
    }

    fn cast(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Generic list view over both raw arrays and node lists.
impl Target for Vec<Value> {
    fn type_name() -> &'static str {
        "List"
    }

    fn cast(value: &Value) -> Option<Self> {
        value.to_items()
    }
}

/// Implements [`Target`] for a field-less enum, converting from the exact variant name.
///
/// ```
/// #[derive(Debug, PartialEq)]
/// enum Fruit { Apple, Banana }
/// docmap::enum_target!(Fruit { Apple, Banana });
/// ```
#[macro_export]
macro_rules! enum_target {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::core::target::Target for $ty {
            const ENUM: bool = true;

            fn type_name() -> &'static str {
                stringify!($ty)
            }

            fn cast(_value: &$crate::core::value::Value) -> Option<Self> {
                None
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}
