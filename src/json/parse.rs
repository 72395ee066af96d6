//! Purpose: Provide the JSON and YAML decode/encode entrypoints.
//! Exports: `from_json_str`, `from_yaml_str`, `to_json_string`, `to_yaml_string`,
//! `ParseFailureCategory`, categorization and hint helpers.
//! Role: Parser boundary that centralizes serde_json/serde_yaml usage details.
//! Invariants: Both formats decode into the same value tree shape.
//! Invariants: Encoded objects have sorted keys and no null members.
//! Invariants: Category labels are stable; hints carry category and context only, never payload.
//! Notes: Error mapping is done by callsites so domain context stays explicit.

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Eof,
    Data,
    Io,
    Unknown,
}

impl ParseFailureCategory {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Eof => "eof",
            Self::Data => "data",
            Self::Io => "io",
            Self::Unknown => "unknown",
        }
    }
}

pub(crate) fn from_json_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

pub(crate) fn from_yaml_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_str(input)
}

/// Encodes through an intermediate JSON tree: object keys come out sorted and
/// null members are dropped at every depth, whatever the input type.
fn to_json_tree<T: Serialize + ?Sized>(
    value: &T,
) -> Result<serde_json::Value, serde_json::Error> {
    let mut tree = serde_json::to_value(value)?;
    prune_nulls(&mut tree);
    Ok(tree)
}

pub(crate) fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_json_tree(value)?)
}

/// Block-style YAML without a document-start marker. Sequence items are written
/// at the indentation of their key (`persons:\n- name: ..`); serde_yaml has no
/// option for indenting them under the key.
pub(crate) fn to_yaml_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_yaml::Error> {
    let tree = to_json_tree(value).map_err(<serde_yaml::Error as serde::ser::Error>::custom)?;
    serde_yaml::to_string(&tree)
}

fn prune_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(members) => {
            members.retain(|_, member| !member.is_null());
            members.values_mut().for_each(prune_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}

pub(crate) fn categorize_json_error(err: &serde_json::Error) -> ParseFailureCategory {
    match err.classify() {
        serde_json::error::Category::Syntax => ParseFailureCategory::Syntax,
        serde_json::error::Category::Eof => ParseFailureCategory::Eof,
        serde_json::error::Category::Data => ParseFailureCategory::Data,
        serde_json::error::Category::Io => ParseFailureCategory::Io,
    }
}

pub(crate) fn categorize_yaml_error(err: &serde_yaml::Error) -> ParseFailureCategory {
    match categorize_message(&err.to_string()) {
        ParseFailureCategory::Unknown if err.location().is_some() => ParseFailureCategory::Syntax,
        category => category,
    }
}

pub(crate) fn categorize_message(message: &str) -> ParseFailureCategory {
    let message = message.to_ascii_lowercase();
    if message.contains("end of stream") || message.contains("eof while parsing") {
        ParseFailureCategory::Eof
    } else if ["invalid type", "missing field", "unknown variant", "invalid value", "invalid length"]
        .iter()
        .any(|marker| message.contains(marker))
    {
        ParseFailureCategory::Data
    } else if message.contains("io error") {
        ParseFailureCategory::Io
    } else {
        ParseFailureCategory::Unknown
    }
}

pub(crate) fn hint_for_category(category: ParseFailureCategory, context: &str) -> String {
    format!("parse category: {}, context: {context}", category.as_str())
}
