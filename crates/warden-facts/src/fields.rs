// SPDX-License-Identifier: Apache-2.0
//! Typed field descriptors and values for record schemas.
//!
//! `FieldType` is the declared shape of a field on a record kind; `FieldValue`
//! is an actual value conforming (or not) to that shape. Validation happens
//! once, at record construction, rather than through a live descriptor
//! protocol attached to instances.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The type tags a record field can declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// Raw bytes.
    Bytes,
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// String-keyed dictionary of JSON-ish values.
    Dict,
    /// A list, optionally constrained to a single element type.
    List(Option<Box<FieldType>>),
    /// Either a string or bytes (consumers that want `getShell()`-style
    /// string coercion can call [`FieldValue::as_str_lossy`]).
    StrOrBytes,
    /// Either an int or a float.
    Numeric,
}

impl FieldType {
    /// Short name used in error messages and schema dumps.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Bytes => "bytes",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Dict => "dict",
            FieldType::List(_) => "list",
            FieldType::StrOrBytes => "str-or-bytes",
            FieldType::Numeric => "numeric",
        }
    }
}

/// A value stored in a field. Kept separate from [`FieldType`] so that
/// validation is an explicit, one-shot step rather than a descriptor
/// protocol invoked on every read/write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// UTF-8 string.
    Str(String),
    /// Boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// String-keyed dictionary.
    Dict(BTreeMap<String, serde_json::Value>),
    /// A (possibly type-constrained) list.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short name of the runtime type of this value, for error messages.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Bool(_) => "bool",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Dict(_) => "dict",
            FieldValue::List(_) => "list",
        }
    }

    /// Decodes a str-or-bytes field to a `String`, treating bytes as UTF-8
    /// (mirroring the source's `getShell()` decode-on-read behavior).
    #[must_use]
    pub fn as_str_lossy(&self) -> Option<String> {
        match self {
            FieldValue::Str(s) => Some(s.clone()),
            FieldValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }

    fn matches(&self, ty: &FieldType) -> bool {
        match (ty, self) {
            (FieldType::String, FieldValue::Str(_))
            | (FieldType::Bool, FieldValue::Bool(_))
            | (FieldType::Bytes, FieldValue::Bytes(_))
            | (FieldType::Int, FieldValue::Int(_))
            | (FieldType::Float, FieldValue::Float(_))
            | (FieldType::Dict, FieldValue::Dict(_)) => true,
            (FieldType::Numeric, FieldValue::Int(_) | FieldValue::Float(_)) => true,
            (FieldType::StrOrBytes, FieldValue::Str(_) | FieldValue::Bytes(_)) => true,
            (FieldType::List(_), FieldValue::List(_)) => true,
            _ => false,
        }
    }
}

/// Declares a single field on a record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within its record kind.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
    /// Whether the field must be supplied at construction.
    pub required: bool,
    /// Value used when the field is absent and not required.
    pub default: Option<FieldValue>,
    /// If set, the only values this field may hold.
    pub allowed_values: Option<Vec<FieldValue>>,
    /// Optional documentation string surfaced by schema introspection.
    pub help: Option<String>,
}

impl FieldDescriptor {
    /// Declares a required field with no default or allowed-value
    /// restriction.
    #[must_use]
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
            allowed_values: None,
            help: None,
        }
    }

    /// Declares an optional field with the given default.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: FieldType, default: Option<FieldValue>) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default,
            allowed_values: None,
            help: None,
        }
    }

    /// Restricts this field to a fixed set of allowed values.
    #[must_use]
    pub fn with_allowed_values(mut self, values: Vec<FieldValue>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Attaches help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub(crate) fn validate(&self, value: &FieldValue) -> Result<(), crate::FactsError> {
        if !value.matches(&self.ty) {
            return Err(crate::FactsError::TypeMismatch {
                field: self.name.clone(),
                expected: self.ty.tag(),
                got: value.tag(),
            });
        }
        if let FieldType::List(Some(elem_ty)) = &self.ty {
            if let FieldValue::List(items) = value {
                for item in items {
                    if !item.matches(elem_ty) {
                        return Err(crate::FactsError::ListElementMismatch {
                            field: self.name.clone(),
                            expected: elem_ty.tag(),
                            got: item.tag(),
                        });
                    }
                }
            }
        }
        if let Some(allowed) = &self.allowed_values {
            if !allowed.contains(value) {
                return Err(crate::FactsError::DisallowedValue(self.name.clone()));
            }
        }
        Ok(())
    }
}
