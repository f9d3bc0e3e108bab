// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised while registering or constructing typed records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FactsError {
    /// A record kind was referenced that has no registered descriptor.
    #[error("unknown record kind '{0}'")]
    UnknownKind(String),
    /// A record-group name was referenced that has no registered members.
    #[error("unknown record group '{0}'")]
    UnknownGroup(String),
    /// A kind was registered twice.
    #[error("record kind '{0}' is already registered")]
    DuplicateKind(String),
    /// A required field was absent from the constructor arguments.
    #[error("field '{0}' is required")]
    MissingField(String),
    /// A field was supplied whose value type does not match the descriptor.
    #[error("field '{field}' expected {expected} (got {got})")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Expected type tag.
        expected: &'static str,
        /// Observed type tag.
        got: &'static str,
    },
    /// A field's value was not among its `allowed_values`.
    #[error("field '{0}' value is not an allowed value")]
    DisallowedValue(String),
    /// A field name was supplied that the descriptor does not declare.
    #[error("field '{0}' is not declared on this record kind")]
    UnknownField(String),
    /// A list-typed field received an element of the wrong type.
    #[error("field '{field}' list element expected {expected} (got {got})")]
    ListElementMismatch {
        /// Field name.
        field: String,
        /// Expected element type tag.
        expected: &'static str,
        /// Observed element type tag.
        got: &'static str,
    },
}
