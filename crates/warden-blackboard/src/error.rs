// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised by the fact/hypothesis tables and the object list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlackboardError {
    /// A record's taint flag does not match the table it was inserted into.
    #[error("record tainted={record_tainted} cannot be inserted into a table holding tainted={table_tainted} records")]
    TaintMismatch {
        /// Taint flag carried by the record.
        record_tainted: bool,
        /// Taint flag the target table requires.
        table_tainted: bool,
    },
    /// A record's kind has no registered descriptor.
    #[error("unknown record kind '{0}'")]
    UnknownKind(String),
    /// Inserted data's sha256 already exists in the object list.
    #[error("duplicate object, existing id {existing_id}")]
    DuplicateObject {
        /// Id of the object already holding this hash.
        existing_id: u64,
    },
}
