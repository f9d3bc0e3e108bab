// SPDX-License-Identifier: Apache-2.0
//! The shared blackboard: fact/hypothesis tables and the content-addressed
//! object list (§3.2, §3.3).
//!
//! All mutation here is single-writer by convention (§5) — this crate does
//! not itself enforce exclusivity; the coordinator crate is the only
//! caller that holds `&mut` access at runtime.

mod error;
mod hash;
mod object;
mod table;
mod view;

pub use error::BlackboardError;
pub use hash::ObjectHash;
pub use object::{split_filename_metadata, FileObject, NewObject, ObjectList};
pub use table::{FactTable, HypothesisTable};
pub use view::BlackboardView;
