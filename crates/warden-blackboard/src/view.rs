// SPDX-License-Identifier: Apache-2.0
//! Read-only view over the blackboard, consumed by screens (§4.7).

use crate::{FactTable, HypothesisTable, ObjectList};

/// A read-only snapshot reference over the three blackboard stores. Screens
/// receive this and nothing else — there is no mutation path from here.
#[derive(Debug, Clone, Copy)]
pub struct BlackboardView<'a> {
    /// The fact table.
    pub facts: &'a FactTable,
    /// The hypothesis table.
    pub hyps: &'a HypothesisTable,
    /// The object list.
    pub objects: &'a ObjectList,
}
