// SPDX-License-Identifier: Apache-2.0
//! Startup input (§4.4.2): exactly one of a single binary object or a
//! parsed set of back-story seed facts. Seed back-story facts are
//! dispatched straight to the back-story categories and never occupy a
//! fact-table id (§4.4.7) — they are not the same thing as a fact
//! inserted via `AddFact`.

use warden_config::{validate_options, OptionBag};
use warden_facts::{Record, RecordRegistry};

/// One seed fact template, as it appears in a back-story seed document:
/// a record kind name plus its field arguments.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BackStorySeedFact {
    /// Record kind this template instantiates.
    pub name: String,
    /// Field values, validated against the kind's declared schema.
    #[serde(default)]
    pub arguments: OptionBag,
}

/// A parsed back-story seed document (§4.4.2, §6.2).
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct BackStorySeedDocument {
    /// Seed fact templates, in document order.
    #[serde(default)]
    pub facts: Vec<BackStorySeedFact>,
}

/// The startup seed: either a single binary object or a back-story seed
/// document. Configuration that supplies both or neither is rejected
/// before a [`GameSeed`] is ever constructed (§4.4.2).
pub enum GameSeed {
    /// A single object, dispatched to every registered NPC.
    Object {
        /// Raw payload.
        data: Vec<u8>,
        /// Optional `filename` metadata entry.
        filename: Option<String>,
    },
    /// Parsed back-story facts, dispatched to every back-story category.
    BackStoryFacts(BackStorySeedDocument),
}

/// Resolves `doc`'s fact templates into untainted, `GameMaster`-authored
/// records, skipping (and logging) any template whose kind is
/// unregistered or whose arguments fail schema validation — matching
/// the original's best-effort `resolveBackStoryFacts` behavior.
#[must_use]
pub fn resolve_backstory_facts(doc: &BackStorySeedDocument, registry: &RecordRegistry) -> Vec<Record> {
    let mut out = Vec::with_capacity(doc.facts.len());
    for template in &doc.facts {
        let Some(descriptor) = registry.get(&template.name) else {
            tracing::warn!(kind = %template.name, "unknown back-story seed fact kind");
            continue;
        };
        match validate_options(descriptor, &template.arguments) {
            Ok(mut record) => {
                record.creator = "GameMaster".to_string();
                out.push(record);
            }
            Err(err) => tracing::warn!(kind = %template.name, error = %err, "back-story seed fact failed validation"),
        }
    }
    out
}
