// SPDX-License-Identifier: Apache-2.0
//! The engine-level configuration document (§6.2): `Players`/`NPCS`/
//! `BackStories`/`Screens`/`Actions`/`common`/`engine` sections, with
//! per-entity option bags validated against each analyzer's declared
//! schema.

use crate::ConfigError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use warden_facts::{FieldType, FieldValue, Record, RecordDescriptor};

/// An entity's raw option bag, as handed to the engine by an
/// already-deserialized configuration document (§10.3). Values are kept
/// as [`serde_json::Value`] until validated against a schema, since the
/// document's own parser (YAML/JSON/TOML) is out of scope here.
pub type OptionBag = BTreeMap<String, serde_json::Value>;

/// The top-level configuration document (§6.2).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Registered player option bags, keyed by display name.
    #[serde(default, rename = "Players")]
    pub players: BTreeMap<String, OptionBag>,
    /// Registered NPC option bags, keyed by display name.
    #[serde(default, rename = "NPCS")]
    pub npcs: BTreeMap<String, OptionBag>,
    /// Registered back-story option bags, keyed by display name.
    #[serde(default, rename = "BackStories")]
    pub backstories: BTreeMap<String, OptionBag>,
    /// Registered screen option bags, keyed by display name.
    #[serde(default, rename = "Screens")]
    pub screens: BTreeMap<String, OptionBag>,
    /// Pre/post game hook names.
    #[serde(default, rename = "Actions")]
    pub actions: ActionsConfig,
    /// Options merged into every entity's bag under the key `"common"`.
    #[serde(default)]
    pub common: OptionBag,
    /// Engine-wide timing and filesystem settings.
    #[serde(default)]
    pub engine: EngineSettings,
}

impl EngineConfig {
    /// Returns the named player's option bag with `common` merged in, or
    /// `None` if no such player is configured.
    #[must_use]
    pub fn player_options(&self, name: &str) -> Option<OptionBag> {
        Self::merge(self.players.get(name), &self.common)
    }

    /// Returns the named NPC's option bag with `common` merged in.
    #[must_use]
    pub fn npc_options(&self, name: &str) -> Option<OptionBag> {
        Self::merge(self.npcs.get(name), &self.common)
    }

    /// Returns the named back-story's option bag with `common` merged in.
    #[must_use]
    pub fn backstory_options(&self, name: &str) -> Option<OptionBag> {
        Self::merge(self.backstories.get(name), &self.common)
    }

    /// Returns the named screen's option bag with `common` merged in.
    #[must_use]
    pub fn screen_options(&self, name: &str) -> Option<OptionBag> {
        Self::merge(self.screens.get(name), &self.common)
    }

    fn merge(entry: Option<&OptionBag>, common: &OptionBag) -> Option<OptionBag> {
        entry.map(|bag| {
            let mut merged = bag.clone();
            let common_value = common.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            merged.insert("common".to_string(), serde_json::Value::Object(common_value));
            merged
        })
    }
}

/// Pre/post game hook names (§6.2). The core carries the contract and a
/// registry slot only; concrete hooks are loader/collaborator territory.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ActionsConfig {
    /// Hook names run once at game start, in order.
    #[serde(default, rename = "onStart")]
    pub on_start: Vec<String>,
    /// Hook names run once at game end, in order.
    #[serde(default, rename = "onEnd")]
    pub on_end: Vec<String>,
}

/// Engine-wide timing and filesystem settings (§6.2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Seconds a waiting player clone may sit idle before quiescence
    /// counts it as settled (§4.4.6). Default `1`.
    #[serde(default = "default_grace_time")]
    pub grace_time: u64,
    /// Maximum wall-clock seconds the whole game may run. `0` means
    /// unlimited. Default `0`.
    #[serde(default)]
    pub max_game_time: u64,
    /// Maximum wall-clock seconds a single player clone's turn may run
    /// before it is ignored for liveness (§4.4.6). `0` means unlimited.
    #[serde(default)]
    pub max_turn_time: u64,
    /// Root directory for per-entity temporary directories. `None` means
    /// the host's default temp root.
    #[serde(default)]
    pub temporary: Option<PathBuf>,
    /// Extra module-discovery paths consulted by the (out-of-scope)
    /// loader.
    #[serde(default)]
    pub extras_paths: Vec<PathBuf>,
}

const fn default_grace_time() -> u64 {
    1
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grace_time: default_grace_time(),
            max_game_time: 0,
            max_turn_time: 0,
            temporary: None,
            extras_paths: Vec::new(),
        }
    }
}

/// Validates `options` against `schema`, converting values to the
/// descriptor's declared field types and reusing [`Record::new`]'s
/// required/default/unknown-key checks rather than a second validator
/// (§10.3). The returned [`Record`] is a validation artifact, not a
/// record meant for insertion into any table.
///
/// The `"common"` key is never validated against `schema`: it is merged
/// into an entity's bag by [`EngineConfig::player_options`] and its
/// siblings *after* the entity's own options were already meant to be
/// checked, and no analyzer schema declares it. Skipping it here keeps
/// `validate_options` safe to call on a bag that already has `common`
/// merged in.
///
/// # Errors
/// Returns a [`ConfigError`] if a value cannot be converted to its
/// declared type, or if [`Record::new`] rejects the converted bag
/// (missing required field, unknown key, disallowed value, ...).
pub fn validate_options(schema: &RecordDescriptor, options: &OptionBag) -> Result<Record, ConfigError> {
    let mut fields = BTreeMap::new();
    for (name, raw) in options {
        if name == "common" {
            continue;
        }
        let declared_ty = schema.fields.iter().find(|f| f.name == *name).map(|f| &f.ty);
        fields.insert(name.clone(), json_to_field_value(raw, declared_ty)?);
    }
    Record::new(schema, fields, "config", 0.0, false).map_err(ConfigError::from)
}

fn json_to_field_value(value: &serde_json::Value, ty: Option<&FieldType>) -> Result<FieldValue, ConfigError> {
    match value {
        serde_json::Value::Null => Err(ConfigError::Other("null option values are not supported".to_string())),
        serde_json::Value::Bool(b) => Ok(FieldValue::Bool(*b)),
        serde_json::Value::String(s) => Ok(FieldValue::Str(s.clone())),
        serde_json::Value::Number(n) => match ty {
            Some(FieldType::Float) => n
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| ConfigError::Other(format!("'{n}' is not a valid float"))),
            _ => n.as_i64().map_or_else(
                || {
                    n.as_f64()
                        .map(FieldValue::Float)
                        .ok_or_else(|| ConfigError::Other(format!("'{n}' is not a valid number")))
                },
                |i| Ok(FieldValue::Int(i)),
            ),
        },
        serde_json::Value::Array(items) => {
            let elem_ty = match ty {
                Some(FieldType::List(inner)) => inner.as_deref(),
                _ => None,
            };
            let converted = items
                .iter()
                .map(|item| json_to_field_value(item, elem_ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::List(converted))
        }
        serde_json::Value::Object(map) => {
            let dict = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            Ok(FieldValue::Dict(dict))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use warden_facts::FieldDescriptor;

    fn schema() -> RecordDescriptor {
        RecordDescriptor::new("Sherlock")
            .with_field(FieldDescriptor::required("depth", FieldType::Int))
            .with_field(FieldDescriptor::optional("verbose", FieldType::Bool, Some(FieldValue::Bool(false))))
    }

    #[test]
    fn validates_known_options() {
        let mut bag = OptionBag::new();
        bag.insert("depth".to_string(), serde_json::json!(3));
        let record = validate_options(&schema(), &bag).unwrap();
        assert_eq!(record.field("depth"), Some(&FieldValue::Int(3)));
        assert_eq!(record.field("verbose"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn rejects_unknown_option_keys() {
        let mut bag = OptionBag::new();
        bag.insert("depth".to_string(), serde_json::json!(3));
        bag.insert("nope".to_string(), serde_json::json!("x"));
        let err = validate_options(&schema(), &bag).unwrap_err();
        assert!(matches!(err, ConfigError::Facts(warden_facts::FactsError::UnknownField(_))));
    }

    #[test]
    fn rejects_missing_required_option() {
        let err = validate_options(&schema(), &OptionBag::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Facts(warden_facts::FactsError::MissingField(_))));
    }

    #[test]
    fn merges_common_into_player_options() {
        let mut config = EngineConfig::default();
        let mut sherlock = OptionBag::new();
        sherlock.insert("depth".to_string(), serde_json::json!(3));
        config.players.insert("Sherlock".to_string(), sherlock);
        config.common.insert("caseId".to_string(), serde_json::json!("case-1"));

        let merged = config.player_options("Sherlock").unwrap();
        assert_eq!(merged.get("depth"), Some(&serde_json::json!(3)));
        assert_eq!(
            merged.get("common"),
            Some(&serde_json::json!({"caseId": "case-1"}))
        );
    }

    #[test]
    fn validates_merged_bag_ignoring_common() {
        let mut config = EngineConfig::default();
        let mut sherlock = OptionBag::new();
        sherlock.insert("depth".to_string(), serde_json::json!(3));
        config.players.insert("Sherlock".to_string(), sherlock);
        config.common.insert("caseId".to_string(), serde_json::json!("case-1"));

        let merged = config.player_options("Sherlock").unwrap();
        let record = validate_options(&schema(), &merged).unwrap();
        assert_eq!(record.field("depth"), Some(&FieldValue::Int(3)));
        assert!(record.field("common").is_none());
    }

    #[test]
    fn engine_settings_default_matches_spec() {
        let settings = EngineSettings::default();
        assert_eq!(settings.grace_time, 1);
        assert_eq!(settings.max_game_time, 0);
        assert_eq!(settings.max_turn_time, 0);
        assert!(settings.temporary.is_none());
    }
}
