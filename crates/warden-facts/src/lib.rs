// SPDX-License-Identifier: Apache-2.0
//! Typed record (fact/hypothesis) schema model.
//!
//! Record kinds are declared once, at startup, as [`RecordDescriptor`]
//! values held in a [`RecordRegistry`]; individual [`Record`] values are
//! then validated against their kind's descriptor at construction time.
//! This replaces a descriptor-protocol-on-every-access model with a
//! validate-once value type — records are plain data after construction.

mod error;
mod fields;
mod record;
mod registry;

pub use error::FactsError;
pub use fields::{FieldDescriptor, FieldType, FieldValue};
pub use record::{Provenance, Record};
pub use registry::{RecordDescriptor, RecordRegistry};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::BTreeMap;

    fn md5_descriptor() -> RecordDescriptor {
        RecordDescriptor::new("md5")
            .in_groups(["hash"])
            .with_field(FieldDescriptor::required("hash", FieldType::String))
    }

    #[test]
    fn construct_valid_record() {
        let desc = md5_descriptor();
        let mut fields = BTreeMap::new();
        fields.insert("hash".to_string(), FieldValue::Str("abc123".to_string()));
        let rec = Record::new(&desc, fields, "HashNPC", 0.0, false).unwrap();
        assert_eq!(rec.kind, "md5");
        assert_eq!(rec.id, None);
        assert!(!rec.tainted);
    }

    #[test]
    fn missing_required_field_errors() {
        let desc = md5_descriptor();
        let err = Record::new(&desc, BTreeMap::new(), "HashNPC", 0.0, false).unwrap_err();
        assert_eq!(err, FactsError::MissingField("hash".to_string()));
    }

    #[test]
    fn type_mismatch_errors() {
        let desc = md5_descriptor();
        let mut fields = BTreeMap::new();
        fields.insert("hash".to_string(), FieldValue::Int(1));
        let err = Record::new(&desc, fields, "HashNPC", 0.0, false).unwrap_err();
        assert!(matches!(err, FactsError::TypeMismatch { .. }));
    }

    #[test]
    fn list_element_type_enforced_on_construction() {
        let desc = RecordDescriptor::new("tags").with_field(FieldDescriptor::optional(
            "values",
            FieldType::List(Some(Box::new(FieldType::String))),
            Some(FieldValue::List(Vec::new())),
        ));
        let mut fields = BTreeMap::new();
        fields.insert(
            "values".to_string(),
            FieldValue::List(vec![FieldValue::Str("ok".into()), FieldValue::Int(3)]),
        );
        let err = Record::new(&desc, fields, "x", 0.0, false).unwrap_err();
        assert!(matches!(err, FactsError::ListElementMismatch { .. }));
    }

    #[test]
    fn registry_rejects_duplicate_kind() {
        let mut reg = RecordRegistry::new();
        reg.register(md5_descriptor()).unwrap();
        let err = reg.register(md5_descriptor()).unwrap_err();
        assert_eq!(err, FactsError::DuplicateKind("md5".to_string()));
    }

    #[test]
    fn resolve_expands_groups() {
        let mut reg = RecordRegistry::new();
        reg.register(md5_descriptor()).unwrap();
        reg.register(RecordDescriptor::new("sha1").in_groups(["hash"]))
            .unwrap();
        let resolved = reg.resolve(["hash"]).unwrap();
        assert_eq!(
            resolved,
            ["md5", "sha1"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn resolve_unknown_name_errors() {
        let reg = RecordRegistry::new();
        let err = reg.resolve(["nope"]).unwrap_err();
        assert_eq!(err, FactsError::UnknownKind("nope".to_string()));
    }

    #[test]
    fn untaint_clears_flag_for_promotion() {
        let desc = md5_descriptor();
        let mut fields = BTreeMap::new();
        fields.insert("hash".to_string(), FieldValue::Str("abc".to_string()));
        let mut rec = Record::new(&desc, fields, "x", 0.0, true).unwrap();
        assert!(rec.tainted);
        rec.untaint();
        assert!(!rec.tainted);
    }
}
