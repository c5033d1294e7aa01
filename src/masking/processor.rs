//! Applies a collection's field masks to result documents
//!
//! Masks match on field name at any depth. Nested documents and lists are
//! walked; a masked field holding a document is walked rather than
//! replaced, and a masked list has each scalar element transformed.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::definition::MaskLookup;

use super::errors::{MaskError, MaskResult};
use super::mask::MaskType;

pub struct MaskProcessor<'a> {
    masks: &'a dyn MaskLookup,
}

impl<'a> MaskProcessor<'a> {
    pub fn new(masks: &'a dyn MaskLookup) -> Self {
        Self { masks }
    }

    /// Mask `docs` in place with the masks configured for `collection`
    pub fn mask_documents(&self, collection: &str, docs: &mut [Value]) -> MaskResult<()> {
        let rules = self.rules_for(collection)?;
        if rules.is_empty() {
            return Ok(());
        }
        for doc in docs.iter_mut() {
            mask_value(doc, &rules);
        }
        Ok(())
    }

    /// Parsed mask types by field name
    pub fn rules_for(&self, collection: &str) -> MaskResult<HashMap<String, MaskType>> {
        let masks = self
            .masks
            .masks_for_collection(collection)
            .map_err(|source| MaskError::Lookup {
                collection: collection.to_string(),
                source,
            })?;

        masks
            .into_iter()
            .map(|(field, mask)| match mask.mask_type.parse::<MaskType>() {
                Ok(mask_type) => Ok((field, mask_type)),
                Err(mask_type) => Err(MaskError::UnknownType { field, mask_type }),
            })
            .collect()
    }
}

fn mask_value(value: &mut Value, rules: &HashMap<String, MaskType>) {
    match value {
        Value::Object(map) => mask_document(map, rules),
        Value::Array(items) => {
            for item in items.iter_mut() {
                mask_value(item, rules);
            }
        }
        _ => {}
    }
}

fn mask_document(map: &mut Map<String, Value>, rules: &HashMap<String, MaskType>) {
    map.retain(|key, _| rules.get(key) != Some(&MaskType::Remove));

    for (key, child) in map.iter_mut() {
        match rules.get(key) {
            Some(rule) => mask_field(child, *rule, rules),
            None => mask_value(child, rules),
        }
    }
}

fn mask_field(value: &mut Value, rule: MaskType, rules: &HashMap<String, MaskType>) {
    match value {
        Value::Object(map) => mask_document(map, rules),
        Value::Array(items) => {
            for item in items.iter_mut() {
                mask_field(item, rule, rules);
            }
        }
        scalar => rule.apply(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionRegistry, Mask};
    use serde_json::json;

    fn registry(masks: &[(&str, &str, &str)]) -> DefinitionRegistry {
        let registry = DefinitionRegistry::new();
        for (collection, field, mask_type) in masks {
            registry
                .upsert_mask(Mask::new(*collection, *field, *mask_type))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_masks_nested_fields() {
        let registry = registry(&[
            ("users", "ssn", "right4"),
            ("users", "password", "remove"),
            ("users", "email", "email"),
        ]);
        let mut docs = vec![json!({
            "name": "Ann",
            "ssn": "123456789",
            "password": "hunter2",
            "contacts": [
                {"email": "ann@example.com", "password": "x"},
                {"email": "bob@example.org"}
            ],
            "profile": {"ssn": 987654321}
        })];

        MaskProcessor::new(&registry)
            .mask_documents("users", &mut docs)
            .unwrap();

        assert_eq!(
            docs[0],
            json!({
                "name": "Ann",
                "ssn": "*****6789",
                "contacts": [
                    {"email": "a**@e******.com"},
                    {"email": "b**@e******.org"}
                ],
                "profile": {"ssn": "*****4321"}
            })
        );
    }

    #[test]
    fn test_masked_list_of_scalars() {
        let registry = registry(&[("users", "phones", "all")]);
        let mut docs = vec![json!({"phones": ["555-1234", 5551234]})];

        MaskProcessor::new(&registry)
            .mask_documents("users", &mut docs)
            .unwrap();
        assert_eq!(docs[0], json!({"phones": ["******", 0]}));
    }

    #[test]
    fn test_other_collections_untouched() {
        let registry = registry(&[("users", "ssn", "all")]);
        let mut docs = vec![json!({"ssn": "123"})];

        MaskProcessor::new(&registry)
            .mask_documents("stations", &mut docs)
            .unwrap();
        assert_eq!(docs[0], json!({"ssn": "123"}));
    }

    #[test]
    fn test_wildcard_masks_apply() {
        let registry = registry(&[("*", "token", "remove")]);
        let mut docs = vec![json!({"id": 1, "token": "abc"})];

        MaskProcessor::new(&registry)
            .mask_documents("stations", &mut docs)
            .unwrap();
        assert_eq!(docs[0], json!({"id": 1}));
    }

    #[test]
    fn test_unknown_mask_type_fails() {
        let registry = registry(&[("users", "ssn", "rem")]);
        let mut docs = vec![json!({"ssn": "123"})];

        let err = MaskProcessor::new(&registry)
            .mask_documents("users", &mut docs)
            .unwrap_err();
        assert!(matches!(err, MaskError::UnknownType { .. }));
    }
}
