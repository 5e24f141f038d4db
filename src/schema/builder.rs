use super::record_type::RecordType;
use crate::core::value::is_absent;
use crate::core::{AttributeMap, AttributeType, DataStoreError, NAME_ATTRIBUTE, Record, Result, Value};
use std::collections::BTreeMap;

/// What to do with input keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownAttributes {
    #[default]
    Ignore,
    Reject,
}

/// Turns untyped attribute input into a validated [`Record`].
///
/// Building is deterministic: no defaults, ids or timestamps are added.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder {
    unknown_attributes: UnknownAttributes,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unknown_attributes(mut self, policy: UnknownAttributes) -> Self {
        self.unknown_attributes = policy;
        self
    }

    pub fn strict() -> Self {
        Self::new().with_unknown_attributes(UnknownAttributes::Reject)
    }

    pub fn build(&self, record_type: &RecordType, input: &AttributeMap) -> Result<Record> {
        let entity = record_type.entity();
        let name = record_name(entity, input)?;

        // Presence first, so a missing required attribute is reported
        // even when another attribute would fail coercion.
        for attr in record_type.required_attributes() {
            if attr.name != NAME_ATTRIBUTE && is_absent(input.get(&attr.name)) {
                return Err(DataStoreError::MissingRequiredAttribute {
                    entity: entity.to_string(),
                    attribute: attr.name.clone(),
                });
            }
        }

        if self.unknown_attributes == UnknownAttributes::Reject
            && let Some(key) = input
                .keys()
                .find(|key| key.as_str() != NAME_ATTRIBUTE && record_type.attribute(key).is_none())
        {
            return Err(DataStoreError::UnknownAttribute {
                entity: entity.to_string(),
                attribute: key.clone(),
            });
        }

        let mut attributes = BTreeMap::new();
        for attr in record_type.attributes() {
            if attr.name == NAME_ATTRIBUTE {
                continue;
            }
            let raw = input.get(&attr.name);
            if let Some(raw) = raw.filter(|raw| !is_absent(Some(*raw))) {
                let value = Value::coerce(&attr.name, raw, attr.attribute_type)?;
                attributes.insert(attr.name.clone(), value);
            }
        }

        Ok(Record::new(entity, name, attributes))
    }
}

fn record_name(entity: &str, input: &AttributeMap) -> Result<String> {
    let raw = input.get(NAME_ATTRIBUTE);
    let Some(raw) = raw.filter(|raw| !is_absent(Some(*raw))) else {
        return Err(DataStoreError::MissingName(entity.to_string()));
    };
    match Value::coerce(NAME_ATTRIBUTE, raw, AttributeType::String)? {
        Value::Text(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(DataStoreError::MissingName(entity.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttributeDefinition, Entity};
    use serde_json::json;

    fn book_type() -> RecordType {
        RecordType::synthesize(
            &Entity::new("Book")
                .with_attribute(AttributeDefinition::new("title", AttributeType::String).required())
                .with_attribute(AttributeDefinition::new("pages", AttributeType::Number))
                .with_attribute(AttributeDefinition::new("author", AttributeType::Reference)),
        )
    }

    fn input(value: serde_json::Value) -> AttributeMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_builds_typed_record() {
        let record = RecordBuilder::new()
            .build(&book_type(), &input(json!({"name": "b1", "title": "Dune", "pages": "412"})))
            .unwrap();
        assert_eq!(record.name(), "b1");
        assert_eq!(record.entity(), "Book");
        assert_eq!(record.get("pages"), Some(&Value::Number(412.0)));
        assert!(record.get("author").is_none());
        assert!(record.get("name").is_none());
    }

    #[test]
    fn test_name_checked_before_everything() {
        for bad in [json!({"title": 5}), json!({"name": "", "pages": "x"}), json!({"name": "  "}), json!({"name": null})] {
            let err = RecordBuilder::new().build(&book_type(), &input(bad)).unwrap_err();
            assert!(matches!(err, DataStoreError::MissingName(ref e) if e == "Book"), "{err:?}");
        }
    }

    #[test]
    fn test_missing_required_beats_type_mismatch() {
        let err = RecordBuilder::new()
            .build(&book_type(), &input(json!({"name": "b1", "pages": "many"})))
            .unwrap_err();
        assert!(matches!(
            err,
            DataStoreError::MissingRequiredAttribute { ref attribute, .. } if attribute == "title"
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let err = RecordBuilder::new()
            .build(&book_type(), &input(json!({"name": "b1", "title": "Dune", "pages": "many"})))
            .unwrap_err();
        assert!(matches!(err, DataStoreError::TypeMismatch { ref attribute, .. } if attribute == "pages"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let err = RecordBuilder::new()
            .build(&book_type(), &input(json!({"name": "b1", "Title": "Dune"})))
            .unwrap_err();
        assert!(matches!(err, DataStoreError::MissingRequiredAttribute { .. }));
    }

    #[test]
    fn test_unknown_keys_policy() {
        let data = input(json!({"name": "b1", "title": "Dune", "colour": "blue"}));
        let record = RecordBuilder::new().build(&book_type(), &data).unwrap();
        assert!(record.get("colour").is_none());

        let err = RecordBuilder::strict().build(&book_type(), &data).unwrap_err();
        assert!(matches!(err, DataStoreError::UnknownAttribute { ref attribute, .. } if attribute == "colour"));
    }

    #[test]
    fn test_declared_name_attribute_is_identity() {
        let record_type = RecordType::synthesize(
            &Entity::new("Tag")
                .with_attribute(AttributeDefinition::new("name", AttributeType::String).required()),
        );
        let record = RecordBuilder::strict()
            .build(&record_type, &input(json!({"name": "rust"})))
            .unwrap();
        assert_eq!(record.name(), "rust");
        assert!(record.attributes().is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let data = input(json!({"name": "b1", "title": "Dune", "pages": 412, "author": "herbert"}));
        let builder = RecordBuilder::new();
        assert_eq!(
            builder.build(&book_type(), &data).unwrap(),
            builder.build(&book_type(), &data).unwrap()
        );
    }
}
