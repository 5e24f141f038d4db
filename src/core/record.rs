use super::{NAME_ATTRIBUTE, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Untyped attribute input as handed over by a request handler.
pub type AttributeMap = Map<String, JsonValue>;

/// A validated record of one runtime-defined kind.
///
/// Records are produced by [`RecordBuilder`](crate::schema::RecordBuilder)
/// or decoded from storage; there is no public constructor so every
/// instance has gone through schema validation at some point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity: String,
    name: String,
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub(crate) fn new(
        entity: impl Into<String>,
        name: impl Into<String>,
        attributes: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            attributes,
        }
    }

    /// Schema name this record conforms to.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Flat JSON object: `name` followed by every attribute.
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.attributes.len() + 1);
        map.insert(
            NAME_ATTRIBUTE.to_string(),
            JsonValue::String(self.name.clone()),
        );
        for (key, value) in &self.attributes {
            map.insert(key.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_flattens_attributes() {
        let mut attributes = BTreeMap::new();
        attributes.insert("title".to_string(), Value::Text("Dune".into()));
        attributes.insert("pages".to_string(), Value::Number(412.0));
        let record = Record::new("Book", "b1", attributes);

        assert_eq!(
            record.to_json(),
            json!({"name": "b1", "title": "Dune", "pages": 412.0})
        );
        assert_eq!(record.entity(), "Book");
        assert_eq!(record.get("title").and_then(Value::as_str), Some("Dune"));
        assert!(record.get("missing").is_none());
    }
}
