use super::{DataStoreError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

lazy_static! {
    static ref ENTITY_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap();
    static ref ATTRIBUTE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Attribute every record carries as its identity.
pub const NAME_ATTRIBUTE: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    Date,
    Reference,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[serde(default)]
    pub required: bool,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Fingerprint of an ordered attribute list. Two schemas with the same
/// attributes in the same order share a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion(u64);

impl SchemaVersion {
    pub fn of(attributes: &[AttributeDefinition]) -> Self {
        let mut hasher = DefaultHasher::new();
        attributes.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Schema definition of one record kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn version(&self) -> SchemaVersion {
        SchemaVersion::of(&self.attributes)
    }

    /// Checks the structural rules a schema must satisfy before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DataStoreError::InvalidSchema(
                "schema name must not be empty".to_string(),
            ));
        }
        if !ENTITY_NAME.is_match(&self.name) {
            return Err(DataStoreError::InvalidSchema(format!(
                "'{}' is not a valid schema name",
                self.name
            )));
        }

        let mut seen = HashSet::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            if !ATTRIBUTE_NAME.is_match(&attr.name) {
                return Err(DataStoreError::InvalidSchema(format!(
                    "'{}' is not a valid attribute name in schema '{}'",
                    attr.name, self.name
                )));
            }
            if !seen.insert(attr.name.as_str()) {
                return Err(DataStoreError::InvalidSchema(format!(
                    "attribute '{}' is declared twice in schema '{}'",
                    attr.name, self.name
                )));
            }
            if attr.name == NAME_ATTRIBUTE && attr.attribute_type != AttributeType::String {
                return Err(DataStoreError::InvalidSchema(format!(
                    "attribute '{}' of schema '{}' must be a string",
                    NAME_ATTRIBUTE, self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Entity {
        Entity::new("Book")
            .with_attribute(AttributeDefinition::new("title", AttributeType::String).required())
            .with_attribute(AttributeDefinition::new("pages", AttributeType::Number))
    }

    #[test]
    fn test_valid_schema_passes() {
        assert!(book().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = Entity::new("").validate().unwrap_err();
        assert!(matches!(err, DataStoreError::InvalidSchema(_)));
    }

    #[test]
    fn test_reserved_prefix_rejected() {
        assert!(Entity::new("$entity").validate().is_err());
        assert!(Entity::new("has space").validate().is_err());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let entity = book().with_attribute(AttributeDefinition::new("title", AttributeType::String));
        let err = entity.validate().unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_name_attribute_must_be_string() {
        let entity = Entity::new("Counter")
            .with_attribute(AttributeDefinition::new("name", AttributeType::Number));
        assert!(entity.validate().is_err());

        let entity = Entity::new("Counter")
            .with_attribute(AttributeDefinition::new("name", AttributeType::String).required());
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_version_tracks_attribute_list() {
        let a = book();
        let b = book();
        assert_eq!(a.version(), b.version());

        let changed = book().with_attribute(AttributeDefinition::new("isbn", AttributeType::String));
        assert_ne!(a.version(), changed.version());

        let mut reordered = book();
        reordered.attributes.reverse();
        assert_ne!(a.version(), reordered.version());
    }

    #[test]
    fn test_attribute_json_shape() {
        let json = serde_json::to_value(AttributeDefinition::new("due", AttributeType::Date)).unwrap();
        assert_eq!(json, serde_json::json!({"name": "due", "type": "date", "required": false}));

        let parsed: Entity = serde_json::from_str(r#"{"name":"Tag"}"#).unwrap();
        assert!(parsed.attributes.is_empty());
    }
}
