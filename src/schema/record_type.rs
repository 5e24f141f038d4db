use crate::core::{AttributeDefinition, DataStoreError, Entity, Record, Result, SchemaVersion};
use crate::storage::{RecordKind, codec};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared reference to a synthesized record type.
pub type RecordTypeHandle = Arc<RecordType>;

/// Immutable attribute layout of one schema version.
///
/// Replaces a generated class per schema: attribute access is a lookup
/// into the ordered definition list instead of a generated accessor.
#[derive(Debug)]
pub struct RecordType {
    entity: String,
    version: SchemaVersion,
    attributes: Vec<AttributeDefinition>,
    index: HashMap<String, usize>,
}

impl RecordType {
    pub(crate) fn synthesize(entity: &Entity) -> Self {
        let index = entity
            .attributes
            .iter()
            .enumerate()
            .map(|(pos, attr)| (attr.name.clone(), pos))
            .collect();
        Self {
            entity: entity.name.clone(),
            version: entity.version(),
            attributes: entity.attributes.clone(),
            index,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Attribute definitions in declaration order.
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.index.get(name).map(|&pos| &self.attributes[pos])
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter().filter(|attr| attr.required)
    }
}

impl RecordKind for RecordType {
    type Record = Record;

    fn kind(&self) -> &str {
        &self.entity
    }

    fn record_name<'r>(&self, record: &'r Record) -> &'r str {
        record.name()
    }

    fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        if record.entity() != self.entity {
            return Err(DataStoreError::ValidationError(format!(
                "record '{}' belongs to schema '{}', not '{}'",
                record.name(),
                record.entity(),
                self.entity
            )));
        }
        codec::encode(record)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let record: Record = codec::decode(bytes)?;
        if record.entity() != self.entity {
            return Err(DataStoreError::Codec(format!(
                "stored record '{}' is tagged '{}' inside partition '{}'",
                record.name(),
                record.entity(),
                self.entity
            )));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttributeType;

    #[test]
    fn test_synthesized_layout() {
        let entity = Entity::new("Book")
            .with_attribute(AttributeDefinition::new("title", AttributeType::String).required())
            .with_attribute(AttributeDefinition::new("published", AttributeType::Date));
        let record_type = RecordType::synthesize(&entity);

        assert_eq!(record_type.entity(), "Book");
        assert_eq!(record_type.version(), entity.version());
        assert_eq!(record_type.attributes().len(), 2);
        assert_eq!(
            record_type.attribute("published").map(|a| a.attribute_type),
            Some(AttributeType::Date)
        );
        assert!(record_type.attribute("Title").is_none());
        let required: Vec<_> = record_type.required_attributes().map(|a| a.name.as_str()).collect();
        assert_eq!(required, vec!["title"]);
    }

    #[test]
    fn test_foreign_record_rejected() {
        let book = RecordType::synthesize(&Entity::new("Book"));
        let record = Record::new("Author", "a1", Default::default());
        assert!(matches!(
            book.encode(&record),
            Err(DataStoreError::ValidationError(_))
        ));

        let author = RecordType::synthesize(&Entity::new("Author"));
        let bytes = author.encode(&record).unwrap();
        assert!(matches!(book.decode(&bytes), Err(DataStoreError::Codec(_))));
        assert_eq!(author.decode(&bytes).unwrap(), record);
    }
}
