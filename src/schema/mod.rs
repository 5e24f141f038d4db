//! Runtime schema machinery: the registry of schema definitions, the
//! cache of synthesized record types, and the builder that validates
//! untyped input against a record type.

pub mod builder;
pub mod record_type;
pub mod registry;
pub mod synthesizer;

pub use builder::{RecordBuilder, UnknownAttributes};
pub use record_type::{RecordType, RecordTypeHandle};
pub use registry::SchemaRegistry;
pub use synthesizer::{TypeCache, TypeSynthesizer};
