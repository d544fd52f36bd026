//! Schema Registry
//!
//! Keeps composed record types by name and loads declarative record
//! definitions from TOML.
//!
//! ```toml
//! [[record]]
//! name = "Named"
//!
//! [[record.field]]
//! name = "name"
//! type = "str"
//!
//! [[record]]
//! name = "Person"
//! bases = ["Named"]
//!
//! [[record.field]]
//! name = "tags"
//! type = "list"
//! child = "str"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SchemaError};
use crate::field::{DataType, FieldSpec, Primitive};
use crate::schema::{RecordType, RecordTypeBuilder};

/// A file of record declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default, rename = "record")]
    pub records: Vec<RecordDef>,
}

/// Declaration of one record type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDef {
    pub name: String,
    /// Base types, earliest first; later bases override earlier ones
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDef>,
}

/// Declaration of one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
}

impl Definitions {
    /// Parse definitions from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Named record types, in registration order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, RecordType>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the type declared by `builder` and register it under its name.
    ///
    /// Primitive names (`str`, `int`, ...) are rejected: a record type
    /// registered under one could never be referenced by name.
    pub fn register(&mut self, builder: RecordTypeBuilder) -> Result<RecordType> {
        if Primitive::from_name(builder.name()).is_some() {
            return Err(SchemaError::Configuration(format!(
                "record type name '{}' is reserved for a primitive type",
                builder.name()
            )));
        }
        if self.types.contains_key(builder.name()) {
            return Err(SchemaError::DuplicateType(builder.name().to_string()));
        }
        let record_type = builder.build()?;
        let name = record_type.name().to_string();

        tracing::debug!(record = %name, fields = record_type.schema().len(), "registered record type");

        self.types.insert(name.clone(), record_type.clone());
        self.order.push(name);
        Ok(record_type)
    }

    /// The record type registered under `name`
    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.types.get(name)
    }

    /// Like [`get`](Self::get) but fails with `UnknownType`
    pub fn require(&self, name: &str) -> Result<&RecordType> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Registered type names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// A primitive name (`str`, `int`, ...) or a registered record type
    pub fn resolve_data_type(&self, name: &str) -> Result<DataType> {
        match Primitive::from_name(name) {
            Some(p) => Ok(DataType::Primitive(p)),
            None => self.require(name).map(DataType::from),
        }
    }

    /// Register every record in `definitions`, in order.
    ///
    /// Bases and record-typed fields must name types registered earlier.
    /// The load is all or nothing: records are staged on a copy of the
    /// registry and committed only once every one of them has built.
    /// Returns the newly registered types.
    pub fn load_definitions(&mut self, definitions: &Definitions) -> Result<Vec<RecordType>> {
        let mut staged = self.clone();
        let loaded = staged.stage_definitions(definitions)?;
        *self = staged;
        Ok(loaded)
    }

    fn stage_definitions(&mut self, definitions: &Definitions) -> Result<Vec<RecordType>> {
        let mut loaded = Vec::with_capacity(definitions.records.len());
        for def in &definitions.records {
            let mut builder = RecordType::builder(&def.name);
            for base in &def.bases {
                builder = builder.extends(self.require(base)?);
            }
            for field in &def.fields {
                let data_type = field
                    .data_type
                    .as_deref()
                    .map(|name| self.resolve_data_type(name))
                    .transpose()?;
                let child_type = field
                    .child
                    .as_deref()
                    .map(|name| self.resolve_data_type(name))
                    .transpose()?;
                let spec = FieldSpec::new(data_type, child_type).map_err(|e| match e {
                    SchemaError::Configuration(msg) => SchemaError::Configuration(format!(
                        "{}.{}: {}",
                        def.name, field.name, msg
                    )),
                    other => other,
                })?;
                builder = builder.field(&field.name, spec);
            }
            loaded.push(self.register(builder)?);
        }
        Ok(loaded)
    }

    /// Load definitions from TOML text
    pub fn load_str(&mut self, content: &str) -> Result<Vec<RecordType>> {
        let definitions = Definitions::from_toml(content)?;
        self.load_definitions(&definitions)
    }

    /// Load definitions from a TOML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<RecordType>> {
        let content = fs::read_to_string(path)?;
        self.load_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITIONS: &str = r#"
[[record]]
name = "Named"

[[record.field]]
name = "name"
type = "str"

[[record]]
name = "Address"

[[record.field]]
name = "city"
type = "str"

[[record]]
name = "Person"
bases = ["Named"]

[[record.field]]
name = "home"
type = "Address"

[[record.field]]
name = "tags"
type = "list"
child = "str"
"#;

    #[test]
    fn test_load_definitions() {
        let mut registry = SchemaRegistry::new();
        let loaded = registry.load_str(DEFINITIONS).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Named", "Address", "Person"]);

        let person = registry.require("Person").unwrap();
        assert_eq!(person.schema().names().collect::<Vec<_>>(), ["name", "home", "tags"]);
        assert!(person.is_subtype_of(registry.get("Named").unwrap()));
        assert_eq!(
            person.schema().get("home").unwrap().data_type(),
            &DataType::Record(registry.get("Address").unwrap().clone())
        );
    }

    #[test]
    fn test_duplicate_and_unknown_types() {
        let mut registry = SchemaRegistry::new();
        registry.load_str(DEFINITIONS).unwrap();

        let again = registry.register(RecordType::builder("Person"));
        assert!(matches!(again, Err(SchemaError::DuplicateType(_))));

        let missing_base = registry.load_str("[[record]]\nname = \"X\"\nbases = [\"Nope\"]\n");
        assert!(matches!(missing_base, Err(SchemaError::UnknownType(_))));
        assert!(registry.get("X").is_none());
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let broken = r#"
[[record]]
name = "A"

[[record.field]]
name = "f"
type = "str"

[[record]]
name = "B"

[[record.field]]
name = "g"
type = "list"
"#;
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.load_str(broken),
            Err(SchemaError::Configuration(_))
        ));
        assert!(registry.is_empty());
        assert!(registry.get("A").is_none());

        let fixed = format!("{}child = \"str\"\n", broken);
        let loaded = registry.load_str(&fixed).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn test_failed_load_keeps_earlier_types() {
        let mut registry = SchemaRegistry::new();
        registry.load_str(DEFINITIONS).unwrap();

        let clashing = "[[record]]\nname = \"Extra\"\n\n[[record]]\nname = \"Person\"\n";
        assert!(matches!(
            registry.load_str(clashing),
            Err(SchemaError::DuplicateType(ref name)) if name == "Person"
        ));
        assert_eq!(registry.len(), 3);
        assert!(registry.get("Extra").is_none());
    }

    #[test]
    fn test_primitive_names_rejected_as_record_names() {
        let mut registry = SchemaRegistry::new();
        for name in ["str", "int", "list"] {
            assert!(matches!(
                registry.register(RecordType::builder(name)),
                Err(SchemaError::Configuration(_))
            ));
        }
        assert!(matches!(
            registry.load_str("[[record]]\nname = \"dict\"\n"),
            Err(SchemaError::Configuration(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_field_declarations() {
        let cases = [
            "[[record]]\nname = \"A\"\n[[record.field]]\nname = \"f\"\n",
            "[[record]]\nname = \"A\"\n[[record.field]]\nname = \"f\"\nchild = \"str\"\n",
            "[[record]]\nname = \"A\"\n[[record.field]]\nname = \"f\"\ntype = \"list\"\n",
            "[[record]]\nname = \"A\"\n[[record.field]]\nname = \"f\"\ntype = \"int\"\nchild = \"str\"\n",
        ];
        for case in cases {
            let mut registry = SchemaRegistry::new();
            let result = registry.load_str(case);
            assert!(
                matches!(result, Err(SchemaError::Configuration(ref msg)) if msg.starts_with("A.f")),
                "unexpected result for {:?}: {:?}",
                case,
                result
            );
        }
    }
}
