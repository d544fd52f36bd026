//! Record types and their flattened schemas
//!
//! A [`RecordType`] is composed once by a [`RecordTypeBuilder`]: the
//! schemas of its bases are merged left to right, then the type's own
//! field declarations are applied. Later entries win; an overridden name
//! keeps the position where it first appeared.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Result, SchemaError};
use crate::field::FieldSpec;
use crate::record::{Record, RESERVED_PREFIX};

/// Flattened, insertion-ordered mapping from field name to [`FieldSpec`]
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<(String, Arc<FieldSpec>)>,
    index: HashMap<String, usize>,
}

impl Schema {
    fn insert(&mut self, name: &str, spec: Arc<FieldSpec>) {
        match self.index.get(name) {
            Some(&pos) => self.entries[pos].1 = spec,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), spec));
            }
        }
    }

    /// The spec declared for `name`
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.get_shared(name).map(Arc::as_ref)
    }

    /// The shared spec handle; two schemas holding the same declaration
    /// return pointer-equal handles.
    pub fn get_shared(&self, name: &str) -> Option<&Arc<FieldSpec>> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Whether `name` is declared
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names, in schema order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Field names and specs, in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.entries
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.as_ref()))
    }

    /// JSON description of every field, in schema order
    pub fn describe(&self) -> serde_json::Value {
        let fields = self
            .iter()
            .map(|(name, spec)| (name.to_string(), spec.describe()))
            .collect();
        serde_json::Value::Object(fields)
    }
}

struct RecordTypeInner {
    name: String,
    bases: Vec<RecordType>,
    schema: Schema,
}

/// Handle to a composed record type.
///
/// Cloning is cheap; equality is identity of the composed definition,
/// so two separately built types with the same name are distinct.
#[derive(Clone)]
pub struct RecordType(Arc<RecordTypeInner>);

impl RecordType {
    /// Start declaring a record type
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }

    /// The type's declared name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct bases, in declaration order
    pub fn bases(&self) -> &[RecordType] {
        &self.0.bases
    }

    /// The flattened, read-only schema shared by every instance
    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// True if `self` is `other` or inherits from it, directly or not
    pub fn is_subtype_of(&self, other: &RecordType) -> bool {
        self == other || self.bases().iter().any(|base| base.is_subtype_of(other))
    }

    /// A new record of this type with no fields assigned
    pub fn instantiate(&self) -> Record {
        Record::new(self)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.0.name)
            .field("fields", &self.0.schema.names().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

fn identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"))
}

/// Collects the declaration of a record type before it is composed
#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
    name: String,
    bases: Vec<RecordType>,
    fields: Vec<(String, FieldSpec)>,
}

impl RecordTypeBuilder {
    /// An empty declaration of a type called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Name of the type being declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a base; bases listed later override earlier ones
    pub fn extends(mut self, base: &RecordType) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Declare a field on this type
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Compose the effective schema and freeze the type
    pub fn build(self) -> Result<RecordType> {
        if !identifier().is_match(&self.name) {
            return Err(SchemaError::Configuration(format!(
                "'{}' is not a valid record type name",
                self.name
            )));
        }

        let mut schema = Schema::default();
        for base in &self.bases {
            for (name, spec) in &base.schema().entries {
                schema.insert(name, Arc::clone(spec));
            }
        }

        for (name, spec) in self.fields {
            if !identifier().is_match(&name) {
                return Err(SchemaError::Configuration(format!(
                    "'{}' is not a valid field name on {}",
                    name, self.name
                )));
            }
            if name.starts_with(RESERVED_PREFIX) {
                return Err(SchemaError::Configuration(format!(
                    "field '{}' on {} uses the reserved prefix '{}'",
                    name, self.name, RESERVED_PREFIX
                )));
            }
            schema.insert(&name, Arc::new(spec));
        }

        tracing::debug!(
            record = %self.name,
            bases = self.bases.len(),
            fields = schema.len(),
            "composed record type"
        );

        Ok(RecordType(Arc::new(RecordTypeInner {
            name: self.name,
            bases: self.bases,
            schema,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DataType, Primitive};

    fn int() -> FieldSpec {
        FieldSpec::of(Primitive::Int).unwrap()
    }

    fn string() -> FieldSpec {
        FieldSpec::of(Primitive::Str).unwrap()
    }

    #[test]
    fn test_later_base_wins() {
        let b1 = RecordType::builder("B1").field("a", int()).build().unwrap();
        let b2 = RecordType::builder("B2").field("a", string()).build().unwrap();

        let c = RecordType::builder("C").extends(&b1).extends(&b2).build().unwrap();
        assert_eq!(c.schema().len(), 1);
        assert!(Arc::ptr_eq(
            c.schema().get_shared("a").unwrap(),
            b2.schema().get_shared("a").unwrap()
        ));

        let d = RecordType::builder("D").extends(&b2).extends(&b1).build().unwrap();
        assert_eq!(
            d.schema().get("a").unwrap().data_type(),
            &DataType::Primitive(Primitive::Int)
        );
    }

    #[test]
    fn test_own_declaration_overrides_in_place() {
        let base = RecordType::builder("Base")
            .field("id", int())
            .field("name", string())
            .build()
            .unwrap();
        let child = RecordType::builder("Child")
            .extends(&base)
            .field("id", string())
            .field("extra", int())
            .build()
            .unwrap();

        assert_eq!(child.schema().names().collect::<Vec<_>>(), ["id", "name", "extra"]);
        assert_eq!(
            child.schema().get("id").unwrap().data_type(),
            &DataType::Primitive(Primitive::Str)
        );
        // The base is untouched.
        assert_eq!(
            base.schema().get("id").unwrap().data_type(),
            &DataType::Primitive(Primitive::Int)
        );
    }

    #[test]
    fn test_subtype_relation() {
        let a = RecordType::builder("A").build().unwrap();
        let b = RecordType::builder("B").extends(&a).build().unwrap();
        let c = RecordType::builder("C").extends(&b).build().unwrap();
        let other = RecordType::builder("A").build().unwrap();

        assert!(c.is_subtype_of(&a));
        assert!(a.is_subtype_of(&a));
        assert!(!a.is_subtype_of(&c));
        assert!(!c.is_subtype_of(&other));
        assert_ne!(a, other);
    }

    #[test]
    fn test_reserved_and_invalid_names_rejected() {
        let reserved = RecordType::builder("R").field("_values", int()).build();
        assert!(matches!(reserved, Err(SchemaError::Configuration(_))));

        let bad_field = RecordType::builder("R").field("two words", int()).build();
        assert!(matches!(bad_field, Err(SchemaError::Configuration(_))));

        let bad_type = RecordType::builder("9lives").build();
        assert!(matches!(bad_type, Err(SchemaError::Configuration(_))));
    }
}
