//! Schema-checked, dictionary-like records
//!
//! Every write goes through [`Record::set`], which checks the value
//! against the field's declared type once, at write time. Scalar and
//! record fields reject a mismatching value outright. List fields are
//! lenient: elements that do not match the child type are logged and
//! dropped, and the rest are stored.

use std::collections::HashMap;
use std::ops::Index;

use crate::error::{Result, SchemaError};
use crate::field::DataType;
use crate::schema::{RecordType, Schema};
use crate::value::FieldValue;

/// Names starting with this prefix are unvalidated instance state
pub const RESERVED_PREFIX: &str = "_";

/// An instance of a [`RecordType`]
#[derive(Debug, Clone)]
pub struct Record {
    record_type: RecordType,
    /// Assigned fields, in assignment order
    values: Vec<(String, FieldValue)>,
    /// Reserved-prefix state; never part of the record's content
    state: HashMap<String, FieldValue>,
}

impl Record {
    /// A record with no fields assigned
    pub fn new(record_type: &RecordType) -> Self {
        Self {
            record_type: record_type.clone(),
            values: Vec::new(),
            state: HashMap::new(),
        }
    }

    /// A record initialised from `(name, value)` pairs, each checked as by [`set`](Self::set)
    pub fn from_values<I, K, V>(record_type: &RecordType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut record = Self::new(record_type);
        record.update(values)?;
        Ok(record)
    }

    /// The type this record was created from
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// The schema of the record's type
    pub fn schema(&self) -> &Schema {
        self.record_type.schema()
    }

    /// The value assigned to `name`.
    ///
    /// Fails with `UnknownField` if the schema does not declare `name` and
    /// with `FieldNotSet` if it does but nothing was assigned yet.
    pub fn get(&self, name: &str) -> Result<&FieldValue> {
        if name.starts_with(RESERVED_PREFIX) {
            return self
                .state
                .get(name)
                .ok_or_else(|| SchemaError::unknown_field(self.record_type.name(), name));
        }
        if !self.schema().contains(name) {
            return Err(SchemaError::unknown_field(self.record_type.name(), name));
        }
        self.position(name)
            .map(|pos| &self.values[pos].1)
            .ok_or_else(|| SchemaError::FieldNotSet {
                record: self.record_type.name().to_string(),
                field: name.to_string(),
            })
    }

    /// Like [`get`](Self::get) but `None` for unknown or unset fields
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).ok()
    }

    /// Assign `value` to `name` after checking it against the schema
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        if name.starts_with(RESERVED_PREFIX) {
            self.state.insert(name.to_string(), value);
            return Ok(());
        }

        let spec = self
            .schema()
            .get_shared(name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_field(self.record_type.name(), name))?;

        let stored = match spec.child_type() {
            Some(child) if spec.is_container() => match value {
                FieldValue::List(items) => FieldValue::List(filter_elements(name, child, items)),
                other => return Err(mismatch(name, &other, spec.data_type())),
            },
            _ if spec.data_type().accepts(&value) => value,
            _ => return Err(mismatch(name, &value, spec.data_type())),
        };

        match self.position(name) {
            Some(pos) => self.values[pos].1 = stored,
            None => self.values.push((name.to_string(), stored)),
        }
        Ok(())
    }

    /// Unassign `name`, returning the previous value if there was one
    pub fn remove(&mut self, name: &str) -> Result<Option<FieldValue>> {
        if name.starts_with(RESERVED_PREFIX) {
            return Ok(self.state.remove(name));
        }
        if !self.schema().contains(name) {
            return Err(SchemaError::unknown_field(self.record_type.name(), name));
        }
        Ok(self.position(name).map(|pos| self.values.remove(pos).1))
    }

    /// Assign every pair in order, stopping at the first error
    pub fn update<I, K, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Whether `name` currently holds an assigned value
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Assigned field names, in assignment order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// Assigned values, in assignment order
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter().map(|(_, value)| value)
    }

    /// Assigned `(name, value)` pairs, in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of assigned fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field is assigned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A new record of the same type holding only the assigned fields
    pub fn copy(&self) -> Self {
        Self {
            record_type: self.record_type.clone(),
            values: self.values.clone(),
            state: HashMap::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|(key, _)| key == name)
    }
}

fn mismatch(field: &str, value: &FieldValue, expected: &DataType) -> SchemaError {
    SchemaError::type_mismatch(field, value.to_string(), value.type_name(), expected.name())
}

fn filter_elements(field: &str, child: &DataType, items: Vec<FieldValue>) -> Vec<FieldValue> {
    items
        .into_iter()
        .filter(|item| {
            let keep = child.accepts(item);
            if !keep {
                tracing::warn!(
                    field,
                    value = %item,
                    actual = item.type_name(),
                    expected = child.name(),
                    "dropping invalid list element"
                );
            }
            keep
        })
        .collect()
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.record_type == other.record_type
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(name, value)| other.value(name) == Some(value))
    }
}

impl Index<&str> for Record {
    type Output = FieldValue;

    /// Panics if `name` is unknown or unset; use [`Record::get`] to handle that.
    fn index(&self, name: &str) -> &FieldValue {
        match self.get(name) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a FieldValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a FieldValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldSpec, Primitive};

    fn inner_type() -> RecordType {
        RecordType::builder("Inner")
            .field("label", FieldSpec::of(Primitive::Str).unwrap())
            .build()
            .unwrap()
    }

    fn outer_type(inner: &RecordType) -> RecordType {
        RecordType::builder("Outer")
            .field("name", FieldSpec::of(Primitive::Str).unwrap())
            .field("count", FieldSpec::of(Primitive::Int).unwrap())
            .field("tags", FieldSpec::list_of(Primitive::Str))
            .field("inner", FieldSpec::of(inner).unwrap())
            .field("children", FieldSpec::list_of(inner))
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);
        record.set("name", "widget").unwrap();
        record.set("count", 3).unwrap();

        assert_eq!(record.get("name").unwrap(), &FieldValue::from("widget"));
        assert_eq!(record["count"], FieldValue::Int(3));
        assert_eq!(record.keys().collect::<Vec<_>>(), ["name", "count"]);
        assert_eq!(record.len(), 2);

        record.set("name", "gadget").unwrap();
        assert_eq!(record.get("name").unwrap().as_str(), Some("gadget"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_unknown_and_unset_fields() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);

        assert!(matches!(
            record.set("nonexistent", 1),
            Err(SchemaError::UnknownField { .. })
        ));
        assert!(matches!(
            record.get("nonexistent"),
            Err(SchemaError::UnknownField { .. })
        ));
        assert!(matches!(record.get("name"), Err(SchemaError::FieldNotSet { .. })));
        assert!(record.value("name").is_none());
    }

    #[test]
    fn test_type_mismatch_names_everything() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);

        let err = record.set("inner", 42).unwrap_err();
        match &err {
            SchemaError::TypeMismatch {
                field,
                value,
                actual,
                expected,
            } => {
                assert_eq!(field, "inner");
                assert_eq!(value, "42");
                assert_eq!(actual, "int");
                assert_eq!(expected, "Inner");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("inner") && message.contains("42") && message.contains("Inner"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_list_elements_are_filtered() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);

        record
            .set("tags", vec![FieldValue::from("ok"), FieldValue::from(123)])
            .unwrap();
        assert_eq!(record["tags"], FieldValue::List(vec![FieldValue::from("ok")]));

        // A non-sequence is still rejected as a whole.
        assert!(matches!(
            record.set("tags", "ok"),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_record_fields_accept_subtypes() {
        let inner = inner_type();
        let outer = outer_type(&inner);
        let special = RecordType::builder("SpecialInner")
            .extends(&inner)
            .field("weight", FieldSpec::of(Primitive::Float).unwrap())
            .build()
            .unwrap();
        let unrelated = RecordType::builder("Inner").build().unwrap();

        let mut record = Record::new(&outer);
        record.set("inner", special.instantiate()).unwrap();
        assert!(record.set("inner", unrelated.instantiate()).is_err());

        record
            .set(
                "children",
                vec![
                    inner.instantiate(),
                    special.instantiate(),
                    unrelated.instantiate(),
                ],
            )
            .unwrap();
        assert_eq!(record["children"].as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_equality_and_copy() {
        let outer = outer_type(&inner_type());
        let a = Record::from_values(&outer, [("name", "x"), ("tags", "y")]);
        assert!(a.is_err());

        let mut a = Record::from_values(&outer, [("count", 1)]).unwrap();
        a.set("name", "x").unwrap();
        let mut b = Record::new(&outer);
        b.set("name", "x").unwrap();
        b.set("count", 1).unwrap();
        assert_eq!(a, b);

        let copy = a.copy();
        assert_eq!(copy, a);
        b.set("count", 2).unwrap();
        assert_ne!(a, b);

        let other_type = RecordType::builder("Outer")
            .field("name", FieldSpec::of(Primitive::Str).unwrap())
            .build()
            .unwrap();
        let mut c = Record::new(&other_type);
        c.set("name", "x").unwrap();
        let mut d = Record::new(&outer);
        d.set("name", "x").unwrap();
        assert_ne!(c, d);
    }

    #[test]
    fn test_reserved_names_bypass_schema() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);
        record.set("_origin", "import").unwrap();
        record.set("name", "x").unwrap();

        assert_eq!(record.get("_origin").unwrap().as_str(), Some("import"));
        assert_eq!(record.keys().collect::<Vec<_>>(), ["name"]);
        assert!(record.copy().get("_origin").is_err());
        assert!(matches!(
            record.get("_missing"),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let outer = outer_type(&inner_type());
        let mut record = Record::new(&outer);
        record.set("count", 7).unwrap();

        assert_eq!(record.remove("count").unwrap(), Some(FieldValue::Int(7)));
        assert_eq!(record.remove("count").unwrap(), None);
        assert!(record.remove("nonexistent").is_err());
        assert!(!record.contains("count"));
    }
}
