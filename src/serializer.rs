//! Conversion between records and plain JSON mappings
//!
//! [`dumps`] is total over the schema: every declared field appears in the
//! output, and a field that was never assigned is filled with the zero
//! value of its type. Zero values come from an explicit [`ZeroTable`]
//! keyed by primitive; record-typed fields always zero to `{}`.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Result, SchemaError};
use crate::field::{DataType, Primitive};
use crate::record::Record;
use crate::schema::RecordType;
use crate::value::FieldValue;

/// Zero value per primitive type
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroTable {
    zeros: HashMap<Primitive, Value>,
}

impl ZeroTable {
    /// The canonical zeros: `""`, `0`, `0.0`, `false`, `{}` and `[]`
    pub fn canonical() -> Self {
        let zeros = Primitive::ALL
            .into_iter()
            .map(|p| {
                let zero = match p {
                    Primitive::Str => Value::String(String::new()),
                    Primitive::Int => Value::from(0i64),
                    Primitive::Float => Value::from(0.0f64),
                    Primitive::Bool => Value::Bool(false),
                    Primitive::Dict => Value::Object(Map::new()),
                    Primitive::List => Value::Array(Vec::new()),
                };
                (p, zero)
            })
            .collect();
        Self { zeros }
    }

    /// Register the zero for `primitive`, returning the one it replaces
    pub fn register(&mut self, primitive: Primitive, zero: Value) -> Option<Value> {
        self.zeros.insert(primitive, zero)
    }

    /// The registered zero for `primitive`
    pub fn get(&self, primitive: Primitive) -> Option<&Value> {
        self.zeros.get(&primitive)
    }

    /// Zero value for a field of `data_type`
    pub fn zero_for(&self, data_type: &DataType) -> Value {
        match data_type {
            DataType::Record(_) => Value::Object(Map::new()),
            DataType::Primitive(p) => self.zeros.get(p).cloned().unwrap_or(Value::Null),
        }
    }
}

impl Default for ZeroTable {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Converts records to and from plain mappings
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    zeros: ZeroTable,
}

impl Serializer {
    /// Serializer using the canonical zero table
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer using a custom zero table
    pub fn with_zero_table(zeros: ZeroTable) -> Self {
        Self { zeros }
    }

    /// The zero table in use
    pub fn zero_table(&self) -> &ZeroTable {
        &self.zeros
    }

    /// Plain mapping holding every schema field, in schema order.
    ///
    /// Nested records and lists of records are expanded recursively;
    /// each call builds fresh mappings.
    pub fn dumps(&self, record: &Record) -> Map<String, Value> {
        record
            .schema()
            .iter()
            .map(|(name, spec)| {
                let value = match record.value(name) {
                    None => self.zeros.zero_for(spec.data_type()),
                    Some(value) => self.to_json(value),
                };
                (name.to_string(), value)
            })
            .collect()
    }

    /// [`dumps`](Self::dumps) for a value that must hold a record
    pub fn dumps_value(&self, item: &FieldValue) -> Result<Map<String, Value>> {
        match item {
            FieldValue::Record(record) => Ok(self.dumps(record)),
            other => Err(SchemaError::type_mismatch(
                "$item",
                other.to_string(),
                other.type_name(),
                "record",
            )),
        }
    }

    /// JSON form of a single assigned value
    pub fn to_json(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(x) => Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Dict(map) => Value::Object(map.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(|v| self.to_json(v)).collect()),
            FieldValue::Record(record) => Value::Object(self.dumps(record)),
        }
    }

    /// Build a record of `record_type` from a plain mapping.
    ///
    /// Values are checked like [`Record::set`]: scalar mismatches fail,
    /// list elements that cannot be loaded are logged and dropped.
    pub fn loads(&self, record_type: &RecordType, data: &Map<String, Value>) -> Result<Record> {
        let mut record = Record::new(record_type);
        for (name, raw) in data {
            let spec = record_type
                .schema()
                .get(name)
                .ok_or_else(|| SchemaError::unknown_field(record_type.name(), name.as_str()))?;

            let value = match spec.child_type() {
                Some(child) if spec.is_container() => {
                    let items = raw
                        .as_array()
                        .ok_or_else(|| json_mismatch(name, raw, spec.data_type()))?;
                    FieldValue::List(
                        items
                            .iter()
                            .filter_map(|item| match self.load_value(name, child, item) {
                                Ok(value) => Some(value),
                                Err(e) => {
                                    tracing::warn!(field = %name, error = %e, "dropping unloadable list element");
                                    None
                                }
                            })
                            .collect(),
                    )
                }
                _ => self.load_value(name, spec.data_type(), raw)?,
            };
            record.set(name, value)?;
        }
        Ok(record)
    }

    /// [`loads`](Self::loads) from JSON text holding an object
    pub fn loads_json(&self, record_type: &RecordType, text: &str) -> Result<Record> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(data) => self.loads(record_type, &data),
            other => Err(SchemaError::type_mismatch(
                "$item",
                other.to_string(),
                json_type_name(&other),
                record_type.name(),
            )),
        }
    }

    fn load_value(&self, field: &str, data_type: &DataType, raw: &Value) -> Result<FieldValue> {
        let loaded = match (data_type, raw) {
            (DataType::Record(t), Value::Object(obj)) => Some(FieldValue::Record(self.loads(t, obj)?)),
            (DataType::Record(_), _) => None,
            (DataType::Primitive(Primitive::Str), Value::String(s)) => Some(FieldValue::Str(s.clone())),
            (DataType::Primitive(Primitive::Int), Value::Number(n)) => n.as_i64().map(FieldValue::Int),
            (DataType::Primitive(Primitive::Float), Value::Number(n)) if n.is_f64() => {
                n.as_f64().map(FieldValue::Float)
            }
            (DataType::Primitive(Primitive::Bool), Value::Bool(b)) => Some(FieldValue::Bool(*b)),
            (DataType::Primitive(Primitive::Dict), Value::Object(obj)) => Some(FieldValue::Dict(obj.clone())),
            (DataType::Primitive(Primitive::List), Value::Array(_)) => untyped(raw),
            _ => None,
        };
        loaded.ok_or_else(|| json_mismatch(field, raw, data_type))
    }
}

/// Structural conversion for the contents of nested lists
fn untyped(raw: &Value) -> Option<FieldValue> {
    match raw {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(FieldValue::Int(i)),
            None => n.as_f64().map(FieldValue::Float),
        },
        Value::String(s) => Some(FieldValue::Str(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(untyped)
            .collect::<Option<Vec<_>>>()
            .map(FieldValue::List),
        Value::Object(obj) => Some(FieldValue::Dict(obj.clone())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn json_mismatch(field: &str, raw: &Value, expected: &DataType) -> SchemaError {
    SchemaError::type_mismatch(field, raw.to_string(), json_type_name(raw), expected.name())
}

fn default_serializer() -> &'static Serializer {
    static DEFAULT: OnceLock<Serializer> = OnceLock::new();
    DEFAULT.get_or_init(Serializer::new)
}

/// Total plain mapping of `record` using the canonical zero table
pub fn dumps(record: &Record) -> Map<String, Value> {
    default_serializer().dumps(record)
}

/// [`dumps`] for a dynamically typed value; fails unless it holds a record
pub fn dumps_value(item: &FieldValue) -> Result<Map<String, Value>> {
    default_serializer().dumps_value(item)
}

/// Load a record of `record_type` from a plain mapping
pub fn loads(record_type: &RecordType, data: &Map<String, Value>) -> Result<Record> {
    default_serializer().loads(record_type, data)
}
