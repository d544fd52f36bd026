//! Field descriptors: the declared data type of a field and, for
//! containers, the type every element must have.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::schema::RecordType;
use crate::value::FieldValue;

/// Built-in value types a field may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// UTF-8 text
    Str,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Free-form plain mapping, stored as-is
    Dict,
    /// Ordered sequence; requires a child type
    List,
}

/// Types that hold elements and therefore require a child type
pub const CONTAINER_TYPES: &[Primitive] = &[Primitive::List];

/// String-like types, matched by category rather than exact type
pub const CHAR_TYPES: &[Primitive] = &[Primitive::Str];

impl Primitive {
    /// All primitives, in declaration order
    pub const ALL: [Primitive; 6] = [
        Primitive::Str,
        Primitive::Int,
        Primitive::Float,
        Primitive::Bool,
        Primitive::Dict,
        Primitive::List,
    ];

    /// Name used in definition files and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Str => "str",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Dict => "dict",
            Primitive::List => "list",
        }
    }

    /// Look up a primitive by its definition-file name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Whether this primitive is one of [`CONTAINER_TYPES`]
    pub fn is_container(&self) -> bool {
        CONTAINER_TYPES.contains(self)
    }

    /// Whether this primitive is string-like
    pub fn is_char(&self) -> bool {
        CHAR_TYPES.contains(self)
    }

    fn accepts(&self, value: &FieldValue) -> bool {
        if self.is_char() {
            return matches!(value, FieldValue::Str(_));
        }
        matches!(
            (self, value),
            (Primitive::Int, FieldValue::Int(_))
                | (Primitive::Float, FieldValue::Float(_))
                | (Primitive::Bool, FieldValue::Bool(_))
                | (Primitive::Dict, FieldValue::Dict(_))
                | (Primitive::List, FieldValue::List(_))
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The declared type of a field or of a container's elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Primitive(Primitive),
    Record(RecordType),
}

impl DataType {
    /// Primitive or record type name
    pub fn name(&self) -> &str {
        match self {
            DataType::Primitive(p) => p.name(),
            DataType::Record(t) => t.name(),
        }
    }

    /// Whether values of this type hold elements
    pub fn is_container(&self) -> bool {
        matches!(self, DataType::Primitive(p) if p.is_container())
    }

    /// The record type, if this is one
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            DataType::Record(t) => Some(t),
            DataType::Primitive(_) => None,
        }
    }

    /// Whether `value` may be stored under this type.
    ///
    /// Record types match by subtype relation, strings by category and
    /// everything else by exact variant. No coercion is attempted.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (DataType::Primitive(p), value) => p.accepts(value),
            (DataType::Record(expected), FieldValue::Record(record)) => {
                record.record_type().is_subtype_of(expected)
            }
            (DataType::Record(_), _) => false,
        }
    }
}

impl From<Primitive> for DataType {
    fn from(p: Primitive) -> Self {
        DataType::Primitive(p)
    }
}

impl From<RecordType> for DataType {
    fn from(t: RecordType) -> Self {
        DataType::Record(t)
    }
}

impl From<&RecordType> for DataType {
    fn from(t: &RecordType) -> Self {
        DataType::Record(t.clone())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable declaration of a field's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    data_type: DataType,
    child_type: Option<DataType>,
}

impl FieldSpec {
    /// Create a field spec, rejecting every inconsistent combination.
    ///
    /// `child_type` must be given exactly when `data_type` is one of
    /// [`CONTAINER_TYPES`].
    pub fn new(data_type: Option<DataType>, child_type: Option<DataType>) -> Result<Self> {
        match (data_type, child_type) {
            (None, None) => Err(SchemaError::Configuration(
                "a field must declare at least a data type".into(),
            )),
            (None, Some(child)) => Err(SchemaError::Configuration(format!(
                "child type {} given without a data type",
                child
            ))),
            (Some(data_type), None) if data_type.is_container() => {
                Err(SchemaError::Configuration(format!(
                    "data type {} is a container and requires a child type",
                    data_type
                )))
            }
            (Some(data_type), Some(child)) if !data_type.is_container() => {
                Err(SchemaError::Configuration(format!(
                    "child type {} is only allowed for container types {:?}, not {}",
                    child,
                    CONTAINER_TYPES.iter().map(Primitive::name).collect::<Vec<_>>(),
                    data_type
                )))
            }
            (Some(data_type), child_type) => Ok(Self {
                data_type,
                child_type,
            }),
        }
    }

    /// Non-container field of the given type
    pub fn of(data_type: impl Into<DataType>) -> Result<Self> {
        Self::new(Some(data_type.into()), None)
    }

    /// List field whose elements must match `child_type`
    pub fn list_of(child_type: impl Into<DataType>) -> Self {
        Self {
            data_type: DataType::Primitive(Primitive::List),
            child_type: Some(child_type.into()),
        }
    }

    /// Declared type of the field's value
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Declared element type; set only for containers
    pub fn child_type(&self) -> Option<&DataType> {
        self.child_type.as_ref()
    }

    /// Whether the field holds a list
    pub fn is_container(&self) -> bool {
        self.data_type.is_container()
    }

    /// JSON description used by the CLI
    pub fn describe(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert("type".into(), self.data_type.name().into());
        if let Some(child) = &self.child_type {
            out.insert("child".into(), child.name().into());
        }
        serde_json::Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_specs_read_back() {
        let scalar = FieldSpec::of(Primitive::Int).unwrap();
        assert_eq!(scalar.data_type(), &DataType::Primitive(Primitive::Int));
        assert!(scalar.child_type().is_none());

        let list = FieldSpec::new(
            Some(Primitive::List.into()),
            Some(Primitive::Str.into()),
        )
        .unwrap();
        assert_eq!(list.data_type(), &DataType::Primitive(Primitive::List));
        assert_eq!(list.child_type(), Some(&DataType::Primitive(Primitive::Str)));
        assert_eq!(list, FieldSpec::list_of(Primitive::Str));
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let cases: [(Option<DataType>, Option<DataType>); 4] = [
            (None, None),
            (None, Some(Primitive::Str.into())),
            (Some(Primitive::List.into()), None),
            (Some(Primitive::Int.into()), Some(Primitive::Str.into())),
        ];
        for (data_type, child_type) in cases {
            let result = FieldSpec::new(data_type, child_type);
            assert!(matches!(result, Err(SchemaError::Configuration(_))));
        }
    }

    #[test]
    fn test_primitive_names() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("Address"), None);
        assert!(Primitive::List.is_container());
        assert!(!Primitive::Dict.is_container());
    }

    #[test]
    fn test_no_numeric_coercion() {
        let float = DataType::Primitive(Primitive::Float);
        assert!(float.accepts(&FieldValue::Float(1.5)));
        assert!(!float.accepts(&FieldValue::Int(1)));
        let int = DataType::Primitive(Primitive::Int);
        assert!(!int.accepts(&FieldValue::Bool(true)));
    }
}
