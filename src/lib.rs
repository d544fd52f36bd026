//! Schema Items
//!
//! Schema-typed, dictionary-like records. A record type declares its fields
//! once, inheriting the fields of its bases; every write to a record is
//! checked against that schema, and any record can be dumped to a plain
//! JSON mapping that covers the whole schema.
//!
//! ## Features
//!
//! - **Composed Schemas**: Base schemas merge left to right, the type's own fields last
//! - **Checked Writes**: Scalar and record fields reject values of the wrong type
//! - **Lenient Lists**: List elements of the wrong type are logged and dropped
//! - **Total Dumps**: Unset fields appear with the zero value of their type
//! - **Declarative Types**: Record types can be loaded from TOML definitions
//!
//! ## Example
//!
//! ```
//! use schema_items::{dumps, FieldSpec, Primitive, RecordType};
//!
//! let address = RecordType::builder("Address")
//!     .field("city", FieldSpec::of(Primitive::Str)?)
//!     .build()?;
//! let person = RecordType::builder("Person")
//!     .field("name", FieldSpec::of(Primitive::Str)?)
//!     .field("tags", FieldSpec::list_of(Primitive::Str))
//!     .field("home", FieldSpec::of(&address)?)
//!     .build()?;
//!
//! let mut ada = person.instantiate();
//! ada.set("name", "Ada")?;
//!
//! let dumped = serde_json::Value::Object(dumps(&ada));
//! assert_eq!(dumped, serde_json::json!({"name": "Ada", "tags": [], "home": {}}));
//! # Ok::<(), schema_items::SchemaError>(())
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod record;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod value;

pub use config::{ItemsConfig, OutputFormat};
pub use error::{Result, SchemaError};
pub use field::{DataType, FieldSpec, Primitive, CHAR_TYPES, CONTAINER_TYPES};
pub use record::{Record, RESERVED_PREFIX};
pub use registry::{Definitions, FieldDef, RecordDef, SchemaRegistry};
pub use schema::{RecordType, RecordTypeBuilder, Schema};
pub use serializer::{dumps, dumps_value, loads, Serializer, ZeroTable};
pub use value::FieldValue;
