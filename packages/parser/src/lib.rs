//! # DDF Parser
//!
//! Schema types and the text-format codec for schema-typed messages.
//!
//! ```rust,ignore
//! use ddf_parser::{parse, serialize, SchemaSet};
//!
//! let schemas = SchemaSet::from_json(&std::fs::read_to_string("schemas.json")?)?;
//! let schema = schemas.message("TextureSet").unwrap();
//!
//! let message = parse("name: \"atlas\"", &schema)?;
//! assert_eq!(serialize(&message), "name: \"atlas\"\n");
//! ```

pub mod error;
pub mod parser;
pub mod schema;
pub mod serializer;
pub mod tokenizer;
pub mod value;

pub use error::{ParseError, ParseResult};
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use parser::{parse, parse_strict, parse_value, Parser};
pub use schema::{
    EnumSchema, EnumValue, FieldSchema, FieldType, Label, MessageSchema, MessageSchemaBuilder,
    SchemaDefinition, SchemaError, SchemaSet,
};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};
pub use value::{FieldError, FieldValue, Message, Value};
