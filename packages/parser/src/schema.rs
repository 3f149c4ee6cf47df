//! # Message Schemas
//!
//! Type definitions that govern which fields a message may contain.
//!
//! Schemas can be built in code with [`MessageSchema::builder`] or loaded
//! from a JSON description with [`SchemaSet::from_json`]:
//!
//! ```json
//! {
//!   "enums": [
//!     { "name": "Filter", "values": [ { "name": "LINEAR", "number": 0 } ] }
//!   ],
//!   "messages": [
//!     {
//!       "name": "Texture",
//!       "fields": [
//!         { "name": "path", "number": 1, "label": "required", "type": "string" },
//!         { "name": "filter", "number": 2, "type": "Filter" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Message-typed fields reference other messages by name. References are
//! resolved when the set is built, so every [`FieldType::Message`] holds a
//! shared handle to its schema. Recursive message types are rejected.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown type '{type_name}' for field '{field}' in message {message}")]
    UnknownType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("Duplicate field '{field}' in message {message}")]
    DuplicateField { message: String, field: String },

    #[error("Duplicate field number {number} in message {message}")]
    DuplicateFieldNumber { message: String, number: u32 },

    #[error("Duplicate type name: {0}")]
    DuplicateType(String),

    #[error("Recursive message type: {0}")]
    Cycle(String),
}

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Optional,
    Required,
    Repeated,
}

/// Value type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Enum(Arc<EnumSchema>),
    Message(Arc<MessageSchema>),
}

impl FieldType {
    /// Scalar type for a schema keyword (`int32`, `string`, ...)
    pub fn scalar(keyword: &str) -> Option<Self> {
        let ty = match keyword {
            "int32" | "sint32" | "sfixed32" => FieldType::Int32,
            "int64" | "sint64" | "sfixed64" => FieldType::Int64,
            "uint32" | "fixed32" => FieldType::UInt32,
            "uint64" | "fixed64" => FieldType::UInt64,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            "bool" => FieldType::Bool,
            "string" => FieldType::String,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Enum(e) => &e.name,
            FieldType::Message(m) => &m.name,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumSchema {
    pub fn new(name: impl Into<String>, values: &[(&str, i32)]) -> Self {
        Self {
            name: name.into(),
            values: values
                .iter()
                .map(|(name, number)| EnumValue {
                    name: name.to_string(),
                    number: *number,
                })
                .collect(),
        }
    }

    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub number: u32,
    pub label: Label,
    pub ty: FieldType,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, number: u32, label: Label, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            label,
            ty,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.label == Label::Required
    }
}

/// Schema of one message type. Fields are kept in field-number order.
#[derive(Debug, PartialEq)]
pub struct MessageSchema {
    pub name: String,
    fields: Vec<FieldSchema>,
}

impl MessageSchema {
    pub fn new(name: impl Into<String>, mut fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut names = HashSet::new();
        let mut numbers = HashSet::new();

        for field in &fields {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: name,
                    field: field.name.clone(),
                });
            }
            if !numbers.insert(field.number) {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: name,
                    number: field.number,
                });
            }
        }

        fields.sort_by_key(|f| f.number);
        Ok(Self { name, fields })
    }

    pub fn builder(name: impl Into<String>) -> MessageSchemaBuilder {
        MessageSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldSchema> {
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|i| &self.fields[i])
    }
}

/// Incremental construction of a [`MessageSchema`]
#[derive(Debug)]
pub struct MessageSchemaBuilder {
    name: String,
    fields: Vec<FieldSchema>,
}

impl MessageSchemaBuilder {
    pub fn field(mut self, name: &str, number: u32, label: Label, ty: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, number, label, ty));
        self
    }

    pub fn optional(self, name: &str, number: u32, ty: FieldType) -> Self {
        self.field(name, number, Label::Optional, ty)
    }

    pub fn required(self, name: &str, number: u32, ty: FieldType) -> Self {
        self.field(name, number, Label::Required, ty)
    }

    pub fn repeated(self, name: &str, number: u32, ty: FieldType) -> Self {
        self.field(name, number, Label::Repeated, ty)
    }

    pub fn build(self) -> Result<Arc<MessageSchema>, SchemaError> {
        MessageSchema::new(self.name, self.fields).map(Arc::new)
    }
}

/// Serialized form of a schema set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,

    #[serde(default)]
    pub messages: Vec<MessageDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDefinition {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub number: u32,

    #[serde(default)]
    pub label: Label,

    #[serde(rename = "type")]
    pub type_name: String,
}

/// Named message and enum schemas with resolved cross references
#[derive(Debug, Default, Clone)]
pub struct SchemaSet {
    messages: HashMap<String, Arc<MessageSchema>>,
    enums: HashMap<String, Arc<EnumSchema>>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let definition: SchemaDefinition = serde_json::from_str(json)?;
        Self::from_definition(&definition)
    }

    pub fn from_definition(definition: &SchemaDefinition) -> Result<Self, SchemaError> {
        let mut set = Self::new();

        for def in &definition.enums {
            if set.enums.contains_key(&def.name) {
                return Err(SchemaError::DuplicateType(def.name.clone()));
            }
            set.enums.insert(
                def.name.clone(),
                Arc::new(EnumSchema {
                    name: def.name.clone(),
                    values: def.values.clone(),
                }),
            );
        }

        let mut pending: HashMap<&str, &MessageDefinition> = HashMap::new();
        for def in &definition.messages {
            if set.enums.contains_key(&def.name) || pending.insert(&def.name, def).is_some() {
                return Err(SchemaError::DuplicateType(def.name.clone()));
            }
        }

        let mut in_progress = HashSet::new();
        for def in &definition.messages {
            set.resolve_message(def, &pending, &mut in_progress)?;
        }

        Ok(set)
    }

    fn resolve_message<'a>(
        &mut self,
        def: &'a MessageDefinition,
        pending: &HashMap<&'a str, &'a MessageDefinition>,
        in_progress: &mut HashSet<&'a str>,
    ) -> Result<Arc<MessageSchema>, SchemaError> {
        if let Some(schema) = self.messages.get(&def.name) {
            return Ok(schema.clone());
        }
        if !in_progress.insert(def.name.as_str()) {
            return Err(SchemaError::Cycle(def.name.clone()));
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let ty = if let Some(scalar) = FieldType::scalar(&field.type_name) {
                scalar
            } else if let Some(e) = self.enums.get(&field.type_name) {
                FieldType::Enum(e.clone())
            } else if let Some(nested) = pending.get(field.type_name.as_str()) {
                FieldType::Message(self.resolve_message(*nested, pending, in_progress)?)
            } else {
                return Err(SchemaError::UnknownType {
                    message: def.name.clone(),
                    field: field.name.clone(),
                    type_name: field.type_name.clone(),
                });
            };
            fields.push(FieldSchema::new(&field.name, field.number, field.label, ty));
        }

        let schema = Arc::new(MessageSchema::new(&def.name, fields)?);
        in_progress.remove(def.name.as_str());
        self.messages.insert(def.name.clone(), schema.clone());
        Ok(schema)
    }

    /// Register a schema built in code
    pub fn insert_message(&mut self, schema: Arc<MessageSchema>) {
        self.messages.insert(schema.name.clone(), schema);
    }

    pub fn message(&self, name: &str) -> Option<Arc<MessageSchema>> {
        self.messages.get(name).cloned()
    }

    pub fn enum_type(&self, name: &str) -> Option<Arc<EnumSchema>> {
        self.enums.get(name).cloned()
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMAS: &str = r#"{
        "enums": [
            { "name": "Filter", "values": [
                { "name": "LINEAR", "number": 0 },
                { "name": "NEAREST", "number": 1 }
            ] }
        ],
        "messages": [
            { "name": "TextureSet", "fields": [
                { "name": "name", "number": 1, "label": "required", "type": "string" },
                { "name": "textures", "number": 2, "label": "repeated", "type": "Texture" }
            ] },
            { "name": "Texture", "fields": [
                { "name": "path", "number": 1, "label": "required", "type": "string" },
                { "name": "filter", "number": 2, "type": "Filter" }
            ] }
        ]
    }"#;

    #[test]
    fn test_load_schema_set_resolves_forward_references() {
        let set = SchemaSet::from_json(SCHEMAS).unwrap();
        let texture_set = set.message("TextureSet").unwrap();

        let textures = texture_set.field("textures").unwrap();
        assert!(textures.is_repeated());
        match &textures.ty {
            FieldType::Message(m) => assert_eq!(m.name, "Texture"),
            other => panic!("Expected message type, got {}", other),
        }

        let texture = set.message("Texture").unwrap();
        let filter = texture.field("filter").unwrap();
        assert_eq!(filter.label, Label::Optional);
        assert_eq!(filter.ty.name(), "Filter");
    }

    #[test]
    fn test_fields_sorted_by_number() {
        let schema = MessageSchema::builder("Sorted")
            .optional("b", 2, FieldType::Int32)
            .optional("a", 1, FieldType::Int32)
            .build()
            .unwrap();

        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.field_by_number(2).unwrap().name, "b");
        assert!(schema.field_by_number(3).is_none());
    }

    #[test]
    fn test_duplicate_field_number_rejected() {
        let result = MessageSchema::builder("Dup")
            .optional("a", 1, FieldType::Int32)
            .optional("b", 1, FieldType::Int32)
            .build();

        assert!(matches!(
            result,
            Err(SchemaError::DuplicateFieldNumber { number: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{ "messages": [ { "name": "A", "fields": [
            { "name": "b", "number": 1, "type": "Missing" }
        ] } ] }"#;

        assert!(matches!(
            SchemaSet::from_json(json),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_recursive_type_rejected() {
        let json = r#"{ "messages": [
            { "name": "Node", "fields": [
                { "name": "child", "number": 1, "type": "Node" }
            ] }
        ] }"#;

        assert!(matches!(SchemaSet::from_json(json), Err(SchemaError::Cycle(name)) if name == "Node"));
    }
}
