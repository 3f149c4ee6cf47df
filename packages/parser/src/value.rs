//! # Message Values
//!
//! In-memory representation of a schema-typed message.
//!
//! A [`Message`] holds a handle to its [`MessageSchema`] and the values of
//! the fields that are set, keyed by field number. Every mutator checks the
//! schema before touching the message, so a failed call leaves it unchanged
//! and the tree can never take a shape the schema forbids.
//!
//! An empty repeated field is stored the same way as an unset one: removing
//! the last element drops the field entirely. Two messages with the same
//! content therefore always compare equal.

use crate::schema::{FieldSchema, FieldType, MessageSchema};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Unknown field '{field}' in message {message}")]
    UnknownField { message: String, field: String },

    #[error("Field '{0}' is repeated")]
    Repeated(String),

    #[error("Field '{0}' is not repeated")]
    NotRepeated(String),

    #[error("Type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Index {index} out of range for field '{field}' (length {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
}

/// A single field value
///
/// Equality compares floats by bit pattern, so `nan` equals itself.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Enum value by name
    Enum(String),
    Message(Message),
}

impl Value {
    /// Check that this value may be stored in a field of type `ty`
    pub fn conforms_to(&self, ty: &FieldType) -> bool {
        match (self, ty) {
            (Value::Int(v), FieldType::Int32) => i32::try_from(*v).is_ok(),
            (Value::Int(_), FieldType::Int64) => true,
            (Value::UInt(v), FieldType::UInt32) => u32::try_from(*v).is_ok(),
            (Value::UInt(_), FieldType::UInt64) => true,
            // Single precision only holds values that survive narrowing to f32
            (Value::Float(v), FieldType::Float) => v.is_nan() || f64::from(*v as f32) == *v,
            (Value::Float(_), FieldType::Double) => true,
            (Value::Bool(_), FieldType::Bool) => true,
            (Value::String(_), FieldType::String) => true,
            (Value::Enum(name), FieldType::Enum(schema)) => schema.value_by_name(name).is_some(),
            (Value::Message(m), FieldType::Message(schema)) => m.schema.name == schema.name,
            _ => false,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Message(m) => m.type_name(),
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) | (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Message> for Value {
    fn from(m: Message) -> Self {
        Value::Message(m)
    }
}

/// Stored value of a set field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Repeated(Vec<Value>),
}

/// A schema-typed message
#[derive(Debug, Clone)]
pub struct Message {
    schema: Arc<MessageSchema>,
    fields: BTreeMap<u32, FieldValue>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema.name == other.schema.name)
            && self.fields == other.fields
    }
}

impl Message {
    /// Create an empty message (the schema's default builder)
    pub fn new(schema: Arc<MessageSchema>) -> Self {
        Self {
            schema,
            fields: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<MessageSchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        &self.schema.name
    }

    /// Look up a field's schema
    pub fn field_schema(&self, name: &str) -> Result<&FieldSchema, FieldError> {
        self.schema
            .field(name)
            .ok_or_else(|| FieldError::UnknownField {
                message: self.schema.name.clone(),
                field: name.to_string(),
            })
    }

    fn singular_field(&self, name: &str) -> Result<&FieldSchema, FieldError> {
        let field = self.field_schema(name)?;
        if field.is_repeated() {
            return Err(FieldError::Repeated(name.to_string()));
        }
        Ok(field)
    }

    fn repeated_field(&self, name: &str) -> Result<&FieldSchema, FieldError> {
        let field = self.field_schema(name)?;
        if !field.is_repeated() {
            return Err(FieldError::NotRepeated(name.to_string()));
        }
        Ok(field)
    }

    fn check_value(field: &FieldSchema, value: &Value) -> Result<(), FieldError> {
        if value.conforms_to(&field.ty) {
            Ok(())
        } else {
            Err(FieldError::TypeMismatch {
                field: field.name.clone(),
                expected: field.ty.name().to_string(),
                found: value.type_name().to_string(),
            })
        }
    }

    /// Whether a field is set (a repeated field is set when non-empty)
    pub fn has(&self, name: &str) -> bool {
        self.schema
            .field(name)
            .map(|f| self.fields.contains_key(&f.number))
            .unwrap_or(false)
    }

    /// Value of a singular field, if set
    pub fn get(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        match self.fields.get(&field.number)? {
            FieldValue::Single(v) => Some(v),
            FieldValue::Repeated(_) => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let number = self.schema.field(name)?.number;
        match self.fields.get_mut(&number)? {
            FieldValue::Single(v) => Some(v),
            FieldValue::Repeated(_) => None,
        }
    }

    /// Elements of a repeated field (empty when unset)
    pub fn repeated(&self, name: &str) -> &[Value] {
        let Some(field) = self.schema.field(name) else {
            return &[];
        };
        match self.fields.get(&field.number) {
            Some(FieldValue::Repeated(values)) => values,
            _ => &[],
        }
    }

    pub fn element_mut(&mut self, name: &str, index: usize) -> Option<&mut Value> {
        let number = self.schema.field(name)?.number;
        match self.fields.get_mut(&number)? {
            FieldValue::Repeated(values) => values.get_mut(index),
            FieldValue::Single(_) => None,
        }
    }

    /// Set a singular field, returning the previous value
    pub fn set(&mut self, name: &str, value: Value) -> Result<Option<Value>, FieldError> {
        let field = self.singular_field(name)?;
        Self::check_value(field, &value)?;
        let number = field.number;

        match self.fields.insert(number, FieldValue::Single(value)) {
            Some(FieldValue::Single(prior)) => Ok(Some(prior)),
            _ => Ok(None),
        }
    }

    /// Unset a field, returning what it held
    pub fn clear(&mut self, name: &str) -> Result<Option<FieldValue>, FieldError> {
        let number = self.field_schema(name)?.number;
        Ok(self.fields.remove(&number))
    }

    /// Replace all elements of a repeated field, returning the previous elements
    pub fn set_repeated(&mut self, name: &str, values: Vec<Value>) -> Result<Vec<Value>, FieldError> {
        let field = self.repeated_field(name)?;
        for value in &values {
            Self::check_value(field, value)?;
        }
        let number = field.number;

        let prior = if values.is_empty() {
            self.fields.remove(&number)
        } else {
            self.fields.insert(number, FieldValue::Repeated(values))
        };

        match prior {
            Some(FieldValue::Repeated(values)) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }

    /// Append to a repeated field, returning the new element's index
    pub fn push(&mut self, name: &str, value: Value) -> Result<usize, FieldError> {
        let len = self.repeated(name).len();
        self.insert(name, len, value)?;
        Ok(len)
    }

    /// Insert into a repeated field at `index` (0..=len)
    pub fn insert(&mut self, name: &str, index: usize, value: Value) -> Result<(), FieldError> {
        let field = self.repeated_field(name)?;
        Self::check_value(field, &value)?;
        let number = field.number;

        let len = self.repeated(name).len();
        if index > len {
            return Err(FieldError::IndexOutOfRange {
                field: name.to_string(),
                index,
                len,
            });
        }

        match self
            .fields
            .entry(number)
            .or_insert_with(|| FieldValue::Repeated(Vec::new()))
        {
            FieldValue::Repeated(values) => values.insert(index, value),
            FieldValue::Single(_) => unreachable!("repeated field stored as single value"),
        }
        Ok(())
    }

    /// Remove an element from a repeated field
    pub fn remove(&mut self, name: &str, index: usize) -> Result<Value, FieldError> {
        let number = self.repeated_field(name)?.number;
        self.check_index(name, index)?;

        let Some(FieldValue::Repeated(values)) = self.fields.get_mut(&number) else {
            unreachable!("index checked against a non-empty repeated field");
        };
        let removed = values.remove(index);
        if values.is_empty() {
            self.fields.remove(&number);
        }
        Ok(removed)
    }

    /// Replace one element of a repeated field, returning the previous element
    pub fn replace(&mut self, name: &str, index: usize, value: Value) -> Result<Value, FieldError> {
        let field = self.repeated_field(name)?;
        Self::check_value(field, &value)?;
        self.check_index(name, index)?;

        let slot = self
            .element_mut(name, index)
            .ok_or_else(|| FieldError::NotRepeated(name.to_string()))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Move an element of a repeated field from one index to another
    pub fn move_element(&mut self, name: &str, from: usize, to: usize) -> Result<(), FieldError> {
        let number = self.repeated_field(name)?.number;
        self.check_index(name, from)?;
        self.check_index(name, to)?;

        if let Some(FieldValue::Repeated(values)) = self.fields.get_mut(&number) {
            let value = values.remove(from);
            values.insert(to, value);
        }
        Ok(())
    }

    fn check_index(&self, name: &str, index: usize) -> Result<(), FieldError> {
        let len = self.repeated(name).len();
        if index >= len {
            return Err(FieldError::IndexOutOfRange {
                field: name.to_string(),
                index,
                len,
            });
        }
        Ok(())
    }

    /// Set fields in field-number order
    pub fn fields(&self) -> impl Iterator<Item = (&FieldSchema, &FieldValue)> {
        self.fields.iter().filter_map(move |(number, value)| {
            self.schema.field_by_number(*number).map(|field| (field, value))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Dotted paths of required fields that are unset, searched through the whole tree
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        self.collect_missing_required("", &mut missing);
        missing
    }

    fn collect_missing_required(&self, prefix: &str, missing: &mut Vec<String>) {
        for field in self.schema.fields() {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", prefix, field.name)
            };

            match self.fields.get(&field.number) {
                None if field.is_required() => missing.push(path),
                None => {}
                Some(FieldValue::Single(Value::Message(m))) => m.collect_missing_required(&path, missing),
                Some(FieldValue::Repeated(values)) => {
                    for (i, value) in values.iter().enumerate() {
                        if let Value::Message(m) = value {
                            m.collect_missing_required(&format!("{}[{}]", path, i), missing);
                        }
                    }
                }
                Some(FieldValue::Single(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumSchema;

    fn texture_schema() -> Arc<MessageSchema> {
        let filter = Arc::new(EnumSchema::new("Filter", &[("LINEAR", 0), ("NEAREST", 1)]));
        MessageSchema::builder("Texture")
            .required("path", 1, FieldType::String)
            .optional("filter", 2, FieldType::Enum(filter))
            .optional("width", 3, FieldType::Int32)
            .repeated("tags", 4, FieldType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_returns_prior_value() {
        let mut msg = Message::new(texture_schema());

        assert_eq!(msg.set("path", "a.png".into()).unwrap(), None);
        assert_eq!(
            msg.set("path", "b.png".into()).unwrap(),
            Some(Value::String("a.png".to_string()))
        );
        assert_eq!(msg.get("path").and_then(Value::as_str), Some("b.png"));
    }

    #[test]
    fn test_type_mismatch_leaves_message_unchanged() {
        let mut msg = Message::new(texture_schema());
        let before = msg.clone();

        let err = msg.set("width", Value::String("wide".to_string())).unwrap_err();
        assert!(matches!(err, FieldError::TypeMismatch { .. }));
        assert_eq!(msg, before);
    }

    #[test]
    fn test_float_field_rejects_values_lost_in_narrowing() {
        let schema = MessageSchema::builder("Sprite")
            .optional("scale", 1, FieldType::Float)
            .optional("ratio", 2, FieldType::Double)
            .build()
            .unwrap();
        let mut msg = Message::new(schema);
        let before = msg.clone();

        for v in [1e40, 0.1, f64::from(f32::MAX) * 2.0] {
            let err = msg.set("scale", Value::Float(v)).unwrap_err();
            assert!(matches!(err, FieldError::TypeMismatch { .. }), "{}", v);
        }
        assert_eq!(msg, before);

        for v in [f64::from(0.1f32), 0.5, f64::INFINITY, f64::NAN, -0.0] {
            assert!(msg.set("scale", Value::Float(v)).is_ok(), "{}", v);
        }
        assert!(msg.set("ratio", Value::Float(1e40)).is_ok());
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Float(1.0), Value::Int(1));
    }

    #[test]
    fn test_int32_range_checked() {
        let mut msg = Message::new(texture_schema());
        assert!(msg.set("width", Value::Int(i64::from(i32::MAX) + 1)).is_err());
        assert!(msg.set("width", Value::Int(512)).is_ok());
    }

    #[test]
    fn test_enum_membership_checked() {
        let mut msg = Message::new(texture_schema());
        assert!(msg.set("filter", Value::Enum("CUBIC".to_string())).is_err());
        assert!(msg.set("filter", Value::Enum("NEAREST".to_string())).is_ok());
    }

    #[test]
    fn test_singular_and_repeated_accessors_are_not_interchangeable() {
        let mut msg = Message::new(texture_schema());
        assert_eq!(
            msg.set("tags", "x".into()),
            Err(FieldError::Repeated("tags".to_string()))
        );
        assert_eq!(
            msg.push("path", "x".into()),
            Err(FieldError::NotRepeated("path".to_string()))
        );
    }

    #[test]
    fn test_removing_last_element_unsets_field() {
        let schema = texture_schema();
        let empty = Message::new(schema.clone());
        let mut msg = Message::new(schema);

        msg.push("tags", "a".into()).unwrap();
        assert!(msg.has("tags"));

        msg.remove("tags", 0).unwrap();
        assert!(!msg.has("tags"));
        assert_eq!(msg, empty);
    }

    #[test]
    fn test_insert_bounds() {
        let mut msg = Message::new(texture_schema());
        msg.insert("tags", 0, "a".into()).unwrap();
        msg.insert("tags", 1, "c".into()).unwrap();
        msg.insert("tags", 1, "b".into()).unwrap();

        let err = msg.insert("tags", 5, "z".into()).unwrap_err();
        assert_eq!(
            err,
            FieldError::IndexOutOfRange {
                field: "tags".to_string(),
                index: 5,
                len: 3
            }
        );

        let tags: Vec<_> = msg.repeated("tags").iter().filter_map(Value::as_str).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_element() {
        let mut msg = Message::new(texture_schema());
        for tag in ["a", "b", "c"] {
            msg.push("tags", tag.into()).unwrap();
        }

        msg.move_element("tags", 0, 2).unwrap();
        let tags: Vec<_> = msg.repeated("tags").iter().filter_map(Value::as_str).collect();
        assert_eq!(tags, vec!["b", "c", "a"]);

        assert!(msg.move_element("tags", 0, 3).is_err());
    }

    #[test]
    fn test_missing_required_reports_nested_paths() {
        let texture = texture_schema();
        let set_schema = MessageSchema::builder("TextureSet")
            .required("name", 1, FieldType::String)
            .repeated("textures", 2, FieldType::Message(texture.clone()))
            .build()
            .unwrap();

        let mut set = Message::new(set_schema);
        set.push("textures", Value::Message(Message::new(texture))).unwrap();

        assert_eq!(set.missing_required(), vec!["name", "textures[0].path"]);
    }
}
