//! # Document Model
//!
//! A `Document` is one schema-typed message loaded from text.
//!
//! ```text
//! Load → Parse → Edit → Serialize → Save
//!   ↓      ↓       ↓        ↓         ↓
//! Text  Message Mutations  Text     Sink
//! ```
//!
//! Loading merges the text into the resource type's empty builder. Required
//! fields are not checked here; that is left to `ddf_parser::parse_strict`.

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationError};
use crate::path::{FieldPath, PathError};
use crate::resource_types::ResourceType;
use ddf_parser::{serialize, Message, Parser, Value};

/// Editable message document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    message: Message,
}

impl Document {
    /// Parse `source` as the resource type's message
    pub fn load(
        name: impl Into<String>,
        source: &str,
        resource_type: &ResourceType,
    ) -> Result<Self, EditorError> {
        let mut message = resource_type.new_builder();
        Parser::new(source)?.merge_into(&mut message)?;

        Ok(Self {
            name: name.into(),
            message,
        })
    }

    pub fn from_message(name: impl Into<String>, message: Message) -> Self {
        Self {
            name: name.into(),
            message,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        self.message.type_name()
    }

    pub fn root(&self) -> &Message {
        &self.message
    }

    pub(crate) fn root_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    pub fn message_at(&self, path: &FieldPath) -> Result<&Message, PathError> {
        path.resolve(&self.message)
    }

    /// Value at a field path such as `textures[1].path` or `name`
    pub fn value_at(&self, path: &FieldPath) -> Result<&Value, PathError> {
        let not_found = || PathError::NotFound(path.to_string());
        let (parent, field, index) = path.split_field().ok_or_else(not_found)?;
        let message = parent.resolve(&self.message).map_err(|_| not_found())?;

        let value = match index {
            Some(i) => message.repeated(field).get(i),
            None => message.get(field),
        };
        value.ok_or_else(not_found)
    }

    /// Apply a mutation without recording it
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        mutation.apply(&mut self.message)
    }

    /// Canonical text of the whole message
    pub fn serialize(&self) -> String {
        serialize(&self.message)
    }
}
