//! # Message Mutations
//!
//! Edit commands on a message tree.
//!
//! ## Design Principles
//!
//! 1. **Schema-checked**: A mutation is validated against the schema of the
//!    message it targets before anything changes
//! 2. **Atomic**: A rejected mutation leaves the tree exactly as it was
//! 3. **Reversible**: `to_inverse` captures what is needed to undo the
//!    mutation, computed from the tree state before it is applied
//!
//! Every mutation names a target message by [`FieldPath`] and a field of
//! that message.
//!
//! ## Inverses
//!
//! | Mutation        | Inverse                                        |
//! |-----------------|------------------------------------------------|
//! | `SetField`      | `SetField` with the prior value, or `ClearField` |
//! | `ClearField`    | `SetField` / `SetRepeated` with the prior value |
//! | `SetRepeated`   | `SetRepeated` with the prior elements          |
//! | `AppendElement` | `RemoveElement` at the old length              |
//! | `InsertElement` | `RemoveElement` at the same index              |
//! | `RemoveElement` | `InsertElement` of the removed element         |
//! | `SetElement`    | `SetElement` with the prior element            |
//! | `MoveElement`   | `MoveElement` back                             |

use crate::path::{FieldPath, PathError};
use ddf_parser::{FieldError, FieldSchema, Message, Value};
use thiserror::Error;

/// Edit commands on a message tree
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Set a singular field
    SetField {
        target: FieldPath,
        field: String,
        value: Value,
    },

    /// Unset a field (singular or repeated)
    ClearField { target: FieldPath, field: String },

    /// Replace every element of a repeated field
    SetRepeated {
        target: FieldPath,
        field: String,
        values: Vec<Value>,
    },

    /// Append an element to a repeated field
    AppendElement {
        target: FieldPath,
        field: String,
        value: Value,
    },

    /// Insert an element into a repeated field at `index` (0..=len)
    InsertElement {
        target: FieldPath,
        field: String,
        index: usize,
        value: Value,
    },

    /// Remove the element at `index` of a repeated field
    RemoveElement {
        target: FieldPath,
        field: String,
        index: usize,
    },

    /// Replace the element at `index` of a repeated field
    SetElement {
        target: FieldPath,
        field: String,
        index: usize,
        value: Value,
    },

    /// Move an element of a repeated field from `from` to `to`
    MoveElement {
        target: FieldPath,
        field: String,
        from: usize,
        to: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl Mutation {
    pub fn set_field(target: FieldPath, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Mutation::SetField {
            target,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn clear_field(target: FieldPath, field: impl Into<String>) -> Self {
        Mutation::ClearField {
            target,
            field: field.into(),
        }
    }

    pub fn append(target: FieldPath, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Mutation::AppendElement {
            target,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn remove(target: FieldPath, field: impl Into<String>, index: usize) -> Self {
        Mutation::RemoveElement {
            target,
            field: field.into(),
            index,
        }
    }

    /// Path of the message this mutation edits
    pub fn target(&self) -> &FieldPath {
        match self {
            Mutation::SetField { target, .. }
            | Mutation::ClearField { target, .. }
            | Mutation::SetRepeated { target, .. }
            | Mutation::AppendElement { target, .. }
            | Mutation::InsertElement { target, .. }
            | Mutation::RemoveElement { target, .. }
            | Mutation::SetElement { target, .. }
            | Mutation::MoveElement { target, .. } => target,
        }
    }

    /// Name of the field this mutation edits
    pub fn field(&self) -> &str {
        match self {
            Mutation::SetField { field, .. }
            | Mutation::ClearField { field, .. }
            | Mutation::SetRepeated { field, .. }
            | Mutation::AppendElement { field, .. }
            | Mutation::InsertElement { field, .. }
            | Mutation::RemoveElement { field, .. }
            | Mutation::SetElement { field, .. }
            | Mutation::MoveElement { field, .. } => field,
        }
    }

    /// Short label for undo/redo menus
    pub fn describe(&self) -> String {
        let field = self.field_label();
        match self {
            Mutation::SetField { .. } => format!("Set {}", field),
            Mutation::ClearField { .. } => format!("Clear {}", field),
            Mutation::SetRepeated { .. } => format!("Replace {}", field),
            Mutation::AppendElement { .. } => format!("Add to {}", field),
            Mutation::InsertElement { index, .. } => format!("Insert {}[{}]", field, index),
            Mutation::RemoveElement { index, .. } => format!("Remove {}[{}]", field, index),
            Mutation::SetElement { index, .. } => format!("Set {}[{}]", field, index),
            Mutation::MoveElement { from, to, .. } => format!("Move {}[{}] to {}", field, from, to),
        }
    }

    fn field_label(&self) -> String {
        if self.target().is_root() {
            self.field().to_string()
        } else {
            format!("{}.{}", self.target(), self.field())
        }
    }

    /// Validate without applying
    pub fn validate(&self, root: &Message) -> Result<(), MutationError> {
        let message = self.target().resolve(root)?;
        let field = message.field_schema(self.field())?;
        let len = message.repeated(self.field()).len();

        match self {
            Mutation::SetField { value, .. } => {
                require_singular(field)?;
                require_conforms(field, value)
            }
            Mutation::ClearField { .. } => Ok(()),
            Mutation::SetRepeated { values, .. } => {
                require_repeated(field)?;
                values.iter().try_for_each(|v| require_conforms(field, v))
            }
            Mutation::AppendElement { value, .. } => {
                require_repeated(field)?;
                require_conforms(field, value)
            }
            Mutation::InsertElement { index, value, .. } => {
                require_repeated(field)?;
                require_conforms(field, value)?;
                require_index(field, *index, len, true)
            }
            Mutation::RemoveElement { index, .. } => {
                require_repeated(field)?;
                require_index(field, *index, len, false)
            }
            Mutation::SetElement { index, value, .. } => {
                require_repeated(field)?;
                require_conforms(field, value)?;
                require_index(field, *index, len, false)
            }
            Mutation::MoveElement { from, to, .. } => {
                require_repeated(field)?;
                require_index(field, *from, len, false)?;
                require_index(field, *to, len, false)
            }
        }
    }

    /// Apply mutation with validation
    pub fn apply(&self, root: &mut Message) -> Result<(), MutationError> {
        // Validate first
        self.validate(root)?;

        let message = self.target().resolve_mut(root)?;
        let field = self.field();

        match self {
            Mutation::SetField { value, .. } => {
                message.set(field, value.clone())?;
            }
            Mutation::ClearField { .. } => {
                message.clear(field)?;
            }
            Mutation::SetRepeated { values, .. } => {
                message.set_repeated(field, values.clone())?;
            }
            Mutation::AppendElement { value, .. } => {
                message.push(field, value.clone())?;
            }
            Mutation::InsertElement { index, value, .. } => {
                message.insert(field, *index, value.clone())?;
            }
            Mutation::RemoveElement { index, .. } => {
                message.remove(field, *index)?;
            }
            Mutation::SetElement { index, value, .. } => {
                message.replace(field, *index, value.clone())?;
            }
            Mutation::MoveElement { from, to, .. } => {
                message.move_element(field, *from, *to)?;
            }
        }

        Ok(())
    }

    /// Create the inverse mutation for undo, from the state before `self` is applied
    pub fn to_inverse(&self, root: &Message) -> Result<Mutation, MutationError> {
        self.validate(root)?;

        let message = self.target().resolve(root)?;
        let target = self.target().clone();
        let field = self.field().to_string();
        let elements = message.repeated(&field);

        let inverse = match self {
            Mutation::SetField { .. } => match message.get(&field) {
                Some(prior) => Mutation::SetField {
                    target,
                    field,
                    value: prior.clone(),
                },
                None => Mutation::ClearField { target, field },
            },

            Mutation::ClearField { .. } => {
                let schema = message.field_schema(&field)?;
                if schema.is_repeated() {
                    Mutation::SetRepeated {
                        target,
                        values: elements.to_vec(),
                        field,
                    }
                } else {
                    match message.get(&field) {
                        Some(prior) => Mutation::SetField {
                            target,
                            field,
                            value: prior.clone(),
                        },
                        None => Mutation::ClearField { target, field },
                    }
                }
            }

            Mutation::SetRepeated { .. } => Mutation::SetRepeated {
                target,
                values: elements.to_vec(),
                field,
            },

            Mutation::AppendElement { .. } => Mutation::RemoveElement {
                target,
                index: elements.len(),
                field,
            },

            Mutation::InsertElement { index, .. } => Mutation::RemoveElement {
                target,
                field,
                index: *index,
            },

            Mutation::RemoveElement { index, .. } => Mutation::InsertElement {
                target,
                field,
                index: *index,
                value: elements[*index].clone(),
            },

            Mutation::SetElement { index, .. } => Mutation::SetElement {
                target,
                field,
                index: *index,
                value: elements[*index].clone(),
            },

            Mutation::MoveElement { from, to, .. } => Mutation::MoveElement {
                target,
                field,
                from: *to,
                to: *from,
            },
        };

        Ok(inverse)
    }
}

fn require_singular(field: &FieldSchema) -> Result<(), MutationError> {
    if field.is_repeated() {
        return Err(FieldError::Repeated(field.name.clone()).into());
    }
    Ok(())
}

fn require_repeated(field: &FieldSchema) -> Result<(), MutationError> {
    if !field.is_repeated() {
        return Err(FieldError::NotRepeated(field.name.clone()).into());
    }
    Ok(())
}

fn require_conforms(field: &FieldSchema, value: &Value) -> Result<(), MutationError> {
    if !value.conforms_to(&field.ty) {
        return Err(FieldError::TypeMismatch {
            field: field.name.clone(),
            expected: field.ty.name().to_string(),
            found: value.type_name().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Inserts may address one past the end
fn require_index(
    field: &FieldSchema,
    index: usize,
    len: usize,
    allow_end: bool,
) -> Result<(), MutationError> {
    let in_range = if allow_end { index <= len } else { index < len };
    if !in_range {
        return Err(FieldError::IndexOutOfRange {
            field: field.name.clone(),
            index,
            len,
        }
        .into());
    }
    Ok(())
}
