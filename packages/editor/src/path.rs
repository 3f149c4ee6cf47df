//! # Field Paths
//!
//! Addresses nodes in a message tree with dotted paths such as
//! `textures[2].sampler`. A path made only of segments that lead through
//! message values resolves to a nested [`Message`]; the empty path is the
//! document root.

use ddf_parser::{Message, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Invalid path '{path}': {reason}")]
    Invalid { path: String, reason: String },

    #[error("Path not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, PathError> {
        let invalid = |reason: &str| PathError::Invalid {
            path: text.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = text.char_indices().peekable();
        let mut expect_field = true;

        while let Some(&(start, c)) = chars.peek() {
            match c {
                '[' => {
                    if segments.is_empty() {
                        return Err(invalid("index must follow a field name"));
                    }
                    chars.next();
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, ']')) => break,
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("index must be a non-negative integer")),
                            None => return Err(invalid("unclosed '['")),
                        }
                    }
                    let index = digits
                        .parse()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    segments.push(PathSegment::Index(index));
                    expect_field = false;
                }
                '.' => {
                    if expect_field {
                        return Err(invalid("empty field name"));
                    }
                    chars.next();
                    expect_field = true;
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    if !expect_field {
                        return Err(invalid("expected '.' or '[' between segments"));
                    }
                    let mut end = start;
                    while let Some(&(i, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            end = i + c.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    segments.push(PathSegment::Field(text[start..end].to_string()));
                    expect_field = false;
                }
                _ => return Err(invalid(&format!("unexpected character '{}'", c))),
            }
        }

        if expect_field && !segments.is_empty() {
            return Err(invalid("path ends with '.'"));
        }

        Ok(Self { segments })
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split `a.b[1]` into (`a`, `b`, `Some(1)`) and `a.b` into (`a`, `b`, `None`)
    pub fn split_field(&self) -> Option<(FieldPath, &str, Option<usize>)> {
        let (index, rest) = match self.segments.split_last()? {
            (PathSegment::Index(i), rest) => (Some(*i), rest),
            _ => (None, &self.segments[..]),
        };

        match rest.split_last()? {
            (PathSegment::Field(name), parent) => Some((
                FieldPath {
                    segments: parent.to_vec(),
                },
                name.as_str(),
                index,
            )),
            _ => None,
        }
    }

    /// Resolve to the message this path names
    pub fn resolve<'a>(&self, root: &'a Message) -> Result<&'a Message, PathError> {
        let mut current = root;
        let mut segments = self.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            let PathSegment::Field(name) = segment else {
                return Err(self.not_found());
            };

            let value = match segments.peek() {
                Some(PathSegment::Index(i)) => {
                    let i = *i;
                    segments.next();
                    current.repeated(name).get(i)
                }
                _ => current.get(name),
            };

            current = value
                .and_then(Value::as_message)
                .ok_or_else(|| self.not_found())?;
        }

        Ok(current)
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut Message) -> Result<&'a mut Message, PathError> {
        let mut current = root;
        let mut segments = self.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            let PathSegment::Field(name) = segment else {
                return Err(self.not_found());
            };

            let value = match segments.peek() {
                Some(PathSegment::Index(i)) => {
                    let i = *i;
                    segments.next();
                    current.element_mut(name, i)
                }
                _ => current.get_mut(name),
            };

            current = value
                .and_then(Value::as_message_mut)
                .ok_or_else(|| self.not_found())?;
        }

        Ok(current)
    }

    fn not_found(&self) -> PathError {
        PathError::NotFound(self.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
