//! Error types for the editor

use crate::mutations::MutationError;
use ddf_parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to open {name}: {source}")]
    Open {
        name: String,
        #[source]
        source: Box<EditorError>,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] MutationError),

    #[error("Undo of '{0}' was rejected")]
    ApprovalRejected(String),

    #[error("Failed to save {name}: {source}")]
    Save {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No resource type registered for extension: {0}")]
    UnknownResourceType(String),

    #[error("Document is not open")]
    NotOpen,

    #[error("Document is closed")]
    Closed,

    #[error("Document is already open")]
    AlreadyOpen,
}

impl EditorError {
    pub(crate) fn open(name: &str, source: EditorError) -> Self {
        EditorError::Open {
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}
