//! # DDF Editor
//!
//! Editing core for schema-typed text-format documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text ⇄ Message (schema-checked)     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentSession                     │
//! │  - Open from a DocumentSource               │
//! │  - Apply mutations through CommandHistory   │
//! │  - Undo/redo with a bounded history         │
//! │  - Dirty tracking against the clean mark    │
//! │  - Save to a DocumentSink                   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: UI shell, CLI, tests                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Schema conformance**: Mutations are validated before they touch the tree
//! 2. **Strong exception safety**: A failed operation leaves session state as it was
//! 3. **Owned history**: Each session owns its history; nothing is process-wide
//! 4. **Explicit failures**: Save errors are returned to the host, never swallowed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddf_editor::{Config, DocumentSession, FieldPath, FileStorage, Mutation};
//!
//! let config = Config::load(dir)?;
//! let registry = config.build_registry(dir)?;
//!
//! let mut storage = FileStorage::new("ui.texture_set");
//! let mut session = DocumentSession::new(&registry, "texture_set")?
//!     .with_history_config(config.history_config());
//! session.open(&mut storage)?;
//!
//! session.apply(Mutation::set_field(FieldPath::root(), "name", "hud"))?;
//! assert!(session.is_dirty());
//!
//! session.save(&mut storage)?;
//! assert!(!session.is_dirty());
//! ```

mod config;
mod document;
mod errors;
mod history;
mod mutations;
mod path;
mod resource_types;
mod session;
mod storage;

pub use config::{Config, ConfigError, ResourceTypeConfig, DEFAULT_CONFIG_NAME};
pub use document::Document;
pub use errors::EditorError;
pub use history::{
    CommandHistory, HistoryConfig, MutationBatch, PendingUndo, RedoOutcome, UndoApprover,
    UndoContext, UndoOutcome, DEFAULT_HISTORY_LIMIT,
};
pub use mutations::{Mutation, MutationError};
pub use path::{FieldPath, PathError, PathSegment};
pub use resource_types::{ResourceType, ResourceTypeRegistry};
pub use session::{DocumentEditor, DocumentSession, SessionState};
pub use storage::{DocumentSink, DocumentSource, FileStorage, MemoryStorage};

pub use ddf_parser::{Message, Value};
