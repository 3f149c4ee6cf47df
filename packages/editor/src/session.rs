//! # Document Sessions
//!
//! A session owns one document and its command history for as long as the
//! document is open in a host.
//!
//! ```text
//!            open              apply / undo / redo
//! Unopened ────────→ Clean ⇄ Dirty ────────────────┐
//!    │                 │       │ ←── save ─────────┘
//!    └──────── close ──┴───────┴────────→ Closed
//! ```
//!
//! A failed `open` leaves the session `Unopened`. A failed `save` leaves it
//! `Dirty` and returns the error; nothing is retried.

use crate::document::Document;
use crate::errors::EditorError;
use crate::history::{
    CommandHistory, HistoryConfig, RedoOutcome, UndoApprover, UndoContext, UndoOutcome,
};
use crate::mutations::Mutation;
use crate::resource_types::{ResourceType, ResourceTypeRegistry};
use crate::storage::{DocumentSink, DocumentSource};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a host needs from an editor to open, save and track a document
pub trait DocumentEditor {
    fn open(&mut self, source: &mut dyn DocumentSource) -> Result<(), EditorError>;
    fn save(&mut self, sink: &mut dyn DocumentSink) -> Result<(), EditorError>;
    fn is_dirty(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Clean,
    Dirty,
    Closed,
}

enum Phase {
    Unopened,
    Open {
        document: Document,
        history: CommandHistory,
    },
    Closed,
}

type DirtyListener = Box<dyn FnMut(bool)>;

/// Editing session for one document
pub struct DocumentSession {
    resource_type: Arc<ResourceType>,
    phase: Phase,
    history_config: HistoryConfig,
    context: UndoContext,
    approver: Option<Arc<dyn UndoApprover>>,
    dirty_listeners: Vec<DirtyListener>,
}

impl fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("resource_type", &self.resource_type.name)
            .field("state", &self.state())
            .field("context", &self.context)
            .field("history_config", &self.history_config)
            .field("dirty_listeners", &self.dirty_listeners.len())
            .finish()
    }
}

impl DocumentSession {
    /// Session for files with `extension`
    ///
    /// Fails when no resource type is registered for the extension.
    pub fn new(registry: &ResourceTypeRegistry, extension: &str) -> Result<Self, EditorError> {
        let resource_type = registry
            .get(extension)
            .ok_or_else(|| EditorError::UnknownResourceType(extension.to_string()))?;
        Ok(Self::with_resource_type(resource_type))
    }

    pub fn with_resource_type(resource_type: Arc<ResourceType>) -> Self {
        Self {
            resource_type,
            phase: Phase::Unopened,
            history_config: HistoryConfig::default(),
            context: UndoContext::unique(),
            approver: None,
            dirty_listeners: Vec::new(),
        }
    }

    /// Takes effect for the history created on `open`
    pub fn with_history_config(mut self, config: HistoryConfig) -> Self {
        self.history_config = config;
        self
    }

    /// Load the document from `source` with an empty history
    pub fn open(&mut self, source: &mut dyn DocumentSource) -> Result<(), EditorError> {
        match self.phase {
            Phase::Unopened => {}
            Phase::Open { .. } => return Err(EditorError::AlreadyOpen),
            Phase::Closed => return Err(EditorError::Closed),
        }

        let name = source.name().to_string();
        let document = source
            .read()
            .map_err(EditorError::from)
            .and_then(|text| Document::load(&name, &text, &self.resource_type))
            .map_err(|err| {
                warn!(name = %name, error = %err, "Failed to open document");
                EditorError::open(&name, err)
            })?;

        let mut history = CommandHistory::with_context(self.context, self.history_config);
        if let Some(approver) = &self.approver {
            history.set_approver(approver.clone());
        }

        info!(
            name = %name,
            resource_type = %self.resource_type.name,
            "Opened document"
        );
        self.phase = Phase::Open { document, history };
        Ok(())
    }

    /// Serialize the document to `sink` and mark the current position clean
    pub fn save(&mut self, sink: &mut dyn DocumentSink) -> Result<(), EditorError> {
        let was_dirty = self.is_dirty();
        let (document, history) = self.open_parts()?;

        let text = document.serialize();
        if let Err(source) = sink.write(&text) {
            warn!(name = %document.name(), error = %source, "Failed to save document");
            return Err(EditorError::Save {
                name: document.name().to_string(),
                source,
            });
        }

        history.mark_clean();
        info!(
            name = %document.name(),
            bytes = text.len(),
            clean_mark = history.clean_mark(),
            "Saved document"
        );

        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Release the document and history; the session cannot be reopened
    pub fn close(&mut self) -> Result<(), EditorError> {
        if let Phase::Closed = self.phase {
            return Err(EditorError::Closed);
        }
        if let Phase::Open { document, .. } = &self.phase {
            debug!(name = %document.name(), "Closing document");
        }
        self.phase = Phase::Closed;
        Ok(())
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<(), EditorError> {
        self.apply_in(mutation, &[])
    }

    /// Apply a mutation that also belongs to other undo contexts
    pub fn apply_in(
        &mut self,
        mutation: Mutation,
        extra_contexts: &[UndoContext],
    ) -> Result<(), EditorError> {
        let was_dirty = self.is_dirty();
        let (document, history) = self.open_parts()?;

        history.execute_in(mutation, extra_contexts, document.root_mut())?;

        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Group the following mutations into one undo step
    pub fn begin_batch(&mut self, description: impl Into<String>) -> Result<(), EditorError> {
        let (_, history) = self.open_parts()?;
        history.begin_batch();
        history.set_batch_description(description);
        Ok(())
    }

    pub fn end_batch(&mut self) -> Result<(), EditorError> {
        let was_dirty = self.is_dirty();
        let (_, history) = self.open_parts()?;
        history.end_batch();
        self.notify_dirty(was_dirty);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<UndoOutcome, EditorError> {
        let was_dirty = self.is_dirty();
        let (document, history) = self.open_parts()?;

        let outcome = history.undo(document.root_mut())?;

        self.notify_dirty(was_dirty);
        Ok(outcome)
    }

    pub fn redo(&mut self) -> Result<RedoOutcome, EditorError> {
        let was_dirty = self.is_dirty();
        let (document, history) = self.open_parts()?;

        let outcome = history.redo(document.root_mut())?;

        self.notify_dirty(was_dirty);
        Ok(outcome)
    }

    /// True when the history position differs from the one last saved
    pub fn is_dirty(&self) -> bool {
        match &self.phase {
            Phase::Open { history, .. } => history.is_dirty(),
            _ => false,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.phase {
            Phase::Unopened => SessionState::Unopened,
            Phase::Open { history, .. } if history.is_dirty() => SessionState::Dirty,
            Phase::Open { .. } => SessionState::Clean,
            Phase::Closed => SessionState::Closed,
        }
    }

    pub fn document(&self) -> Result<&Document, EditorError> {
        self.open_ref().map(|(document, _)| document)
    }

    pub fn history(&self) -> Result<&CommandHistory, EditorError> {
        self.open_ref().map(|(_, history)| history)
    }

    pub fn can_undo(&self) -> bool {
        self.history().map(CommandHistory::can_undo).unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.history().map(CommandHistory::can_redo).unwrap_or(false)
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history().ok()?.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history().ok()?.redo_description()
    }

    /// Undo context of this session's edits
    pub fn context(&self) -> UndoContext {
        self.context
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    /// Display name of the resource type
    pub fn title(&self) -> &str {
        &self.resource_type.name
    }

    /// Name of the open document's source
    pub fn name(&self) -> Option<&str> {
        self.document().ok().map(Document::name)
    }

    /// Called with the new value whenever `is_dirty` flips
    pub fn on_dirty_changed(&mut self, listener: impl FnMut(bool) + 'static) {
        self.dirty_listeners.push(Box::new(listener));
    }

    /// Consulted before undoing steps that touch other contexts
    pub fn set_approver(&mut self, approver: Arc<dyn UndoApprover>) {
        if let Phase::Open { history, .. } = &mut self.phase {
            history.set_approver(approver.clone());
        }
        self.approver = Some(approver);
    }

    fn open_parts(&mut self) -> Result<(&mut Document, &mut CommandHistory), EditorError> {
        match &mut self.phase {
            Phase::Open { document, history } => Ok((document, history)),
            Phase::Unopened => Err(EditorError::NotOpen),
            Phase::Closed => Err(EditorError::Closed),
        }
    }

    fn open_ref(&self) -> Result<(&Document, &CommandHistory), EditorError> {
        match &self.phase {
            Phase::Open { document, history } => Ok((document, history)),
            Phase::Unopened => Err(EditorError::NotOpen),
            Phase::Closed => Err(EditorError::Closed),
        }
    }

    fn notify_dirty(&mut self, was_dirty: bool) {
        let dirty = self.is_dirty();
        if dirty == was_dirty {
            return;
        }
        debug!(dirty, "Dirty state changed");
        for listener in &mut self.dirty_listeners {
            listener(dirty);
        }
    }
}

impl DocumentEditor for DocumentSession {
    fn open(&mut self, source: &mut dyn DocumentSource) -> Result<(), EditorError> {
        DocumentSession::open(self, source)
    }

    fn save(&mut self, sink: &mut dyn DocumentSink) -> Result<(), EditorError> {
        DocumentSession::save(self, sink)
    }

    fn is_dirty(&self) -> bool {
        DocumentSession::is_dirty(self)
    }
}
