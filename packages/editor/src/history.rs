//! # Command History
//!
//! Bounded, cursor-based undo/redo history with a clean mark.
//!
//! ## Design
//!
//! - Each mutation records its inverse before being applied
//! - Entries at `0..cursor` can be undone, `cursor..len` can be redone
//! - Executing after undos truncates the redo tail
//! - Past the configured limit the oldest entry is evicted
//! - `is_dirty` compares the cursor against the clean mark recorded at save
//! - Batches group several mutations into one undo step
//!
//! ```text
//! execute x3, mark_clean
//!   entries: [a, b, c]   cursor = 3   clean_mark = 3
//!
//! undo
//!   entries: [a, b, c]   cursor = 2   clean_mark = 3   (dirty)
//!
//! execute d  <-- redo tail dropped
//!   entries: [a, b, d]   cursor = 3   clean_mark = 3   (clean)
//! ```
//!
//! The last step shows the length heuristic: the document differs from the
//! saved one but the history reports it clean. Hosts that need content
//! equality have to compare serialized text themselves.

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationError};
use ddf_parser::Message;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default maximum number of undo steps
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Opaque handle grouping the edits that belong to one editable document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UndoContext(u64);

impl UndoContext {
    /// A context distinct from every other context in the process
    pub fn unique() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UndoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in reverse order for undo)
    pub inverses: Vec<Mutation>,

    /// Optional description of this batch
    pub description: Option<String>,

    /// Undo contexts this batch belongs to
    pub contexts: Vec<UndoContext>,
}

impl MutationBatch {
    fn empty(context: UndoContext) -> Self {
        Self {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description: None,
            contexts: vec![context],
        }
    }

    fn record(&mut self, mutation: Mutation, inverse: Mutation, extra_contexts: &[UndoContext]) {
        self.mutations.push(mutation);
        self.inverses.insert(0, inverse);
        for context in extra_contexts {
            if !self.contexts.contains(context) {
                self.contexts.push(*context);
            }
        }
    }

    /// Label for undo/redo menus: the description, or one derived from the mutations
    pub fn label(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        match self.mutations.as_slice() {
            [single] => single.describe(),
            many => format!("{} edits", many.len()),
        }
    }
}

/// An undo waiting for approval
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUndo {
    pub description: String,

    /// Contexts other than the history's own that the undo would affect
    pub contexts: Vec<UndoContext>,
}

/// Decides whether an undo touching other contexts may proceed
pub trait UndoApprover {
    fn approve(&self, pending: &PendingUndo) -> bool;
}

impl<F> UndoApprover for F
where
    F: Fn(&PendingUndo) -> bool,
{
    fn approve(&self, pending: &PendingUndo) -> bool {
        self(pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undo steps (0 = unlimited)
    pub limit: usize,
}

impl HistoryConfig {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn unlimited() -> Self {
        Self { limit: 0 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Carries the label of the undone step
    Undone(String),
    NothingToUndo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedoOutcome {
    /// Carries the label of the redone step
    Redone(String),
    NothingToRedo,
}

/// Undo/redo history for one document
pub struct CommandHistory {
    context: UndoContext,
    entries: VecDeque<MutationBatch>,
    cursor: usize,
    clean_mark: usize,
    config: HistoryConfig,

    /// Currently building a batch
    current_batch: Option<MutationBatch>,

    approver: Option<Arc<dyn UndoApprover>>,
}

impl fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("context", &self.context)
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("clean_mark", &self.clean_mark)
            .field("config", &self.config)
            .field("in_batch", &self.current_batch.is_some())
            .field("has_approver", &self.approver.is_some())
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    /// History with a fresh context and the default limit (100)
    pub fn new() -> Self {
        Self::with_context(UndoContext::unique(), HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self::with_context(UndoContext::unique(), config)
    }

    pub fn with_context(context: UndoContext, config: HistoryConfig) -> Self {
        Self {
            context,
            entries: VecDeque::new(),
            cursor: 0,
            clean_mark: 0,
            config,
            current_batch: None,
            approver: None,
        }
    }

    pub fn set_approver(&mut self, approver: Arc<dyn UndoApprover>) {
        self.approver = Some(approver);
    }

    pub fn context(&self) -> UndoContext {
        self.context
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Apply a mutation and record it for undo
    pub fn execute(&mut self, mutation: Mutation, doc: &mut Message) -> Result<(), MutationError> {
        self.execute_in(mutation, &[], doc)
    }

    /// Apply a mutation that also belongs to other undo contexts
    pub fn execute_in(
        &mut self,
        mutation: Mutation,
        extra_contexts: &[UndoContext],
        doc: &mut Message,
    ) -> Result<(), MutationError> {
        // Generate inverse before applying
        let inverse = mutation.to_inverse(doc)?;
        mutation.apply(doc)?;

        trace!(mutation = %mutation.describe(), cursor = self.cursor, "Executed mutation");

        match &mut self.current_batch {
            Some(batch) => batch.record(mutation, inverse, extra_contexts),
            None => {
                let mut batch = MutationBatch::empty(self.context);
                batch.record(mutation, inverse, extra_contexts);
                self.push_batch(batch);
            }
        }

        Ok(())
    }

    /// Start a batch of mutations (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        self.end_batch();
        self.current_batch = Some(MutationBatch::empty(self.context));
    }

    /// End the current batch; empty batches are discarded
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    /// Set description for current batch (if batching)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    pub fn in_batch(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        if self.cursor < self.entries.len() {
            trace!(dropped = self.entries.len() - self.cursor, "Truncating redo tail");
            self.entries.truncate(self.cursor);
        }

        self.entries.push_back(batch);
        self.cursor += 1;

        if self.config.limit > 0 && self.entries.len() > self.config.limit {
            if let Some(evicted) = self.entries.pop_front() {
                self.cursor -= 1;
                self.clean_mark = self.clean_mark.saturating_sub(1);
                debug!(
                    evicted = %evicted.label(),
                    limit = self.config.limit,
                    clean_mark = self.clean_mark,
                    "Evicted oldest history entry"
                );
            }
        }
    }

    /// Undo the step before the cursor
    ///
    /// An open batch is ended first. When the step belongs to other contexts
    /// too, the approver (if any) is asked; a refusal leaves everything as is.
    pub fn undo(&mut self, doc: &mut Message) -> Result<UndoOutcome, EditorError> {
        self.end_batch();

        let Some(batch) = self.cursor.checked_sub(1).and_then(|i| self.entries.get(i)) else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        let label = batch.label();

        let foreign: Vec<UndoContext> = batch
            .contexts
            .iter()
            .copied()
            .filter(|c| *c != self.context)
            .collect();

        if !foreign.is_empty() {
            if let Some(approver) = &self.approver {
                let pending = PendingUndo {
                    description: label.clone(),
                    contexts: foreign,
                };
                if !approver.approve(&pending) {
                    warn!(step = %label, contexts = ?pending.contexts, "Undo rejected by approver");
                    return Err(EditorError::ApprovalRejected(label));
                }
            }
        }

        apply_all(&batch.inverses, doc)?;
        self.cursor -= 1;

        debug!(step = %label, cursor = self.cursor, "Undo");
        Ok(UndoOutcome::Undone(label))
    }

    /// Redo the step at the cursor
    pub fn redo(&mut self, doc: &mut Message) -> Result<RedoOutcome, EditorError> {
        self.end_batch();

        let Some(batch) = self.entries.get(self.cursor) else {
            return Ok(RedoOutcome::NothingToRedo);
        };
        let label = batch.label();

        apply_all(&batch.mutations, doc)?;
        self.cursor += 1;

        debug!(step = %label, cursor = self.cursor, "Redo");
        Ok(RedoOutcome::Redone(label))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Number of recorded steps (undoable and redoable)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(MutationBatch::label)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.entries.get(self.cursor).map(MutationBatch::label)
    }

    /// Record the current position as the saved one, ending any open batch
    pub fn mark_clean(&mut self) {
        self.end_batch();
        self.clean_mark = self.cursor;
    }

    pub fn clean_mark(&self) -> usize {
        self.clean_mark
    }

    /// Cursor differs from the clean mark, or an open batch holds edits
    pub fn is_dirty(&self) -> bool {
        let batch_pending = self
            .current_batch
            .as_ref()
            .is_some_and(|batch| !batch.mutations.is_empty());
        batch_pending || self.cursor != self.clean_mark
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.clean_mark = 0;
        self.current_batch = None;
    }
}

/// Apply a step's mutations in order, restoring the document if one fails
fn apply_all(mutations: &[Mutation], doc: &mut Message) -> Result<(), MutationError> {
    if let [single] = mutations {
        return single.apply(doc);
    }

    let snapshot = doc.clone();
    for mutation in mutations {
        if let Err(err) = mutation.apply(doc) {
            *doc = snapshot;
            return Err(err);
        }
    }
    Ok(())
}
