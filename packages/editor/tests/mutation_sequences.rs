//! Tests for longer undo/redo sequences
//!
//! This tests:
//! - Redo tail truncation
//! - Capacity eviction and clean mark clamping
//! - Dirty tracking across save/undo/redo
//! - Document integrity after operations

use ddf_editor::{
    CommandHistory, FieldPath, HistoryConfig, Message, Mutation, RedoOutcome, UndoOutcome, Value,
};
use ddf_parser::{parse, FieldType, MessageSchema};

fn document() -> Message {
    let point = MessageSchema::builder("Point")
        .optional("x", 1, FieldType::Int32)
        .optional("y", 2, FieldType::Int32)
        .build()
        .unwrap();
    let schema = MessageSchema::builder("Path")
        .optional("name", 1, FieldType::String)
        .repeated("points", 2, FieldType::Message(point))
        .repeated("weights", 3, FieldType::Double)
        .build()
        .unwrap();

    parse(
        "name: \"p\" points { x: 1 y: 2 } points { x: 3 } weights: [0.5, 1.5]",
        &schema,
    )
    .unwrap()
}

fn push_weight(w: f64) -> Mutation {
    Mutation::append(FieldPath::root(), "weights", Value::Float(w))
}

#[test]
fn test_execute_after_undo_discards_redo_tail() {
    let mut doc = document();
    let mut history = CommandHistory::new();

    history.execute(push_weight(1.0), &mut doc).unwrap();
    history.execute(push_weight(2.0), &mut doc).unwrap();
    history.undo(&mut doc).unwrap();
    history.undo(&mut doc).unwrap();
    assert_eq!(history.redo_levels(), 2);

    history.execute(push_weight(3.0), &mut doc).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.redo(&mut doc).unwrap(), RedoOutcome::NothingToRedo);

    // A new undo makes redo available again
    history.undo(&mut doc).unwrap();
    assert!(matches!(history.redo(&mut doc).unwrap(), RedoOutcome::Redone(_)));
    assert_eq!(
        doc.repeated("weights"),
        &[Value::Float(0.5), Value::Float(1.5), Value::Float(3.0)]
    );
}

#[test]
fn test_capacity_eviction_keeps_cap_entries() {
    let cap = 100;
    let original = document();
    let mut doc = original.clone();
    let mut history = CommandHistory::with_config(HistoryConfig::with_limit(cap));

    for i in 0..=cap {
        history.execute(push_weight(i as f64), &mut doc).unwrap();
    }
    assert_eq!(history.len(), cap);
    assert_eq!(history.undo_levels(), cap);

    while let UndoOutcome::Undone(_) = history.undo(&mut doc).unwrap() {}

    // The first append was evicted and stays applied
    assert_ne!(doc, original);
    assert_eq!(
        doc.repeated("weights"),
        &[Value::Float(0.5), Value::Float(1.5), Value::Float(0.0)]
    );
    assert_eq!(history.undo(&mut doc).unwrap(), UndoOutcome::NothingToUndo);
}

#[test]
fn test_eviction_clamps_clean_mark_to_zero() {
    let mut doc = document();
    let mut history = CommandHistory::with_config(HistoryConfig::with_limit(3));

    history.execute(push_weight(1.0), &mut doc).unwrap();
    history.mark_clean();
    assert_eq!(history.clean_mark(), 1);

    for w in [2.0, 3.0, 4.0] {
        history.execute(push_weight(w), &mut doc).unwrap();
    }
    assert_eq!(history.clean_mark(), 0);

    history.execute(push_weight(5.0), &mut doc).unwrap();
    assert_eq!(history.clean_mark(), 0);
    assert_eq!(history.len(), 3);
    assert!(history.is_dirty());
}

#[test]
fn test_dirty_follows_cursor_relative_to_clean_mark() {
    let mut doc = document();
    let mut history = CommandHistory::new();
    assert!(!history.is_dirty());

    history.execute(push_weight(1.0), &mut doc).unwrap();
    history.execute(push_weight(2.0), &mut doc).unwrap();
    assert!(history.is_dirty());

    history.mark_clean();
    assert!(!history.is_dirty());

    history.undo(&mut doc).unwrap();
    assert!(history.is_dirty());
    history.redo(&mut doc).unwrap();
    assert!(!history.is_dirty());
}

#[test]
fn test_length_heuristic_reports_clean_after_divergent_edit() {
    let mut doc = document();
    let mut history = CommandHistory::new();

    history.execute(push_weight(1.0), &mut doc).unwrap();
    history.mark_clean();
    history.undo(&mut doc).unwrap();
    history.execute(push_weight(9.0), &mut doc).unwrap();

    // Content differs from the saved state but the position matches
    assert!(!history.is_dirty());
}

#[test]
fn test_nested_edits_undo_in_order() {
    let original = document();
    let mut doc = original.clone();
    let mut history = CommandHistory::new();
    let second = FieldPath::parse("points[1]").unwrap();

    history
        .execute(
            Mutation::set_field(second.clone(), "y", Value::Int(4)),
            &mut doc,
        )
        .unwrap();
    history
        .execute(
            Mutation::MoveElement {
                target: FieldPath::root(),
                field: "points".to_string(),
                from: 1,
                to: 0,
            },
            &mut doc,
        )
        .unwrap();
    history
        .execute(
            Mutation::remove(FieldPath::root(), "points", 1),
            &mut doc,
        )
        .unwrap();

    let remaining = doc.repeated("points");
    assert_eq!(remaining.len(), 1);
    let point = remaining[0].as_message().unwrap();
    assert_eq!(point.get("x"), Some(&Value::Int(3)));
    assert_eq!(point.get("y"), Some(&Value::Int(4)));

    for _ in 0..3 {
        history.undo(&mut doc).unwrap();
    }
    assert_eq!(doc, original);

    for _ in 0..3 {
        history.redo(&mut doc).unwrap();
    }
    assert_eq!(doc.repeated("points").len(), 1);
}

#[test]
fn test_clear_and_restore_repeated_field() {
    let original = document();
    let mut doc = original.clone();
    let mut history = CommandHistory::new();

    history
        .execute(Mutation::clear_field(FieldPath::root(), "points"), &mut doc)
        .unwrap();
    assert!(doc.repeated("points").is_empty());
    assert!(!doc.has("points"));

    history.undo(&mut doc).unwrap();
    assert_eq!(doc, original);
}
