//! Property tests for apply/undo/redo sequences

use ddf_editor::{CommandHistory, FieldPath, HistoryConfig, Message, Mutation, Value};
use ddf_parser::{parse, serialize, FieldType, MessageSchema};
use proptest::prelude::*;

fn document() -> Message {
    let item = MessageSchema::builder("Item")
        .required("id", 1, FieldType::UInt32)
        .optional("label", 2, FieldType::String)
        .build()
        .unwrap();
    let schema = MessageSchema::builder("Inventory")
        .optional("title", 1, FieldType::String)
        .optional("count", 2, FieldType::Int64)
        .repeated("items", 3, FieldType::Message(item))
        .repeated("tags", 4, FieldType::String)
        .build()
        .unwrap();

    parse(
        r#"title: "base" items { id: 1 label: "a" } items { id: 2 } tags: "x""#,
        &schema,
    )
    .unwrap()
}

/// Build a mutation that is valid for the current state from a random seed
fn mutation_for(doc: &Message, kind: u8, seed: usize, text: &str) -> Mutation {
    let root = FieldPath::root();
    let tags = doc.repeated("tags").len();
    let items = doc.repeated("items").len();

    match kind % 9 {
        0 => Mutation::set_field(root, "title", text),
        1 => Mutation::clear_field(root, "title"),
        2 => Mutation::set_field(root, "count", Value::Int(seed as i64)),
        3 => Mutation::append(root, "tags", text),
        4 => Mutation::InsertElement {
            target: root,
            field: "tags".to_string(),
            index: seed % (tags + 1),
            value: text.into(),
        },
        5 if tags > 0 => Mutation::remove(root, "tags", seed % tags),
        6 if tags > 1 => Mutation::MoveElement {
            target: root,
            field: "tags".to_string(),
            from: seed % tags,
            to: (seed / 2) % tags,
        },
        7 if items > 0 => Mutation::set_field(
            FieldPath::root().field("items").index(seed % items),
            "label",
            text,
        ),
        8 if tags > 0 => Mutation::SetElement {
            target: root,
            field: "tags".to_string(),
            index: seed % tags,
            value: text.into(),
        },
        _ => Mutation::clear_field(root, "tags"),
    }
}

proptest! {
    #[test]
    fn apply_then_undo_all_restores_document(
        ops in prop::collection::vec((any::<u8>(), 0usize..64, "[a-z]{1,4}"), 1..40)
    ) {
        let original = document();
        let mut doc = original.clone();
        let mut history = CommandHistory::with_config(HistoryConfig::unlimited());

        for (kind, seed, text) in &ops {
            let mutation = mutation_for(&doc, *kind, *seed, text);
            history.execute(mutation, &mut doc).unwrap();
        }

        while history.can_undo() {
            history.undo(&mut doc).unwrap();
        }
        prop_assert_eq!(&doc, &original);
        prop_assert_eq!(serialize(&doc), serialize(&original));
    }

    #[test]
    fn redo_all_reaches_final_state(
        ops in prop::collection::vec((any::<u8>(), 0usize..64, "[a-z]{1,4}"), 1..30)
    ) {
        let mut doc = document();
        let mut history = CommandHistory::with_config(HistoryConfig::unlimited());

        for (kind, seed, text) in &ops {
            let mutation = mutation_for(&doc, *kind, *seed, text);
            history.execute(mutation, &mut doc).unwrap();
        }
        let edited = doc.clone();

        while history.can_undo() {
            history.undo(&mut doc).unwrap();
        }
        while history.can_redo() {
            history.redo(&mut doc).unwrap();
        }
        prop_assert_eq!(doc, edited);
        prop_assert!(!history.can_redo());
    }

    #[test]
    fn dirty_matches_cursor_against_clean_mark(
        steps in prop::collection::vec(0u8..4, 1..50),
        limit in 1usize..8,
    ) {
        let mut doc = document();
        let mut history = CommandHistory::with_config(HistoryConfig::with_limit(limit));

        for (i, step) in steps.iter().enumerate() {
            match step {
                0 => {
                    history
                        .execute(Mutation::set_field(FieldPath::root(), "count", Value::Int(i as i64)), &mut doc)
                        .unwrap();
                }
                1 => { history.undo(&mut doc).unwrap(); }
                2 => { history.redo(&mut doc).unwrap(); }
                _ => history.mark_clean(),
            }
            prop_assert!(history.len() <= limit);
            prop_assert!(history.cursor() <= history.len());
            prop_assert_eq!(history.is_dirty(), history.cursor() != history.clean_mark());
        }
    }
}
