use kvedit_editor::{Document, EditorError};
use kvedit_parser::Value;

const SOUNDS: &str = r#"
Hit007 = {
    type = "impact"
    values = [1, 2]
}
Hit008 = {
    type = "impact"
    values = []
}
Footstep = {
    type = "foley"
    values = []
}
"#;

fn doc(source: &str) -> Document {
    Document::from_source(source).expect("source should parse")
}

fn root_keys(doc: &Document) -> Vec<String> {
    let root = doc.root();
    (0..doc.len(root))
        .map(|i| doc.key_at(root, i).unwrap())
        .collect()
}

#[test]
fn test_new_entry_default_shape() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    let index = d.new_entry(root, 0, "Whoosh").unwrap();
    assert_eq!(index, 0);
    assert_eq!(root_keys(&d), ["Whoosh", "Hit007", "Hit008", "Footstep"]);

    let text = d.source();
    assert!(text.contains("Whoosh = {"));
    assert!(text.contains("type = \"\""));
    assert!(text.contains("values = []"));
}

#[test]
fn test_undo_redo_restore_exact_text() {
    let mut d = doc(SOUNDS);
    let before = d.source();
    let root = d.root();

    d.new_entry(root, 3, "Whoosh").unwrap();
    let after = d.source();
    assert_ne!(before, after);

    assert!(d.undo().unwrap());
    assert_eq!(d.source(), before);
    assert!(d.redo().unwrap());
    assert_eq!(d.source(), after);
}

#[test]
fn test_multi_delete_order_independence() {
    let mut a = doc(SOUNDS);
    let mut b = doc(SOUNDS);
    a.remove_entries(a.root(), &[0, 2]).unwrap();
    b.remove_entries(b.root(), &[2, 0]).unwrap();
    assert_eq!(a.source(), b.source());
    assert_eq!(root_keys(&a), ["Hit008"]);
}

#[test]
fn test_remove_undo_restores_original_positions() {
    let mut d = doc(SOUNDS);
    d.remove_entries(d.root(), &[2, 0]).unwrap();
    assert!(d.undo().unwrap());
    assert_eq!(root_keys(&d), ["Hit007", "Hit008", "Footstep"]);
}

#[test]
fn test_duplicate_numbering() {
    let mut d = doc(SOUNDS);
    let root = d.root();

    let added = d.duplicate_entries(root, &[0]).unwrap();
    assert_eq!(added, [1]);
    assert_eq!(d.key_at(root, 1).unwrap(), "Hit009");

    let added = d.duplicate_entries(root, &[3]).unwrap();
    assert_eq!(d.key_at(root, added[0]).unwrap(), "Footstep1");
}

#[test]
fn test_duplicate_width_grows_past_padding() {
    let mut d = doc("Hit099 = { type = \"impact\"\n values = [] }\n");
    let root = d.root();
    d.duplicate_entries(root, &[0]).unwrap();
    assert_eq!(d.key_at(root, 1).unwrap(), "Hit100");
}

#[test]
fn test_duplicate_batch_sees_earlier_clones() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    // Duplicating Hit007 and Hit008 together must yield distinct successors.
    let added = d.duplicate_entries(root, &[0, 1]).unwrap();
    assert_eq!(added, [1, 3]);
    assert_eq!(d.key_at(root, 1).unwrap(), "Hit009");
    assert_eq!(d.key_at(root, 3).unwrap(), "Hit010");
}

#[test]
fn test_move_recomputes_anchor_after_removal() {
    let mut d = doc("A = 1\nB = 2\nC = 3\nD = 4\n");
    let root = d.root();
    let before = d.source();

    // Move A after C: [A, B, C, D] becomes [B, C, A, D].
    let new_indices = d.move_entries(root, &[0], 2, false).unwrap();
    assert_eq!(new_indices, [2]);
    assert_eq!(root_keys(&d), ["B", "C", "A", "D"]);

    assert!(d.undo().unwrap());
    assert_eq!(d.source(), before);
}

#[test]
fn test_move_excludes_target_from_selection() {
    let mut d = doc("A = 1\nB = 2\nC = 3\nD = 4\n");
    let root = d.root();
    let moved = d.move_entries(root, &[0, 2], 2, false).unwrap();
    assert_eq!(moved, [2]);
    assert_eq!(root_keys(&d), ["B", "C", "A", "D"]);
}

#[test]
fn test_move_before_target() {
    let mut d = doc("A = 1\nB = 2\nC = 3\nD = 4\n");
    let root = d.root();
    d.move_entries(root, &[3], 1, true).unwrap();
    assert_eq!(root_keys(&d), ["A", "D", "B", "C"]);
}

#[test]
fn test_copy_paste_independence() {
    let mut d = doc(SOUNDS);
    let root = d.root();

    let text = d.copy_entries(root, &[0]).unwrap();
    assert!(text.contains("Hit007"));
    assert!(d.can_paste());

    // Mutating the source after copy must not affect the buffered snapshot.
    d.change_value(root, 0, "type", Value::String("sweep".into()))
        .unwrap();

    let pasted = d.paste_entries(root, 2).unwrap();
    assert_eq!(pasted, [3]);
    assert_eq!(d.key_at(root, 3).unwrap(), "Hit007");
    let text = d.source();
    assert!(text.contains("\"impact\""));
}

#[test]
fn test_repeated_pastes_are_independent_clones() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    d.copy_entries(root, &[0]).unwrap();

    d.paste_entries(root, 2).unwrap();
    d.paste_entries(root, 3).unwrap();
    assert_eq!(
        root_keys(&d),
        ["Hit007", "Hit008", "Footstep", "Hit007", "Hit007"]
    );

    // Editing one clone leaves the other untouched.
    d.rename_entry(root, 4, "Hit300").unwrap();
    assert_eq!(d.key_at(root, 3).unwrap(), "Hit007");
}

#[test]
fn test_paste_survives_revert() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    d.copy_entries(root, &[2]).unwrap();

    d.revert("Only = 1\n").unwrap();
    assert!(d.can_paste());
    let root = d.root();
    d.paste_entries(root, 0).unwrap();
    assert_eq!(root_keys(&d), ["Only", "Footstep"]);
}

#[test]
fn test_paste_into_empty_document() {
    let mut d = doc(SOUNDS);
    d.copy_entries(d.root(), &[0]).unwrap();

    d.revert("").unwrap();
    let root = d.root();
    let pasted = d.paste_entries(root, 0).unwrap();
    assert_eq!(pasted, [0]);
}

#[test]
fn test_paste_with_empty_clipboard_fails() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    assert!(matches!(
        d.paste_entries(root, 0),
        Err(EditorError::EmptyClipboard)
    ));
}

#[test]
fn test_rename_trims_and_undoes_to_exact_key() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    let applied = d.rename_entry(root, 2, "  Footstep_Grass  ").unwrap();
    assert_eq!(applied, "Footstep_Grass");
    assert_eq!(d.key_at(root, 2).unwrap(), "Footstep_Grass");

    assert!(d.undo().unwrap());
    assert_eq!(d.key_at(root, 2).unwrap(), "Footstep");
}

#[test]
fn test_rename_to_same_key_pushes_nothing() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    d.rename_entry(root, 0, "Hit007").unwrap();
    assert!(!d.can_undo());
}

#[test]
fn test_change_value_updates_existing_field() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    d.change_value(root, 0, "type", Value::String("sweep".into()))
        .unwrap();
    assert!(d.source().contains("type = \"sweep\""));

    assert!(d.undo().unwrap());
    assert!(d.source().contains("type = \"impact\""));
}

#[test]
fn test_change_value_creates_missing_field() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    d.change_value(root, 0, "volume", Value::Number(0.8)).unwrap();
    assert!(d.source().contains("volume = 0.8"));

    // Undo removes the created field entirely.
    assert!(d.undo().unwrap());
    assert!(!d.source().contains("volume"));
}

#[test]
fn test_sub_array_operations() {
    let mut d = doc(SOUNDS);
    let array = d.resolve_array(0, "values").unwrap();
    assert_eq!(d.len(array), 2);

    d.new_entry(array, 2, "").unwrap();
    assert_eq!(d.len(array), 3);
    assert_eq!(d.undo_label(), Some("New item"));

    d.remove_entries(array, &[0]).unwrap();
    assert_eq!(d.len(array), 2);

    // Array items duplicate without any key rewriting.
    let added = d.duplicate_entries(array, &[0]).unwrap();
    assert_eq!(added, [1]);
    assert_eq!(d.len(array), 3);
}

#[test]
fn test_resolve_array_rejects_non_array_field() {
    let d = doc(SOUNDS);
    assert!(matches!(
        d.resolve_array(0, "type"),
        Err(EditorError::NotAContainer)
    ));
    assert!(matches!(
        d.resolve_array(0, "missing"),
        Err(EditorError::StructuralConflict(_))
    ));
}

#[test]
fn test_stale_index_is_a_conflict() {
    let mut d = doc(SOUNDS);
    let root = d.root();
    assert!(matches!(
        d.remove_entries(root, &[7]),
        Err(EditorError::StructuralConflict(_))
    ));
    // Document state is untouched after the conflict.
    assert_eq!(d.len(root), 3);
    assert!(!d.can_undo());
}

#[test]
fn test_dirty_tracking_follows_save_mark() {
    let mut d = doc(SOUNDS);
    assert!(!d.is_dirty());

    d.rename_entry(d.root(), 0, "Hit700").unwrap();
    assert!(d.is_dirty());

    d.mark_saved();
    assert!(!d.is_dirty());

    d.undo().unwrap();
    assert!(d.is_dirty());
    d.redo().unwrap();
    assert!(!d.is_dirty());
}

#[test]
fn test_dirty_after_undoing_past_save_then_editing() {
    let mut d = doc(SOUNDS);
    let saved = {
        d.rename_entry(d.root(), 0, "Hit700").unwrap();
        d.mark_saved();
        d.source()
    };

    d.undo().unwrap();
    d.rename_entry(d.root(), 1, "Hit800").unwrap();

    assert_ne!(d.source(), saved);
    assert!(d.is_dirty());
}

#[test]
fn test_version_bumps_on_every_change() {
    let mut d = doc(SOUNDS);
    let v0 = d.version();
    d.rename_entry(d.root(), 0, "Hit700").unwrap();
    assert!(d.version() > v0);
    let v1 = d.version();
    d.undo().unwrap();
    assert!(d.version() > v1);
}
