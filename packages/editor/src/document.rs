//! Document controller.
//!
//! Domain operations over the node arena, each wrapped in exactly one
//! command on the undo log. Operations take positional indices valid at call
//! time and return the updated indices a view needs to re-highlight rows.
//! Stale indices produce a recoverable `StructuralConflict`, never a panic.

use crate::arena::{NodeArena, NodeId, NodeValue};
use crate::errors::EditorError;
use crate::ops::{Command, EditOp};
use crate::undo_stack::UndoStack;
use kvedit_parser::{parse, Node, Serializer, Value};

/// An editable document: arena tree, undo log and document-scoped clipboard.
#[derive(Debug)]
pub struct Document {
    arena: NodeArena,
    history: UndoStack,

    /// Deep-clone snapshots taken at copy time. Stored as parsed nodes so the
    /// buffer is independent of the arena and survives revert.
    clipboard: Vec<Node>,

    /// Increments on every applied, undone or redone command.
    version: u64,
}

impl Document {
    /// Parse source text into an editable document. Empty input yields an
    /// empty root object.
    pub fn from_source(source: &str) -> Result<Self, EditorError> {
        let root = parse(source)?;
        Ok(Self {
            arena: NodeArena::from_ast(&root),
            history: UndoStack::new(),
            clipboard: Vec::new(),
            version: 0,
        })
    }

    /// Brand-new unsaved document.
    pub fn new_empty() -> Self {
        Self {
            arena: NodeArena::new(),
            history: UndoStack::new(),
            clipboard: Vec::new(),
            version: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.arena.root()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    /// Serialize the full current state.
    pub fn source(&self) -> String {
        self.arena
            .to_ast(self.arena.root())
            .map(|root| kvedit_parser::serialize(&root))
            .unwrap_or_default()
    }

    /// Replace the tree from a text snapshot, dropping all history. The
    /// clipboard buffer survives: its snapshots do not reference the arena.
    pub fn revert(&mut self, source: &str) -> Result<(), EditorError> {
        let root = parse(source)?;
        self.arena = NodeArena::from_ast(&root);
        self.history.clear();
        self.version += 1;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let changed = self.history.undo(&mut self.arena)?;
        if changed {
            self.version += 1;
        }
        Ok(changed)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let changed = self.history.redo(&mut self.arena)?;
        if changed {
            self.version += 1;
        }
        Ok(changed)
    }

    // Addressing

    /// Child of `parent` at `index`, or a conflict if the index went stale.
    pub fn resolve_child(&self, parent: NodeId, index: usize) -> Result<NodeId, EditorError> {
        self.arena
            .children(parent)
            .ok_or(EditorError::NotAContainer)?
            .get(index)
            .copied()
            .ok_or_else(|| EditorError::conflict(format!("no child at index {index}")))
    }

    /// Array-valued field `key` under the root entry at `entry_index`; the
    /// scope for sub-array element operations.
    pub fn resolve_array(&self, entry_index: usize, key: &str) -> Result<NodeId, EditorError> {
        let entry = self.resolve_child(self.arena.root(), entry_index)?;
        let field = self
            .arena
            .find_key(entry, key)
            .ok_or_else(|| EditorError::conflict(format!("entry has no field '{key}'")))?;
        match self.arena.get(field).map(|n| &n.value) {
            Some(NodeValue::Array(_)) => Ok(field),
            _ => Err(EditorError::NotAContainer),
        }
    }

    pub fn len(&self, parent: NodeId) -> usize {
        self.arena.child_count(parent)
    }

    pub fn is_empty(&self, parent: NodeId) -> bool {
        self.len(parent) == 0
    }

    /// Key of the child at `index` under `parent`.
    pub fn key_at(&self, parent: NodeId, index: usize) -> Result<String, EditorError> {
        let id = self.resolve_child(parent, index)?;
        Ok(self.arena.get(id).map(|n| n.key.clone()).unwrap_or_default())
    }

    // Structural operations

    /// Insert a new child at `index`. Under an object parent the child is an
    /// entry with the fixed default shape (a `type` string field plus an
    /// empty `values` array); under an array parent it is an empty string
    /// item.
    pub fn new_entry(&mut self, parent: NodeId, index: usize, key: &str) -> Result<usize, EditorError> {
        let len = self.len_checked(parent)?;
        if index > len {
            return Err(EditorError::conflict(format!(
                "insert index {index} out of range ({len})"
            )));
        }

        let key = key.trim();
        let (node, label) = match self.arena.get(parent).map(|n| &n.value) {
            Some(NodeValue::Object(_)) => (
                Node::new(
                    key,
                    Value::Object(vec![
                        Node::new("type", Value::String(String::new())),
                        Node::new("values", Value::Array(Vec::new())),
                    ]),
                ),
                format!("New entry '{key}'"),
            ),
            Some(NodeValue::Array(_)) => (
                Node::new("", Value::String(String::new())),
                "New item".to_string(),
            ),
            _ => return Err(EditorError::NotAContainer),
        };

        let id = self.arena.alloc_node(&node);
        self.push(
            label,
            EditOp::Insert {
                parent,
                entries: vec![(index, id)],
            },
        )?;
        Ok(index)
    }

    /// Remove the children at `indices`. Selection order does not matter; the
    /// removed nodes are captured so undo re-inserts each at its original
    /// index.
    pub fn remove_entries(
        &mut self,
        parent: NodeId,
        indices: &[usize],
    ) -> Result<Vec<usize>, EditorError> {
        let indices = self.sorted_valid_indices(parent, indices)?;
        let entries: Vec<(usize, NodeId)> = indices
            .iter()
            .map(|&i| Ok((i, self.resolve_child(parent, i)?)))
            .collect::<Result<_, EditorError>>()?;

        self.push(
            format!("Remove {} entries", entries.len()),
            EditOp::Remove { parent, entries },
        )?;
        Ok(indices)
    }

    /// Rename the child at `index`. Incoming text is trimmed; undo restores
    /// the exact previous key string.
    pub fn rename_entry(
        &mut self,
        parent: NodeId,
        index: usize,
        new_key: &str,
    ) -> Result<String, EditorError> {
        let node = self.resolve_child(parent, index)?;
        let from = self
            .arena
            .get(node)
            .map(|n| n.key.clone())
            .unwrap_or_default();
        let to = new_key.trim().to_string();

        if to != from {
            self.push(
                format!("Rename '{from}' to '{to}'"),
                EditOp::Rename { node, from, to: to.clone() },
            )?;
        }
        Ok(to)
    }

    /// Deep-clone the selection into the clipboard buffer and return the
    /// textual join of the serialized clones for the host to mirror to the
    /// system clipboard. Copy never pushes a command.
    pub fn copy_entries(
        &mut self,
        parent: NodeId,
        indices: &[usize],
    ) -> Result<String, EditorError> {
        let indices = self.sorted_valid_indices(parent, indices)?;
        let mut snapshots = Vec::with_capacity(indices.len());
        for &i in &indices {
            let id = self.resolve_child(parent, i)?;
            let ast = self
                .arena
                .to_ast(id)
                .ok_or_else(|| EditorError::conflict("selected node vanished"))?;
            snapshots.push(ast);
        }

        let mut serializer = Serializer::new();
        let text = snapshots
            .iter()
            .map(|n| serializer.serialize_node(n))
            .collect::<String>();

        self.clipboard = snapshots;
        Ok(text)
    }

    pub fn can_paste(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Clone the clipboard buffer again and insert the clones immediately
    /// after `after_index`. Returns the newly occupied indices.
    pub fn paste_entries(
        &mut self,
        parent: NodeId,
        after_index: usize,
    ) -> Result<Vec<usize>, EditorError> {
        if self.clipboard.is_empty() {
            return Err(EditorError::EmptyClipboard);
        }
        let len = self.len_checked(parent)?;
        let start = if len == 0 {
            0
        } else {
            if after_index >= len {
                return Err(EditorError::conflict(format!(
                    "paste anchor {after_index} out of range ({len})"
                )));
            }
            after_index + 1
        };

        let snapshots = self.clipboard.clone();
        let clones: Vec<NodeId> = snapshots.iter().map(|n| self.arena.alloc_node(n)).collect();
        let entries: Vec<(usize, NodeId)> = clones
            .iter()
            .enumerate()
            .map(|(i, &id)| (start + i, id))
            .collect();
        let new_indices = entries.iter().map(|&(i, _)| i).collect();

        self.push(
            format!("Paste {} entries", entries.len()),
            EditOp::Insert { parent, entries },
        )?;
        Ok(new_indices)
    }

    /// Move the selection adjacent to the child at `target_index`. The target
    /// itself is excluded from the moved set. Returns the selection's new
    /// indices.
    pub fn move_entries(
        &mut self,
        parent: NodeId,
        indices: &[usize],
        target_index: usize,
        insert_before: bool,
    ) -> Result<Vec<usize>, EditorError> {
        let target = self.resolve_child(parent, target_index)?;
        let indices = self.sorted_valid_indices(parent, indices)?;

        let mut origin = Vec::new();
        let mut nodes = Vec::new();
        for &i in &indices {
            if i == target_index {
                continue;
            }
            origin.push(i);
            nodes.push(self.resolve_child(parent, i)?);
        }
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let moved = nodes.clone();
        self.push(
            format!("Move {} entries", moved.len()),
            EditOp::Move {
                parent,
                nodes,
                origin,
                target,
                before: insert_before,
            },
        )?;

        Ok(moved
            .iter()
            .filter_map(|&id| self.arena.position_of(parent, id))
            .collect())
    }

    /// Duplicate each selected child, inserting the clone immediately after
    /// its source. Object entries get a successor key derived from the
    /// trailing-number scan over all current siblings; array items clone
    /// as-is. Returns the clones' indices.
    pub fn duplicate_entries(
        &mut self,
        parent: NodeId,
        indices: &[usize],
    ) -> Result<Vec<usize>, EditorError> {
        let indices = self.sorted_valid_indices(parent, indices)?;
        let keyed = matches!(
            self.arena.get(parent).map(|n| &n.value),
            Some(NodeValue::Object(_))
        );

        // Simulated sibling keys, updated as clones are assigned positions so
        // later duplicates in the same batch see earlier clones.
        let mut sibling_keys: Vec<String> = self
            .arena
            .children(parent)
            .ok_or(EditorError::NotAContainer)?
            .iter()
            .map(|&id| self.arena.get(id).map(|n| n.key.clone()).unwrap_or_default())
            .collect();

        let mut entries = Vec::with_capacity(indices.len());
        for (inserted, &source_index) in indices.iter().enumerate() {
            let source = self.resolve_child(parent, source_index)?;
            let mut ast = self
                .arena
                .to_ast(source)
                .ok_or_else(|| EditorError::conflict("selected node vanished"))?;

            // Earlier clones in this batch shift every later position.
            let insert_at = source_index + 1 + inserted;
            if keyed {
                ast.key = successor_key(&sibling_keys, &ast.key);
                sibling_keys.insert(insert_at, ast.key.clone());
            }

            let id = self.arena.alloc_node(&ast);
            entries.push((insert_at, id));
        }

        let new_indices = entries.iter().map(|&(i, _)| i).collect();
        self.push(
            format!("Duplicate {} entries", entries.len()),
            EditOp::Insert { parent, entries },
        )?;
        Ok(new_indices)
    }

    /// Set field `key` of the entry at `index` to `value`, creating the field
    /// when it does not exist. Undo restores the previous value or deletes
    /// the created field.
    pub fn change_value(
        &mut self,
        parent: NodeId,
        index: usize,
        key: &str,
        value: Value,
    ) -> Result<(), EditorError> {
        let entry = self.resolve_child(parent, index)?;
        if !matches!(
            self.arena.get(entry).map(|n| &n.value),
            Some(NodeValue::Object(_))
        ) {
            return Err(EditorError::NotAContainer);
        }

        if let Some(child) = self.arena.find_key(entry, key) {
            let from = self
                .arena
                .to_ast(child)
                .ok_or_else(|| EditorError::conflict("field vanished"))?
                .value;
            self.push(
                format!("Edit '{key}'"),
                EditOp::Update {
                    node: child,
                    from,
                    to: value,
                },
            )
        } else {
            let id = self.arena.alloc_node(&Node::new(key, value));
            let at = self.arena.child_count(entry);
            self.push(
                format!("Add '{key}'"),
                EditOp::Insert {
                    parent: entry,
                    entries: vec![(at, id)],
                },
            )
        }
    }

    /// Replace the value of an existing node in place. Used for keyless
    /// array items, where `change_value` has no field key to address.
    pub fn update_value(&mut self, node: NodeId, value: Value) -> Result<(), EditorError> {
        let from = self
            .arena
            .to_ast(node)
            .ok_or_else(|| EditorError::conflict("node vanished"))?
            .value;
        self.push(
            "Edit value".to_string(),
            EditOp::Update {
                node,
                from,
                to: value,
            },
        )
    }

    // Helpers

    fn push(&mut self, label: String, op: EditOp) -> Result<(), EditorError> {
        tracing::debug!(label = %label, "apply command");
        self.history.push(Command::new(label, op), &mut self.arena)?;
        self.version += 1;
        Ok(())
    }

    fn len_checked(&self, parent: NodeId) -> Result<usize, EditorError> {
        self.arena
            .children(parent)
            .map(|c| c.len())
            .ok_or(EditorError::NotAContainer)
    }

    /// Sort ascending, drop duplicates, and validate against the container
    /// length so multi-select operations are order-independent.
    fn sorted_valid_indices(
        &self,
        parent: NodeId,
        indices: &[usize],
    ) -> Result<Vec<usize>, EditorError> {
        let len = self.len_checked(parent)?;
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&max) = sorted.last() {
            if max >= len {
                return Err(EditorError::conflict(format!(
                    "index {max} out of range ({len})"
                )));
            }
        }
        Ok(sorted)
    }
}

/// Derive the key for a duplicate of `key` among `sibling_keys`.
///
/// The trailing decimal run of the key is the counter (a key without one
/// counts as 0 with the whole key as prefix). All siblings sharing the prefix
/// are scanned for the maximum counter; the new suffix is `max + 1`,
/// left-padded with zeros to the source's padding width. The width only grows
/// when the numeric value overflows it: `Hit007` → `Hit008`, `Hit099` →
/// `Hit100`, `Footstep` → `Footstep1`.
pub fn successor_key(sibling_keys: &[String], key: &str) -> String {
    let (prefix, digits) = split_trailing_digits(key);
    let zero_count = digits.chars().take_while(|&c| c == '0').count();
    let width = zero_count + 1;

    let mut max: u64 = parse_counter(digits);
    for sibling in sibling_keys {
        let (sib_prefix, sib_digits) = split_trailing_digits(sibling);
        if sib_prefix == prefix {
            max = max.max(parse_counter(sib_digits));
        }
    }

    format!("{prefix}{:0width$}", max + 1, width = width)
}

fn split_trailing_digits(key: &str) -> (&str, &str) {
    let split = key
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + key[i..].chars().next().map(char::len_utf8).unwrap_or(1))
        .unwrap_or(0);
    key.split_at(split)
}

fn parse_counter(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}
