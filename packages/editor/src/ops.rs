//! Tagged edit operations with explicit apply/invert.
//!
//! Every user-visible mutation is one `Command` holding one `EditOp`. Undo
//! applies `invert(op)`, redo applies `op` again. The ops carry node handles
//! rather than captured closures, so the log can be inspected in tests.

use crate::arena::{NodeArena, NodeId};
use kvedit_parser::Value;
use thiserror::Error;

/// One undoable mutation with a human-readable label for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub label: String,
    pub op: EditOp,
}

impl Command {
    pub fn new(label: impl Into<String>, op: EditOp) -> Self {
        Self {
            label: label.into(),
            op,
        }
    }
}

/// Structural edit operations.
///
/// `entries` lists are `(index, node)` pairs sorted by ascending index; each
/// index is valid at the moment that entry is inserted/removed.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Attach detached nodes at the recorded indices.
    Insert {
        parent: NodeId,
        entries: Vec<(usize, NodeId)>,
    },

    /// Detach the recorded nodes. Removal is by handle, not by index; the
    /// recorded indices are kept so the inverse can re-attach precisely.
    Remove {
        parent: NodeId,
        entries: Vec<(usize, NodeId)>,
    },

    Rename {
        node: NodeId,
        from: String,
        to: String,
    },

    /// Replace a node's value. Snapshots are plain parsed values, deep for
    /// container replacements.
    Update {
        node: NodeId,
        from: Value,
        to: Value,
    },

    /// Detach `nodes` and reinsert them adjacent to `target`. The insertion
    /// index is recomputed from the target's position at apply time, after
    /// the removal step, never from a captured index.
    Move {
        parent: NodeId,
        nodes: Vec<NodeId>,
        origin: Vec<usize>,
        target: NodeId,
        before: bool,
    },

    /// Put nodes back at their recorded indices, detaching them first if
    /// attached. Produced as the inverse of `Move`.
    Restore {
        parent: NodeId,
        entries: Vec<(usize, NodeId)>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Node not found in arena")]
    NodeNotFound,

    #[error("Node is not attached to the expected parent")]
    NotAttached,

    #[error("Index {index} out of range (container holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Target node is no longer present in the container")]
    TargetMissing,

    #[error("Node is not a container")]
    NotAContainer,
}

/// Apply an op to the arena.
pub fn apply(arena: &mut NodeArena, op: &EditOp) -> Result<(), EditError> {
    match op {
        EditOp::Insert { parent, entries } => {
            for &(index, node) in entries {
                let len = arena.child_count(*parent);
                if index > len {
                    return Err(EditError::IndexOutOfRange { index, len });
                }
                if !arena.insert_child(*parent, index, node) {
                    return Err(EditError::NotAContainer);
                }
            }
            Ok(())
        }

        EditOp::Remove { parent, entries } => {
            for &(_, node) in entries {
                arena
                    .remove_child(*parent, node)
                    .ok_or(EditError::NotAttached)?;
            }
            Ok(())
        }

        EditOp::Rename { node, to, .. } => {
            let data = arena.get_mut(*node).ok_or(EditError::NodeNotFound)?;
            data.key = to.clone();
            Ok(())
        }

        EditOp::Update { node, to, .. } => {
            if !arena.set_value(*node, to) {
                return Err(EditError::NodeNotFound);
            }
            Ok(())
        }

        EditOp::Move {
            parent,
            nodes,
            target,
            before,
            ..
        } => {
            for &node in nodes {
                arena
                    .remove_child(*parent, node)
                    .ok_or(EditError::NotAttached)?;
            }
            // Removing preceding siblings shifted everything after them, so
            // the anchor is wherever the target sits now.
            let anchor = arena
                .position_of(*parent, *target)
                .ok_or(EditError::TargetMissing)?;
            let insert_at = if *before { anchor } else { anchor + 1 };
            for (offset, &node) in nodes.iter().enumerate() {
                if !arena.insert_child(*parent, insert_at + offset, node) {
                    return Err(EditError::NotAContainer);
                }
            }
            Ok(())
        }

        EditOp::Restore { parent, entries } => {
            for &(_, node) in entries {
                arena.remove_child(*parent, node);
            }
            for &(index, node) in entries {
                let len = arena.child_count(*parent);
                if index > len {
                    return Err(EditError::IndexOutOfRange { index, len });
                }
                if !arena.insert_child(*parent, index, node) {
                    return Err(EditError::NotAContainer);
                }
            }
            Ok(())
        }
    }
}

/// Build the inverse op. Applying `invert(op)` after `apply(op)` restores the
/// tree that existed before the apply.
pub fn invert(op: &EditOp) -> EditOp {
    match op {
        EditOp::Insert { parent, entries } => EditOp::Remove {
            parent: *parent,
            entries: entries.clone(),
        },

        EditOp::Remove { parent, entries } => EditOp::Insert {
            parent: *parent,
            entries: entries.clone(),
        },

        EditOp::Rename { node, from, to } => EditOp::Rename {
            node: *node,
            from: to.clone(),
            to: from.clone(),
        },

        EditOp::Update { node, from, to } => EditOp::Update {
            node: *node,
            from: to.clone(),
            to: from.clone(),
        },

        EditOp::Move {
            parent,
            nodes,
            origin,
            ..
        } => EditOp::Restore {
            parent: *parent,
            entries: origin.iter().copied().zip(nodes.iter().copied()).collect(),
        },

        // Restore only ever appears as the transient inverse of a move; its
        // own inverse removes the restored nodes again.
        EditOp::Restore { parent, entries } => EditOp::Remove {
            parent: *parent,
            entries: entries.clone(),
        },
    }
}
