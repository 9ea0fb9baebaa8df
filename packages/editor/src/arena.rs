//! Node arena with stable handles.
//!
//! The live tree is stored as a flat map from `NodeId` to node data, with
//! container children held as ordered handle lists. Moving a node between
//! containers moves its handle, so "same node, new position" holds without
//! shared ownership. Nodes detached by an edit stay in the arena, owned by
//! the command that detached them, so undo can re-attach the original node.

use kvedit_parser::{Node, Value};
use std::collections::HashMap;

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Value of an arena node. Containers hold handles instead of owned children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<NodeId>),
    Object(Vec<NodeId>),
}

impl NodeValue {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeValue::Array(_) | NodeValue::Object(_))
    }

    pub fn children(&self) -> Option<&[NodeId]> {
        match self {
            NodeValue::Array(ids) | NodeValue::Object(ids) => Some(ids),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeValue::Array(ids) | NodeValue::Object(ids) => Some(ids),
            _ => None,
        }
    }
}

/// One node in the arena. Array items carry an empty key.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub key: String,
    pub value: NodeValue,
}

/// Flat storage for one document's tree.
#[derive(Debug)]
pub struct NodeArena {
    nodes: HashMap<NodeId, NodeData>,
    next_id: u64,
    root: NodeId,
}

impl NodeArena {
    /// Arena holding just an empty root object.
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: NodeId(0),
        };
        arena.root = arena.alloc(String::new(), NodeValue::Object(Vec::new()));
        arena
    }

    /// Build an arena from a parsed tree.
    pub fn from_ast(root: &Node) -> Self {
        let mut arena = Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: NodeId(0),
        };
        arena.root = arena.alloc_node(root);
        arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(&id)
    }

    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(&id).and_then(|n| n.value.children())
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).map(|c| c.len()).unwrap_or(0)
    }

    /// Position of `child` within `parent`, if attached there.
    pub fn position_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent)?.iter().position(|&c| c == child)
    }

    fn alloc(&mut self, key: String, value: NodeValue) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeData { key, value });
        id
    }

    /// Allocate a detached subtree from a parsed node.
    pub fn alloc_node(&mut self, node: &Node) -> NodeId {
        let value = self.alloc_value(&node.value);
        self.alloc(node.key.clone(), value)
    }

    /// Allocate a detached subtree from a keyless value (array item).
    pub fn alloc_item(&mut self, value: &Value) -> NodeId {
        let value = self.alloc_value(value);
        self.alloc(String::new(), value)
    }

    fn alloc_value(&mut self, value: &Value) -> NodeValue {
        match value {
            Value::String(s) => NodeValue::String(s.clone()),
            Value::Number(n) => NodeValue::Number(*n),
            Value::Boolean(b) => NodeValue::Boolean(*b),
            Value::Array(items) => {
                let ids = items.iter().map(|v| self.alloc_item(v)).collect();
                NodeValue::Array(ids)
            }
            Value::Object(children) => {
                let ids = children.iter().map(|n| self.alloc_node(n)).collect();
                NodeValue::Object(ids)
            }
        }
    }

    /// Convert a subtree back into a parsed node. Array items converted this
    /// way keep their (empty) keys.
    pub fn to_ast(&self, id: NodeId) -> Option<Node> {
        let data = self.nodes.get(&id)?;
        let value = self.value_to_ast(&data.value)?;
        Some(Node::new(data.key.clone(), value))
    }

    fn value_to_ast(&self, value: &NodeValue) -> Option<Value> {
        Some(match value {
            NodeValue::String(s) => Value::String(s.clone()),
            NodeValue::Number(n) => Value::Number(*n),
            NodeValue::Boolean(b) => Value::Boolean(*b),
            NodeValue::Array(ids) => {
                let mut items = Vec::with_capacity(ids.len());
                for &id in ids {
                    items.push(self.value_to_ast(&self.nodes.get(&id)?.value)?);
                }
                Value::Array(items)
            }
            NodeValue::Object(ids) => {
                let mut children = Vec::with_capacity(ids.len());
                for &id in ids {
                    children.push(self.to_ast(id)?);
                }
                Value::Object(children)
            }
        })
    }

    /// Deep clone of a subtree; the clone gets fresh handles throughout.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let ast = self.to_ast(id)?;
        Some(self.alloc_node(&ast))
    }

    /// Attach a detached node under `parent` at `index`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        let Some(children) = self
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.value.children_mut())
        else {
            return false;
        };
        if index > children.len() {
            return false;
        }
        children.insert(index, child);
        true
    }

    /// Detach `child` from `parent` and return its former position.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<usize> {
        let children = self
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.value.children_mut())?;
        let pos = children.iter().position(|&c| c == child)?;
        children.remove(pos);
        Some(pos)
    }

    /// Replace a node's value in place, allocating container children as
    /// needed. The previous value's detached children stay in the arena until
    /// the document is disposed.
    pub fn set_value(&mut self, id: NodeId, value: &Value) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        let new_value = self.alloc_value(value);
        if let Some(data) = self.nodes.get_mut(&id) {
            data.value = new_value;
            true
        } else {
            false
        }
    }

    /// First child of `parent` whose key equals `key`.
    pub fn find_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.children(parent)?
            .iter()
            .copied()
            .find(|&c| self.nodes.get(&c).map(|n| n.key == key).unwrap_or(false))
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvedit_parser::parse;

    #[test]
    fn test_ast_round_trip_through_arena() {
        let root = parse("a = 1\nb = { c = \"x\" }\nd = [ 1, 2 ]").unwrap();
        let arena = NodeArena::from_ast(&root);
        assert_eq!(arena.to_ast(arena.root()).unwrap(), root);
    }

    #[test]
    fn test_move_preserves_identity() {
        let root = parse("a = 1\nb = 2").unwrap();
        let mut arena = NodeArena::from_ast(&root);
        let r = arena.root();
        let a = arena.children(r).unwrap()[0];

        let pos = arena.remove_child(r, a).unwrap();
        assert_eq!(pos, 0);
        assert!(arena.insert_child(r, 1, a));

        assert_eq!(arena.position_of(r, a), Some(1));
        assert_eq!(arena.get(a).unwrap().key, "a");
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let root = parse("entry = { inner = \"x\" }").unwrap();
        let mut arena = NodeArena::from_ast(&root);
        let entry = arena.children(arena.root()).unwrap()[0];

        let clone = arena.clone_subtree(entry).unwrap();
        assert_ne!(clone, entry);

        let inner = arena.find_key(entry, "inner").unwrap();
        arena.get_mut(inner).unwrap().value = NodeValue::String("changed".to_string());

        let cloned_inner = arena.find_key(clone, "inner").unwrap();
        assert_eq!(
            arena.get(cloned_inner).unwrap().value,
            NodeValue::String("x".to_string())
        );
    }

    #[test]
    fn test_insert_out_of_range_is_rejected() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let node = arena.alloc_node(&Node::new("k", Value::Number(1.0)));
        assert!(!arena.insert_child(root, 5, node));
        assert_eq!(arena.child_count(root), 0);
    }
}
