use serde::{Deserialize, Serialize};

/// A typed value in the configuration tree.
///
/// Objects and arrays are the only containers. Children are kept in
/// insertion order; order is semantically significant and is the addressing
/// scheme for structural edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(Vec<Node>),
}

/// A single keyed element of the configuration tree.
///
/// Duplicate keys among siblings are legal; identity is positional, not by
/// key uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub value: Value,
}

impl Node {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Root node of a brand-new document.
    pub fn empty_object() -> Self {
        Self::new("", Value::Object(Vec::new()))
    }

    /// Child at `index`, for object-valued nodes.
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.value.as_object().and_then(|children| children.get(index))
    }

    /// First child whose key equals `key`, for object-valued nodes.
    pub fn find_key(&self, key: &str) -> Option<&Node> {
        self.value
            .as_object()
            .and_then(|children| children.iter().find(|n| n.key == key))
    }
}

impl Value {
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[Node]> {
        match self {
            Value::Object(children) => Some(children),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Value::Object(children) => Some(children),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access_mismatch_is_none() {
        let v = Value::String("x".to_string());
        assert!(v.as_array().is_none());
        assert!(v.as_object().is_none());
        assert_eq!(v.as_str(), Some("x"));
    }

    #[test]
    fn test_find_key_returns_first_match() {
        let root = Node::new(
            "",
            Value::Object(vec![
                Node::new("a", Value::Number(1.0)),
                Node::new("a", Value::Number(2.0)),
            ]),
        );
        assert_eq!(root.find_key("a").unwrap().value.as_number(), Some(1.0));
        assert!(root.find_key("b").is_none());
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let root = Node::empty_object();
        assert!(root.get(0).is_none());
    }
}
