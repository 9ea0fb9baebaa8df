use crate::ast::{Node, Value};
use std::fmt::Write;

/// Serializer converts the tree back to source text.
///
/// Output is deterministic. Whitespace and quoting are normalized, so a
/// round trip is semantically stable rather than byte-identical.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "    ".to_string(), // 4 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a root node. The root's children are emitted as top-level
    /// `key = value` pairs without enclosing braces.
    pub fn serialize(&mut self, root: &Node) -> String {
        let mut output = String::new();

        if let Some(children) = root.value.as_object() {
            for child in children {
                self.serialize_pair(child, &mut output);
            }
        } else {
            // A non-object root is serialized as a single value.
            self.serialize_value(&root.value, &mut output);
            output.push('\n');
        }

        output
    }

    /// Serialize a subtree rooted at one node, e.g. for clipboard text.
    /// Keyless nodes (array items) are emitted as a bare value.
    pub fn serialize_node(&mut self, node: &Node) -> String {
        let mut output = String::new();
        if node.key.is_empty() {
            self.serialize_value(&node.value, &mut output);
            output.push('\n');
        } else {
            self.serialize_pair(node, &mut output);
        }
        output
    }

    fn serialize_pair(&mut self, node: &Node, output: &mut String) {
        self.write_indent(output);
        self.write_key(&node.key, output);
        output.push_str(" = ");
        self.serialize_value(&node.value, output);
        output.push('\n');
    }

    fn serialize_value(&mut self, value: &Value, output: &mut String) {
        match value {
            Value::String(s) => self.write_quoted(s, output),

            Value::Number(n) => {
                // Integral values round-trip without a trailing ".0".
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(output, "{}", *n as i64).unwrap();
                } else {
                    write!(output, "{}", n).unwrap();
                }
            }

            Value::Boolean(b) => output.push_str(if *b { "true" } else { "false" }),

            Value::Array(items) => {
                if items.is_empty() {
                    output.push_str("[]");
                    return;
                }
                output.push_str("[\n");
                self.indent_level += 1;
                for item in items {
                    self.write_indent(output);
                    self.serialize_value(item, output);
                    output.push_str(",\n");
                }
                self.indent_level -= 1;
                self.write_indent(output);
                output.push(']');
            }

            Value::Object(children) => {
                if children.is_empty() {
                    output.push_str("{}");
                    return;
                }
                output.push_str("{\n");
                self.indent_level += 1;
                for child in children {
                    self.serialize_pair(child, output);
                }
                self.indent_level -= 1;
                self.write_indent(output);
                output.push('}');
            }
        }
    }

    /// Keys stay bare when they tokenize as identifiers, otherwise they are
    /// quoted.
    fn write_key(&self, key: &str, output: &mut String) {
        let bare = !key.is_empty()
            && key
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        if bare {
            output.push_str(key);
        } else {
            self.write_quoted(key, output);
        }
    }

    fn write_quoted(&self, text: &str, output: &mut String) {
        output.push('"');
        for c in text.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                _ => output.push(c),
            }
        }
        output.push('"');
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to serialize a document root.
pub fn serialize(root: &Node) -> String {
    let mut serializer = Serializer::new();
    serializer.serialize(root)
}
