//! Request routing for one open document.
//!
//! Labels are dispatched to controller operations; positional `args` are
//! decoded per label. Recoverable failures (a stale index, a malformed
//! argument) are logged and answered with a `null` result so the view can
//! resynchronize from the next update instead of crashing the session.

use crate::broadcaster::{Broadcaster, ViewId};
use crate::messages::{Request, Response, ViewMessage};
use kvedit_editor::{Document, EditorError};
use kvedit_parser::Value;
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;

/// One document plus its attached views.
#[derive(Debug)]
pub struct DocumentSession {
    document: Document,
    broadcaster: Broadcaster,
}

impl DocumentSession {
    pub fn open(source: &str) -> Result<Self, EditorError> {
        Ok(Self {
            document: Document::from_source(source)?,
            broadcaster: Broadcaster::new(),
        })
    }

    pub fn new_empty() -> Self {
        Self {
            document: Document::new_empty(),
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn attach_view(&mut self, sender: UnboundedSender<ViewMessage>) -> ViewId {
        self.broadcaster.attach(sender)
    }

    pub fn detach_view(&mut self, view: ViewId) {
        self.broadcaster.detach(view);
    }

    pub fn has_views(&self) -> bool {
        self.broadcaster.view_count() > 0
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn mark_saved(&mut self) {
        self.document.mark_saved();
    }

    /// Current serialized state, for the host's save and backup paths.
    pub fn snapshot(&self) -> String {
        self.document.source()
    }

    /// Replace the document from a text snapshot and resynchronize every
    /// attached view.
    pub fn revert(&mut self, source: &str) -> Result<(), EditorError> {
        self.document.revert(source)?;
        self.broadcast_state();
        Ok(())
    }

    /// Dispatch one request. The correlated response goes back on the
    /// requesting view's channel; when the document changed, every attached
    /// view additionally receives a full-state update.
    pub fn handle_request(&mut self, view: ViewId, request: Request) {
        let version_before = self.document.version();
        let result = match self.dispatch(view, &request) {
            Ok(result) => result,
            Err(error) if error.is_recoverable() => {
                tracing::warn!(label = %request.label, %error, "request degraded to no-op");
                serde_json::Value::Null
            }
            Err(error) => {
                tracing::error!(label = %request.label, %error, "request failed");
                serde_json::Value::Null
            }
        };

        self.broadcaster.send_to(
            view,
            ViewMessage::Response(Response {
                request_id: request.request_id,
                result,
            }),
        );

        if self.document.version() != version_before {
            self.broadcast_state();
        }
    }

    fn broadcast_state(&mut self) {
        self.broadcaster
            .broadcast(ViewMessage::update(self.document.source()));
    }

    fn dispatch(
        &mut self,
        view: ViewId,
        request: &Request,
    ) -> Result<serde_json::Value, EditorError> {
        let args = &request.args;
        let root = self.document.root();

        match request.label.as_str() {
            // A freshly attached view announces readiness and gets the
            // current state on its own channel only.
            "layout-ready" => {
                self.broadcaster
                    .send_to(view, ViewMessage::update(self.document.source()));
                Ok(serde_json::Value::Null)
            }

            "new-entry" => {
                let index = arg_usize(args, 0)?;
                let key = arg_str(args, 1)?;
                let at = self.document.new_entry(root, index, &key)?;
                Ok(json!(at))
            }
            "remove-entries" => {
                let indices = arg_indices(args, 0)?;
                let removed = self.document.remove_entries(root, &indices)?;
                Ok(json!(removed))
            }
            "rename-entry" => {
                let index = arg_usize(args, 0)?;
                let key = arg_str(args, 1)?;
                let applied = self.document.rename_entry(root, index, &key)?;
                Ok(json!(applied))
            }
            "copy-entries" => {
                let indices = arg_indices(args, 0)?;
                let text = self.document.copy_entries(root, &indices)?;
                Ok(json!(text))
            }
            "can-paste" => Ok(json!(self.document.can_paste())),
            "paste-entries" => {
                let after = arg_usize(args, 0)?;
                let pasted = self.document.paste_entries(root, after)?;
                Ok(json!(pasted))
            }
            "move-entries" => {
                let indices = arg_indices(args, 0)?;
                let target = arg_usize(args, 1)?;
                let before = arg_bool(args, 2)?;
                let moved = self.document.move_entries(root, &indices, target, before)?;
                Ok(json!(moved))
            }
            "duplicate-entries" => {
                let indices = arg_indices(args, 0)?;
                let added = self.document.duplicate_entries(root, &indices)?;
                Ok(json!(added))
            }
            "change-value" => {
                let index = arg_usize(args, 0)?;
                let key = arg_str(args, 1)?;
                let value = json_to_value(arg_at(args, 2)?)?;
                self.document.change_value(root, index, &key, value)?;
                Ok(serde_json::Value::Null)
            }

            // Element operations scoped to an array-valued field of a root
            // entry. The first two args name the scope.
            "array-new-entry" => {
                let array = self.scope(args)?;
                let index = arg_usize(args, 2)?;
                let at = self.document.new_entry(array, index, "")?;
                Ok(json!(at))
            }
            "array-remove-entries" => {
                let array = self.scope(args)?;
                let indices = arg_indices(args, 2)?;
                let removed = self.document.remove_entries(array, &indices)?;
                Ok(json!(removed))
            }
            "array-move-entries" => {
                let array = self.scope(args)?;
                let indices = arg_indices(args, 2)?;
                let target = arg_usize(args, 3)?;
                let before = arg_bool(args, 4)?;
                let moved = self
                    .document
                    .move_entries(array, &indices, target, before)?;
                Ok(json!(moved))
            }
            "array-copy-entries" => {
                let array = self.scope(args)?;
                let indices = arg_indices(args, 2)?;
                let text = self.document.copy_entries(array, &indices)?;
                Ok(json!(text))
            }
            "array-paste-entries" => {
                let array = self.scope(args)?;
                let after = arg_usize(args, 2)?;
                let pasted = self.document.paste_entries(array, after)?;
                Ok(json!(pasted))
            }
            "array-duplicate-entries" => {
                let array = self.scope(args)?;
                let indices = arg_indices(args, 2)?;
                let added = self.document.duplicate_entries(array, &indices)?;
                Ok(json!(added))
            }
            "array-change-value" => {
                let array = self.scope(args)?;
                let index = arg_usize(args, 2)?;
                let value = json_to_value(arg_at(args, 3)?)?;
                self.set_array_item(array, index, value)?;
                Ok(serde_json::Value::Null)
            }

            "undo" => Ok(json!(self.document.undo()?)),
            "redo" => Ok(json!(self.document.redo()?)),
            "revert" => {
                let text = arg_str(args, 0)?;
                self.document.revert(&text)?;
                Ok(serde_json::Value::Null)
            }
            "mark-saved" => {
                self.document.mark_saved();
                Ok(serde_json::Value::Null)
            }
            "is-dirty" => Ok(json!(self.document.is_dirty())),

            other => {
                tracing::warn!(label = other, "unknown request label");
                Ok(serde_json::Value::Null)
            }
        }
    }

    fn scope(&self, args: &[serde_json::Value]) -> Result<kvedit_editor::NodeId, EditorError> {
        let entry = arg_usize(args, 0)?;
        let field = arg_str(args, 1)?;
        self.document.resolve_array(entry, &field)
    }

    fn set_array_item(
        &mut self,
        array: kvedit_editor::NodeId,
        index: usize,
        value: Value,
    ) -> Result<(), EditorError> {
        // Array items have no key to address, so the value is replaced on
        // the node itself.
        let node = self.document.resolve_child(array, index)?;
        self.document.update_value(node, value)
    }
}

// Argument decoding. A missing or mistyped argument is a recoverable
// conflict, the same degradation path as a stale index.

fn arg_at(args: &[serde_json::Value], index: usize) -> Result<&serde_json::Value, EditorError> {
    args.get(index)
        .ok_or_else(|| EditorError::conflict(format!("missing argument {index}")))
}

fn arg_usize(args: &[serde_json::Value], index: usize) -> Result<usize, EditorError> {
    arg_at(args, index)?
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| EditorError::conflict(format!("argument {index} is not an index")))
}

fn arg_str(args: &[serde_json::Value], index: usize) -> Result<String, EditorError> {
    arg_at(args, index)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EditorError::conflict(format!("argument {index} is not a string")))
}

fn arg_bool(args: &[serde_json::Value], index: usize) -> Result<bool, EditorError> {
    arg_at(args, index)?
        .as_bool()
        .ok_or_else(|| EditorError::conflict(format!("argument {index} is not a boolean")))
}

fn arg_indices(args: &[serde_json::Value], index: usize) -> Result<Vec<usize>, EditorError> {
    arg_at(args, index)?
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|v| {
                    v.as_u64()
                        .map(|n| n as usize)
                        .ok_or_else(|| EditorError::conflict("index list holds a non-index"))
                })
                .collect::<Result<Vec<usize>, EditorError>>()
        })
        .ok_or_else(|| EditorError::conflict(format!("argument {index} is not an index list")))?
}

/// JSON argument to a document value. Objects arrive as key/value maps.
fn json_to_value(json: &serde_json::Value) -> Result<Value, EditorError> {
    match json {
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| EditorError::conflict("number out of range")),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Array(items) => Ok(Value::Array(
            items.iter().map(json_to_value).collect::<Result<_, _>>()?,
        )),
        serde_json::Value::Object(map) => Ok(Value::Object(
            map.iter()
                .map(|(k, v)| Ok(kvedit_parser::Node::new(k, json_to_value(v)?)))
                .collect::<Result<_, EditorError>>()?,
        )),
        serde_json::Value::Null => Err(EditorError::conflict("null is not a document value")),
    }
}
