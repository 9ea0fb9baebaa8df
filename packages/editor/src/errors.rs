use kvedit_parser::ParseError;
use thiserror::Error;

use crate::ops::EditError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Edit failed: {0}")]
    Edit(#[from] EditError),

    /// A caller-supplied index or key no longer identifies the intended node,
    /// usually because of interleaved edits from another view. Recoverable:
    /// the request degrades to a no-op.
    #[error("Structural conflict: {0}")]
    StructuralConflict(String),

    #[error("Addressed node is not a container")]
    NotAContainer,

    #[error("Clipboard is empty")]
    EmptyClipboard,
}

impl EditorError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::StructuralConflict(message.into())
    }

    /// Whether the host should treat this as a degraded no-op rather than a
    /// fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StructuralConflict(_) | Self::NotAContainer | Self::EmptyClipboard
        )
    }
}
