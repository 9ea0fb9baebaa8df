//! # kvedit Editor
//!
//! Core document editing engine for the KV3-like configuration format.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text → Node tree                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: arena tree + structural operations  │
//! │  - Node arena with stable handles           │
//! │  - Tagged edit ops with apply/invert        │
//! │  - Linear undo/redo log                     │
//! │  - Document-scoped clipboard                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: request router + full-state      │
//! │            broadcast to attached views      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree identity via handles**: nodes live in an arena and move between
//!    containers without changing identity.
//! 2. **One command per user-visible mutation**: each operation pushes exactly
//!    one `Command`; undo applies the op's inverse, redo reapplies the op.
//! 3. **Move reapplication recomputes indices**: the insertion point of a
//!    redone move is derived from the target node's current position, never
//!    from a captured index.
//! 4. **Clipboard is a snapshot**: copy deep-clones at copy time; paste clones
//!    the buffer again so repeated pastes are independent.

mod arena;
mod document;
mod errors;
mod ops;
mod undo_stack;

pub use arena::{NodeArena, NodeData, NodeId, NodeValue};
pub use document::{successor_key, Document};
pub use errors::EditorError;
pub use ops::{apply, invert, Command, EditError, EditOp};
pub use undo_stack::UndoStack;
