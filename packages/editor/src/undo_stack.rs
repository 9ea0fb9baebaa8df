//! Linear undo/redo log.
//!
//! Pushing a command applies it immediately, records it for undo and clears
//! the redo stack. The stacks are mutually exclusive by construction. A save
//! mark tracks the undo depth at the last save so the owning document can
//! report dirtiness.

use crate::arena::NodeArena;
use crate::ops::{apply, invert, Command, EditError};

#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,

    /// Maximum number of undo levels (0 = unlimited).
    max_levels: usize,

    /// Undo depth at the last save; `None` once that state is unreachable.
    save_mark: Option<usize>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            save_mark: Some(0),
        }
    }

    /// Apply a command and record it for undo.
    pub fn push(&mut self, command: Command, arena: &mut NodeArena) -> Result<(), EditError> {
        apply(arena, &command.op)?;

        // A save mark deeper than the current undo depth lives in the redo
        // branch this push discards; that saved state is now unreachable.
        if self.save_mark.map_or(false, |m| m > self.undo_stack.len()) {
            self.save_mark = None;
        }

        self.undo_stack.push(command);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
            // The saved state fell off the log; dirtiness can no longer clear.
            self.save_mark = match self.save_mark {
                Some(0) | None => None,
                Some(n) => Some(n - 1),
            };
        }

        self.redo_stack.clear();
        Ok(())
    }

    /// Undo the most recent command. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self, arena: &mut NodeArena) -> Result<bool, EditError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        apply(arena, &invert(&command.op))?;
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self, arena: &mut NodeArena) -> Result<bool, EditError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        apply(arena, &command.op)?;
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.label.as_str())
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record the current state as saved.
    pub fn mark_saved(&mut self) {
        self.save_mark = Some(self.undo_stack.len());
    }

    pub fn is_dirty(&self) -> bool {
        self.save_mark != Some(self.undo_stack.len())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.save_mark = Some(0);
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::EditOp;
    use kvedit_parser::{parse, Value};

    fn setup() -> (NodeArena, UndoStack) {
        let arena = NodeArena::from_ast(&parse("volume = 0.5").unwrap());
        (arena, UndoStack::new())
    }

    fn update_command(arena: &NodeArena, to: f64) -> Command {
        let node = arena.children(arena.root()).unwrap()[0];
        let from = arena.to_ast(node).unwrap().value;
        Command::new(
            format!("Set volume to {to}"),
            EditOp::Update {
                node,
                from,
                to: Value::Number(to),
            },
        )
    }

    #[test]
    fn test_push_applies_and_records() {
        let (mut arena, mut stack) = setup();
        let cmd = update_command(&arena, 0.9);
        stack.push(cmd, &mut arena).unwrap();

        assert_eq!(stack.undo_levels(), 1);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_label(), Some("Set volume to 0.9"));
    }

    #[test]
    fn test_undo_redo_cycle() {
        let (mut arena, mut stack) = setup();
        let node = arena.children(arena.root()).unwrap()[0];
        stack.push(update_command(&arena, 0.9), &mut arena).unwrap();

        assert!(stack.undo(&mut arena).unwrap());
        assert_eq!(arena.to_ast(node).unwrap().value.as_number(), Some(0.5));
        assert_eq!(stack.redo_levels(), 1);

        assert!(stack.redo(&mut arena).unwrap());
        assert_eq!(arena.to_ast(node).unwrap().value.as_number(), Some(0.9));
        assert_eq!(stack.undo_levels(), 1);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let (mut arena, mut stack) = setup();
        stack.push(update_command(&arena, 0.9), &mut arena).unwrap();
        stack.undo(&mut arena).unwrap();
        assert_eq!(stack.redo_levels(), 1);

        stack.push(update_command(&arena, 0.1), &mut arena).unwrap();
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_undo_empty_stack_is_noop() {
        let (mut arena, mut stack) = setup();
        assert!(!stack.undo(&mut arena).unwrap());
        assert!(!stack.redo(&mut arena).unwrap());
    }

    #[test]
    fn test_dirty_tracking_via_save_mark() {
        let (mut arena, mut stack) = setup();
        assert!(!stack.is_dirty());

        stack.push(update_command(&arena, 0.9), &mut arena).unwrap();
        assert!(stack.is_dirty());

        stack.mark_saved();
        assert!(!stack.is_dirty());

        stack.undo(&mut arena).unwrap();
        assert!(stack.is_dirty());

        stack.redo(&mut arena).unwrap();
        assert!(!stack.is_dirty());
    }

    #[test]
    fn test_save_mark_in_discarded_redo_branch_stays_dirty() {
        let (mut arena, mut stack) = setup();
        stack.push(update_command(&arena, 0.9), &mut arena).unwrap();
        stack.mark_saved();
        stack.undo(&mut arena).unwrap();

        // This push discards the redo branch holding the saved state, so the
        // stack can never report clean again until the next save.
        stack.push(update_command(&arena, 0.1), &mut arena).unwrap();
        assert!(stack.is_dirty());

        stack.undo(&mut arena).unwrap();
        assert!(stack.is_dirty());
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut arena = NodeArena::from_ast(&parse("volume = 0.5").unwrap());
        let mut stack = UndoStack::with_max_levels(2);

        for i in 0..3 {
            stack
                .push(update_command(&arena, i as f64), &mut arena)
                .unwrap();
        }
        assert_eq!(stack.undo_levels(), 2);
        // The pre-edit saved state is no longer reachable.
        assert!(stack.is_dirty());
        stack.undo(&mut arena).unwrap();
        stack.undo(&mut arena).unwrap();
        assert!(stack.is_dirty());
    }
}
