//! Linear undo/redo stack.

use super::command::Command;
use super::table::UploadTable;
use crate::error::Result;
use tracing::error;

/// Executed commands plus a position pointer in `[0, len]`.
///
/// Commands before the pointer are applied; commands after it were undone
/// and can be redone until the next [`CommandHistory::push`].
#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    commands: Vec<Command>,
    position: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `command` and record it, discarding any undone commands.
    ///
    /// If the command cannot be applied the history is left untouched.
    pub fn push(&mut self, table: &mut UploadTable, command: Command) -> Result<()> {
        command.redo(table)?;
        self.commands.truncate(self.position);
        self.commands.push(command);
        self.position = self.commands.len();
        Ok(())
    }

    /// Undo the last applied command. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self, table: &mut UploadTable) -> bool {
        let Some(command) = self.position.checked_sub(1).and_then(|i| self.commands.get(i)) else {
            return false;
        };
        match command.undo(table) {
            Ok(()) => {
                self.position -= 1;
                true
            }
            Err(e) => {
                error!(command = command.label(), error = %e, "Undo failed; history left in place");
                false
            }
        }
    }

    /// Re-apply the next undone command. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, table: &mut UploadTable) -> bool {
        let Some(command) = self.commands.get(self.position) else {
            return false;
        };
        match command.redo(table) {
            Ok(()) => {
                self.position += 1;
                true
            }
            Err(e) => {
                error!(command = command.label(), error = %e, "Redo failed; history left in place");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.commands.len()
    }

    /// Menu text for the next undo, e.g. "Undo new files".
    pub fn undo_text(&self) -> Option<String> {
        let command = self.commands.get(self.position.checked_sub(1)?)?;
        Some(format!("Undo {}", command.label()))
    }

    pub fn redo_text(&self) -> Option<String> {
        let command = self.commands.get(self.position)?;
        Some(format!("Redo {}", command.label()))
    }

    /// Forget every command without undoing any of them.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Link, UploadRecord};

    fn record(path: &str) -> UploadRecord {
        UploadRecord::new(path, "", Link::manual("Asset", 1, "chair", None), 1)
    }

    fn paths(table: &UploadTable) -> Vec<&str> {
        table.records().iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn empty_history_is_noop() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();
        assert!(!history.undo(&mut table));
        assert!(!history.redo(&mut table));
        assert!(history.undo_text().is_none());
        assert!(history.redo_text().is_none());
    }

    #[test]
    fn push_undo_redo_matches_push() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();
        let cmd = Command::append_records(&table, vec![record("/a.jpg"), record("/b.jpg")]);

        history.push(&mut table, cmd).unwrap();
        let after_push = table.clone();

        assert!(history.undo(&mut table));
        assert!(table.is_empty());
        assert!(history.redo(&mut table));
        assert_eq!(table, after_push);
        assert_eq!(history.position(), 1);
    }

    #[test]
    fn push_after_undo_drops_forward_history() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();

        let a = Command::append_records(&table, vec![record("/a.jpg")]);
        history.push(&mut table, a).unwrap();
        let b = Command::append_records(&table, vec![record("/b.jpg")]);
        history.push(&mut table, b).unwrap();

        assert!(history.undo(&mut table));
        let c = Command::append_records(&table, vec![record("/c.jpg")]);
        history.push(&mut table, c).unwrap();

        let snapshot = table.clone();
        assert!(!history.redo(&mut table));
        assert_eq!(table, snapshot);
        assert_eq!(paths(&table), ["/a.jpg", "/c.jpg"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn menu_text_tracks_position() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();
        let add = Command::append_records(&table, vec![record("/a.jpg")]);
        history.push(&mut table, add).unwrap();
        let edit = Command::set_field(&table, 0, 4, "note").unwrap();
        history.push(&mut table, edit).unwrap();

        assert_eq!(history.undo_text().as_deref(), Some("Undo value change"));
        history.undo(&mut table);
        assert_eq!(history.undo_text().as_deref(), Some("Undo new files"));
        assert_eq!(history.redo_text().as_deref(), Some("Redo value change"));
    }

    #[test]
    fn failed_push_leaves_history_alone() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();
        let bad = Command::insert_records(3, vec![record("/a.jpg")]);
        assert!(history.push(&mut table, bad).is_err());
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn clear_keeps_table_contents() {
        let mut table = UploadTable::new();
        let mut history = CommandHistory::new();
        let add = Command::append_records(&table, vec![record("/a.jpg")]);
        history.push(&mut table, add).unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(table.row_count(), 1);
    }
}
