//! Reversible edits to an [`UploadTable`].

use super::table::UploadTable;
use crate::error::{Result, UplinkError};
use crate::types::UploadRecord;
use std::collections::BTreeMap;

/// One undoable change. Each variant carries what it needs to be applied
/// again and to be inverted, captured when the command is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetField {
        row: usize,
        column: usize,
        old_value: String,
        new_value: String,
    },
    InsertRecords {
        start: usize,
        records: Vec<UploadRecord>,
    },
    /// Original row -> removed record. Ordered by row.
    DeleteRecords { removed: BTreeMap<usize, UploadRecord> },
}

impl Command {
    /// Edit of one cell; the current value becomes the undo value.
    pub fn set_field(
        table: &UploadTable,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<Self> {
        if column >= table.column_count() {
            return Err(UplinkError::ColumnIndex {
                column,
                len: table.column_count(),
            });
        }
        let old_value = table.cell(row, column).ok_or(UplinkError::StoreIndex {
            row,
            len: table.row_count(),
        })?;
        Ok(Command::SetField {
            row,
            column,
            old_value: old_value.to_string(),
            new_value: value.into(),
        })
    }

    pub fn insert_records(start: usize, records: Vec<UploadRecord>) -> Self {
        Command::InsertRecords { start, records }
    }

    /// Insert after the last row of `table`.
    pub fn append_records(table: &UploadTable, records: Vec<UploadRecord>) -> Self {
        Self::insert_records(table.row_count(), records)
    }

    /// Removal of arbitrary rows. Repeated rows count once.
    pub fn delete_rows(table: &UploadTable, rows: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut removed = BTreeMap::new();
        for row in rows {
            let record = table.record(row).ok_or(UplinkError::StoreIndex {
                row,
                len: table.row_count(),
            })?;
            removed.entry(row).or_insert_with(|| record.clone());
        }
        Ok(Command::DeleteRecords { removed })
    }

    /// Short description for undo/redo menu entries.
    pub fn label(&self) -> &'static str {
        match self {
            Command::SetField { .. } => "value change",
            Command::InsertRecords { .. } => "new files",
            Command::DeleteRecords { .. } => "delete files",
        }
    }

    /// Apply the change.
    pub fn redo(&self, table: &mut UploadTable) -> Result<()> {
        match self {
            Command::SetField {
                row,
                column,
                new_value,
                ..
            } => {
                table.set_field(*row, *column, new_value.clone())?;
            }
            Command::InsertRecords { start, records } => {
                table.insert(*start, records.clone())?;
            }
            Command::DeleteRecords { removed } => {
                // Highest first so pending rows keep their positions.
                for &row in removed.keys().rev() {
                    table.delete(row, row + 1)?;
                }
            }
        }
        Ok(())
    }

    /// Invert a previous [`Command::redo`].
    pub fn undo(&self, table: &mut UploadTable) -> Result<()> {
        match self {
            Command::SetField {
                row,
                column,
                old_value,
                ..
            } => {
                table.set_field(*row, *column, old_value.clone())?;
            }
            Command::InsertRecords { start, records } => {
                table.delete(*start, start + records.len())?;
            }
            Command::DeleteRecords { removed } => {
                // Lowest first so each record lands on its original row.
                for (&row, record) in removed {
                    table.insert(row, vec![record.clone()])?;
                }
            }
        }
        Ok(())
    }
}
