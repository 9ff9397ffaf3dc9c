//! Ordered table of pending uploads.
//!
//! Rows are positional: row `i` is the `i`-th record, nothing more. Any
//! insert or delete shifts the rows after it, so callers that need to undo
//! must remember positions at the time they act.

use crate::error::{Result, UplinkError};
use crate::types::{FileKind, UploadRecord};
use serde::{Deserialize, Serialize};

/// Record field a column is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    FrameOffset,
    Path,
    LinkName,
    Tags,
    Note,
}

impl RecordField {
    /// Whether the store can write this field at all.
    ///
    /// Path and link are fixed once a record exists.
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::FrameOffset | Self::Tags | Self::Note)
    }

    pub fn get<'r>(&self, record: &'r UploadRecord) -> &'r str {
        match self {
            Self::FrameOffset => &record.frame_offset,
            Self::Path => &record.path,
            Self::LinkName => record.link_name(),
            Self::Tags => &record.tags,
            Self::Note => &record.note,
        }
    }

    fn slot<'r>(&self, record: &'r mut UploadRecord) -> Option<&'r mut String> {
        match self {
            Self::FrameOffset => Some(&mut record.frame_offset),
            Self::Tags => Some(&mut record.tags),
            Self::Note => Some(&mut record.note),
            Self::Path | Self::LinkName => None,
        }
    }
}

/// Column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub display_name: String,
    pub field: RecordField,
    pub editable: bool,
}

impl Column {
    pub fn new(display_name: impl Into<String>, field: RecordField, editable: bool) -> Self {
        Self {
            display_name: display_name.into(),
            field,
            editable,
        }
    }
}

/// Columns shown for the upload queue, left to right.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("Frame", RecordField::FrameOffset, true),
        Column::new("Path", RecordField::Path, false),
        Column::new("Linked To", RecordField::LinkName, false),
        Column::new("Tags", RecordField::Tags, true),
        Column::new("Note", RecordField::Note, true),
    ]
}

/// Pending uploads as rows, with a column set fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTable {
    columns: Vec<Column>,
    records: Vec<UploadRecord>,
}

impl Default for UploadTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadTable {
    pub fn new() -> Self {
        Self::with_columns(default_columns())
    }

    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, column: usize) -> Option<&Column> {
        self.columns.get(column)
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn record(&self, row: usize) -> Option<&UploadRecord> {
        self.records.get(row)
    }

    /// Text shown in a cell.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        let column = self.columns.get(column)?;
        let record = self.records.get(row)?;
        Some(column.field.get(record))
    }

    /// Whether a user may edit a cell.
    ///
    /// Combines the column flag with the file kind: the frame offset only
    /// means something for movies.
    pub fn is_editable(&self, row: usize, column: usize) -> bool {
        let (Some(col), Some(record)) = (self.columns.get(column), self.records.get(row)) else {
            return false;
        };
        if !col.editable || !col.field.is_writable() {
            return false;
        }
        match col.field {
            RecordField::FrameOffset => record.kind() == FileKind::Motion,
            _ => true,
        }
    }

    /// Sum of the sizes of every queued file.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    /// Splice `records` in at `start`; rows from `start` on shift down.
    pub fn insert(&mut self, start: usize, records: Vec<UploadRecord>) -> Result<()> {
        if start > self.records.len() {
            return Err(UplinkError::StoreIndex {
                row: start,
                len: self.records.len(),
            });
        }
        self.records.splice(start..start, records);
        Ok(())
    }

    /// Remove rows `[first, last)` and return them in order.
    pub fn delete(&mut self, first: usize, last: usize) -> Result<Vec<UploadRecord>> {
        let len = self.records.len();
        if first > last || last > len {
            return Err(UplinkError::StoreIndex {
                row: first.max(last),
                len,
            });
        }
        Ok(self.records.drain(first..last).collect())
    }

    /// Overwrite one cell, returning the previous value.
    ///
    /// The column's `editable` flag is not consulted here; see
    /// [`UploadTable::is_editable`].
    pub fn set_field(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<String> {
        let col = self.columns.get(column).ok_or(UplinkError::ColumnIndex {
            column,
            len: self.columns.len(),
        })?;
        let len = self.records.len();
        let record = self
            .records
            .get_mut(row)
            .ok_or(UplinkError::StoreIndex { row, len })?;
        let slot = col
            .field
            .slot(record)
            .ok_or_else(|| UplinkError::ReadOnlyColumn(col.display_name.clone()))?;
        Ok(std::mem::replace(slot, value.into()))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Link;

    fn record(path: &str) -> UploadRecord {
        UploadRecord::new(path, "to_be_filed", Link::manual("Asset", 1, "chair", None), 100)
    }

    fn table(paths: &[&str]) -> UploadTable {
        let mut table = UploadTable::new();
        table
            .insert(0, paths.iter().map(|p| record(p)).collect())
            .unwrap();
        table
    }

    #[test]
    fn cells_follow_column_bindings() {
        let table = table(&["/a/take.mov"]);
        assert_eq!(table.column_count(), 5);
        assert_eq!(table.cell(0, 0), Some("1"));
        assert_eq!(table.cell(0, 1), Some("/a/take.mov"));
        assert_eq!(table.cell(0, 2), Some("chair"));
        assert_eq!(table.cell(0, 3), Some("to_be_filed"));
        assert_eq!(table.cell(0, 4), Some(""));
        assert_eq!(table.cell(1, 0), None);
        assert_eq!(table.cell(0, 5), None);
    }

    #[test]
    fn insert_shifts_following_rows() {
        let mut table = table(&["/a/1.jpg", "/a/4.jpg"]);
        table
            .insert(1, vec![record("/a/2.jpg"), record("/a/3.jpg")])
            .unwrap();
        let paths: Vec<_> = table.records().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/a/1.jpg", "/a/2.jpg", "/a/3.jpg", "/a/4.jpg"]);
    }

    #[test]
    fn insert_past_end_is_index_error() {
        let mut table = table(&["/a/1.jpg"]);
        let err = table.insert(2, vec![record("/a/2.jpg")]).unwrap_err();
        assert!(matches!(err, UplinkError::StoreIndex { row: 2, len: 1 }));
    }

    #[test]
    fn insert_then_delete_restores_sequence() {
        let mut table = table(&["/a/1.jpg", "/a/2.jpg", "/a/3.jpg"]);
        let before = table.clone();

        table
            .insert(1, vec![record("/b/x.jpg"), record("/b/y.jpg")])
            .unwrap();
        let removed = table.delete(1, 3).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(table, before);
    }

    #[test]
    fn delete_rejects_bad_ranges() {
        let mut table = table(&["/a/1.jpg", "/a/2.jpg"]);
        assert!(table.delete(1, 3).is_err());
        assert!(table.delete(2, 1).is_err());
        assert!(table.delete(2, 2).unwrap().is_empty());
    }

    #[test]
    fn set_field_returns_old_value() {
        let mut table = table(&["/a/1.jpg"]);
        let old = table.set_field(0, 4, "hero pose").unwrap();
        assert_eq!(old, "");
        assert_eq!(table.cell(0, 4), Some("hero pose"));
    }

    #[test]
    fn set_field_refuses_fixed_fields() {
        let mut table = table(&["/a/1.jpg"]);
        assert!(matches!(
            table.set_field(0, 1, "/elsewhere"),
            Err(UplinkError::ReadOnlyColumn(name)) if name == "Path"
        ));
        assert!(matches!(
            table.set_field(3, 4, "x"),
            Err(UplinkError::StoreIndex { row: 3, len: 1 })
        ));
        assert!(matches!(
            table.set_field(0, 9, "x"),
            Err(UplinkError::ColumnIndex { column: 9, len: 5 })
        ));
    }

    #[test]
    fn frame_column_editable_only_for_motion() {
        let table = table(&["/a/take.mov", "/a/still.jpg"]);
        assert!(table.is_editable(0, 0));
        assert!(!table.is_editable(1, 0));
        assert!(table.is_editable(1, 3));
        assert!(!table.is_editable(0, 1));
        assert!(!table.is_editable(5, 3));
    }

    #[test]
    fn totals_and_clear() {
        let mut table = table(&["/a/1.jpg", "/a/2.jpg"]);
        assert_eq!(table.total_bytes(), 200);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.total_bytes(), 0);
    }
}
