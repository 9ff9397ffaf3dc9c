//! Upload session: file intake, edits, and draining the queue to a sink.

use super::command::Command;
use super::history::CommandHistory;
use super::table::UploadTable;
use crate::directory::EntityDirectory;
use crate::error::{Result, UplinkError};
use crate::linkmap::{resolve, RuleSet};
use crate::types::{Link, UploadRecord};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token for cooperative cancellation, checked between files.
///
/// Clone is cheap and shares state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// How new files are tagged and linked.
#[derive(Debug, Clone, Default)]
pub struct IntakeOptions {
    /// Tags given to every new record
    pub tags: String,
    /// Link every file here and skip rule resolution
    pub manual_link: Option<Link>,
    /// Fallback for files no rule resolves
    pub operator: Option<Link>,
}

impl IntakeOptions {
    pub fn new(tags: impl Into<String>) -> Self {
        Self {
            tags: tags.into(),
            ..Self::default()
        }
    }

    pub fn with_manual_link(mut self, link: Link) -> Self {
        self.manual_link = Some(link);
        self
    }

    pub fn with_operator(mut self, link: Link) -> Self {
        self.operator = Some(link);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No rule produced an entity and there was no operator fallback.
    NoLink,
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoLink => write!(f, "could not determine a link"),
            SkipReason::Unreadable(reason) => write!(f, "unreadable: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of [`UploadSession::add_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub added: usize,
    /// Of `added`, how many fell back to the operator link
    pub linked_to_operator: usize,
    pub skipped: Vec<SkippedFile>,
    pub cancelled: bool,
}

/// Destination for finished records: the remote upload plus thumbnail and
/// note creation.
pub trait UploadSink {
    fn upload(&mut self, record: &UploadRecord) -> Result<()>;
}

impl<F> UploadSink for F
where
    F: FnMut(&UploadRecord) -> Result<()>,
{
    fn upload(&mut self, record: &UploadRecord) -> Result<()> {
        self(record)
    }
}

#[derive(Debug)]
pub struct UploadFailure {
    pub path: String,
    pub error: UplinkError,
}

/// Outcome of [`UploadSession::drain`].
#[derive(Debug, Default)]
pub struct DrainReport {
    pub uploaded: usize,
    pub bytes: u64,
    /// The record that stopped the drain, still at the head of the queue
    pub failure: Option<UploadFailure>,
    pub cancelled: bool,
}

/// One queue of pending uploads together with its edit history.
#[derive(Debug, Default)]
pub struct UploadSession {
    table: UploadTable,
    history: CommandHistory,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: UploadTable) -> Self {
        Self {
            table,
            history: CommandHistory::new(),
        }
    }

    pub fn table(&self) -> &UploadTable {
        &self.table
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Resolve, size, and queue `paths` as one undoable step.
    ///
    /// Relative paths are made absolute against the working directory
    /// before any rule sees them. Files are handled one at a time and
    /// `cancel` is checked between them; files accepted before cancellation
    /// are still queued. A fatal directory error aborts the batch and
    /// queues nothing.
    pub fn add_files<P, D>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
        options: &IntakeOptions,
        rules: &RuleSet,
        directory: &D,
        cancel: &CancelToken,
    ) -> Result<IntakeReport>
    where
        P: AsRef<Path>,
        D: EntityDirectory + ?Sized,
    {
        let mut report = IntakeReport::default();
        let mut records = Vec::new();

        for path in paths {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let path_str = path.as_ref().to_string_lossy().to_string();
            let absolute = match std::path::absolute(path.as_ref()) {
                Ok(absolute) => absolute,
                Err(e) => {
                    warn!(path = %path_str, error = %e, "Skipping file with unusable path");
                    report.skipped.push(SkippedFile {
                        path: path_str,
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                    continue;
                }
            };
            let path_str = absolute.to_string_lossy().to_string();

            let (link, fell_back) = match &options.manual_link {
                Some(link) => (link.clone(), false),
                None => match resolve(&path_str, rules, directory)? {
                    Some(link) => (link, false),
                    None => match &options.operator {
                        Some(operator) => {
                            debug!(path = %path_str, "No rule matched; linking to operator");
                            (operator.clone(), true)
                        }
                        None => {
                            warn!(path = %path_str, "Could not determine a link");
                            report.skipped.push(SkippedFile {
                                path: path_str,
                                reason: SkipReason::NoLink,
                            });
                            continue;
                        }
                    },
                },
            };
            match UploadRecord::from_file(&absolute, &options.tags, link) {
                Ok(record) => {
                    if fell_back {
                        report.linked_to_operator += 1;
                    }
                    records.push(record);
                }
                Err(e) => {
                    warn!(path = %path_str, error = %e, "Skipping unreadable file");
                    report.skipped.push(SkippedFile {
                        path: path_str,
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                }
            }
        }

        report.added = records.len();
        if !records.is_empty() {
            let command = Command::append_records(&self.table, records);
            self.history.push(&mut self.table, command)?;
        }

        info!(
            added = report.added,
            skipped = report.skipped.len(),
            operator = report.linked_to_operator,
            cancelled = report.cancelled,
            "File intake finished"
        );
        Ok(report)
    }

    /// Change one cell.
    pub fn edit(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let command = Command::set_field(&self.table, row, column, value)?;
        self.history.push(&mut self.table, command)
    }

    /// Remove rows, in any order. Repeats count once.
    pub fn remove_rows(&mut self, rows: impl IntoIterator<Item = usize>) -> Result<()> {
        let command = Command::delete_rows(&self.table, rows)?;
        if matches!(&command, Command::DeleteRecords { removed } if removed.is_empty()) {
            return Ok(());
        }
        self.history.push(&mut self.table, command)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.table)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.table)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_text(&self) -> Option<String> {
        self.history.undo_text()
    }

    pub fn redo_text(&self) -> Option<String> {
        self.history.redo_text()
    }

    pub fn total_bytes(&self) -> u64 {
        self.table.total_bytes()
    }

    /// Upload queued records front to back, removing each once the sink
    /// accepts it.
    ///
    /// Stops on cancellation or at the first sink error; the failing record
    /// stays queued. Uploaded rows bypass the history, so the history is
    /// cleared as soon as anything was uploaded.
    pub fn drain<S>(&mut self, sink: &mut S, cancel: &CancelToken) -> Result<DrainReport>
    where
        S: UploadSink + ?Sized,
    {
        let mut report = DrainReport::default();

        while let Some(record) = self.table.record(0) {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if let Err(error) = sink.upload(record) {
                warn!(path = %record.path, error = %error, "Upload failed");
                report.failure = Some(UploadFailure {
                    path: record.path.clone(),
                    error,
                });
                break;
            }

            debug!(path = %record.path, bytes = record.size_bytes, "Uploaded");
            report.uploaded += 1;
            report.bytes += record.size_bytes;
            self.table.delete(0, 1)?;
        }

        if report.uploaded > 0 {
            self.history.clear();
        }

        info!(
            uploaded = report.uploaded,
            bytes = report.bytes,
            remaining = self.table.row_count(),
            cancelled = report.cancelled,
            failed = report.failure.is_some(),
            "Upload queue drained"
        );
        Ok(report)
    }
}
