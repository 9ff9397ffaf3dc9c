//! Upload queue: the table of pending records, the commands that edit it,
//! and the undo history over those commands.

pub mod command;
pub mod history;
pub mod session;
pub mod table;

pub use command::Command;
pub use history::CommandHistory;
pub use session::{
    CancelToken, DrainReport, IntakeOptions, IntakeReport, SkipReason, SkippedFile, UploadFailure,
    UploadSession, UploadSink,
};
pub use table::{default_columns, Column, RecordField, UploadTable};
