//! Uplink - path-linked upload queue
//!
//! Files dropped into the uploader are linked to a remote entity (asset,
//! shot, task, ...) by a user-editable link map, then held in an editable
//! queue with undo/redo until they are uploaded.
//!
//! ```text
//! link map text ──► RuleSet ──► resolve(path) ──► Link
//!                                                  │
//! files ──► UploadSession::add_files ──► UploadTable ◄── CommandHistory
//!                                          │
//!                                          └──► drain ──► UploadSink
//! ```
//!
//! The remote service is reached only through [`directory::EntityDirectory`]
//! and [`queue::UploadSink`].

pub mod config;
pub mod directory;
pub mod error;
pub mod linkmap;
pub mod picklist;
pub mod queue;
pub mod types;

pub use config::{expand_thumbnail_command, logs_dir, uplink_home, UplinkConfig};
pub use directory::{DirectoryError, EntityDirectory, EntityRecord, Filters, MemoryDirectory};
pub use error::{Result, UplinkError};
pub use linkmap::{compile, resolve, CompiledMatcher, LinkResolver, MappingRule, RuleSet, RuleWarning};
pub use picklist::{pick_list, pick_list_label, PickEntry};
pub use queue::{
    CancelToken, Column, Command, CommandHistory, DrainReport, IntakeOptions, IntakeReport,
    RecordField, SkipReason, UploadSession, UploadSink, UploadTable,
};
pub use types::{FileKind, Link, ProjectRef, UploadRecord};
