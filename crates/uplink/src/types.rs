//! Core types: links, upload records, file kinds.

use crate::directory::EntityRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::Path;

// ============================================================================
// Links
// ============================================================================

/// Fields tried, in order, when naming a resolved link.
pub const LINK_NAME_FIELDS: &[&str] = &["name", "code"];

/// Reference to the project a linked entity lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// The remote entity an upload belongs to.
///
/// Never mutated once attached to a record; resolving again produces a new
/// `Link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub entity_type: String,
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

impl Link {
    /// Link chosen explicitly from a pick list.
    pub fn manual(
        entity_type: impl Into<String>,
        id: i64,
        name: impl Into<String>,
        project: Option<ProjectRef>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            name: name.into(),
            project,
        }
    }

    /// Build a link from a directory record.
    ///
    /// The name comes from the first of [`LINK_NAME_FIELDS`] the record has
    /// as a string; empty when none is present.
    pub fn from_record(record: &EntityRecord) -> Self {
        let name = LINK_NAME_FIELDS
            .iter()
            .find_map(|field| record.field_str(field))
            .unwrap_or_default()
            .to_string();

        let project = match record.field("project") {
            Some(Value::Object(obj)) => obj.get("id").and_then(Value::as_i64).map(|id| ProjectRef {
                id,
                name: obj.get("name").and_then(Value::as_str).map(str::to_string),
            }),
            _ => None,
        };

        Self {
            entity_type: record.entity_type.clone(),
            id: record.id,
            name,
            project,
        }
    }

    /// Project that notes about this upload should be filed under.
    ///
    /// Falls back to the link itself when it points at a project.
    pub fn note_project(&self) -> Option<ProjectRef> {
        match &self.project {
            Some(project) => Some(project.clone()),
            None if self.entity_type == "Project" => Some(ProjectRef {
                id: self.id,
                name: Some(self.name.clone()),
            }),
            None => None,
        }
    }
}

// ============================================================================
// File kinds
// ============================================================================

const MOTION_EXTENSIONS: &[&str] = &[
    "mov", "mp4", "m4v", "avi", "mkv", "mpg", "mpeg", "webm", "wmv", "flv", "dv", "mxf", "qt",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "exr", "dpx", "tga", "psd", "webp",
];

/// Coarse classification of a file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    /// Movies; these carry a frame offset for their thumbnail.
    Motion,
    Other,
}

impl FileKind {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some(ext) if MOTION_EXTENSIONS.contains(&ext) => FileKind::Motion,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => FileKind::Image,
            _ => FileKind::Other,
        }
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, FileKind::Motion)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Motion => "motion",
            Self::Other => "other",
        }
    }
}

// ============================================================================
// Upload records
// ============================================================================

/// Default frame offset for motion files.
pub const DEFAULT_FRAME_OFFSET: &str = "1";

/// One pending upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Absolute path of the file to upload
    pub path: String,
    /// Comma-separated tags
    pub tags: String,
    pub note: String,
    /// Frame used for the thumbnail; empty unless the file is a movie
    pub frame_offset: String,
    pub link: Link,
    /// Size captured when the record was created
    pub size_bytes: u64,
}

impl UploadRecord {
    pub fn new(path: impl Into<String>, tags: impl Into<String>, link: Link, size_bytes: u64) -> Self {
        let path = path.into();
        let frame_offset = if FileKind::from_path(&path).is_motion() {
            DEFAULT_FRAME_OFFSET.to_string()
        } else {
            String::new()
        };
        Self {
            path,
            tags: tags.into(),
            note: String::new(),
            frame_offset,
            link,
            size_bytes,
        }
    }

    /// Create a record for a file on disk, reading its size now.
    ///
    /// Relative paths are made absolute against the working directory.
    pub fn from_file(path: impl AsRef<Path>, tags: &str, link: Link) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let meta = std::fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file").into());
        }
        Ok(Self::new(path.to_string_lossy().to_string(), tags, link, meta.len()))
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_path(&self.path)
    }

    pub fn link_name(&self) -> &str {
        &self.link.name
    }

    /// Tags split on commas, trimmed, empties dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
