//! Labels for picking a link target by hand.
//!
//! Different entity types name themselves through different fields, so a
//! label is built from an ordered list of candidate fields plus a short hint
//! (sequence or asset type) when the record carries one.

use crate::directory::{EntityDirectory, EntityRecord, Filters};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Fields tried, in order, for a pick list label.
pub const LABEL_FIELDS: &[&str] = &["display_name", "content", "name", "code"];

/// Fields requested from the directory when building a pick list.
pub const PICK_LIST_FIELDS: &[&str] = &[
    "display_name",
    "content",
    "name",
    "code",
    "sg_sequence",
    "sg_asset_type",
];

/// One selectable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickEntry {
    pub label: String,
    pub id: i64,
}

fn reference_id(value: &Value) -> Option<i64> {
    value.get("id").and_then(Value::as_i64)
}

/// Label for `record`, or `None` if it has none of [`LABEL_FIELDS`].
///
/// `sequences` maps sequence ids to their codes.
pub fn pick_list_label(record: &EntityRecord, sequences: &HashMap<i64, String>) -> Option<String> {
    let base = LABEL_FIELDS.iter().find_map(|f| record.field_str(f))?;

    if let Some(sequence) = record.field("sg_sequence") {
        let code = reference_id(sequence)
            .and_then(|id| sequences.get(&id))
            .map(String::as_str)
            .unwrap_or("None");
        return Some(format!("{} ({})", base, code));
    }

    if let Some(asset_type) = record.field("sg_asset_type") {
        let asset_type = match asset_type {
            Value::String(s) => s.clone(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        };
        return Some(format!("{} ({})", base, asset_type));
    }

    Some(base.to_string())
}

/// Entities of `entity_type` a user can link to, optionally within a project.
///
/// Projects themselves are never filtered by project. Listing stops at the
/// first record the labeler cannot name.
pub fn pick_list<D>(directory: &D, entity_type: &str, project: Option<i64>) -> Result<Vec<PickEntry>>
where
    D: EntityDirectory + ?Sized,
{
    let mut filters = Filters::new();
    if let Some(project_id) = project.filter(|_| entity_type != "Project") {
        filters.insert("project".to_string(), project_id.to_string());
    }

    let records = directory.find(entity_type, &filters, PICK_LIST_FIELDS)?;

    let sequences = if records.first().is_some_and(|r| r.has_field("sg_sequence")) {
        directory
            .find("Sequence", &filters, &["code"])?
            .into_iter()
            .filter_map(|seq| seq.field_str("code").map(|code| (seq.id, code.to_string())))
            .collect()
    } else {
        HashMap::new()
    };

    let mut entries = Vec::with_capacity(records.len());
    for record in &records {
        let Some(label) = pick_list_label(record, &sequences) else {
            break;
        };
        entries.push(PickEntry {
            label,
            id: record.id,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use serde_json::json;

    #[test]
    fn label_prefers_display_name() {
        let record = EntityRecord::new("Task", 1)
            .with_field("content", "anim")
            .with_field("display_name", "Animation");
        assert_eq!(
            pick_list_label(&record, &HashMap::new()).as_deref(),
            Some("Animation")
        );
    }

    #[test]
    fn label_includes_sequence_code() {
        let sequences = HashMap::from([(5, "sq100".to_string())]);
        let record = EntityRecord::new("Shot", 1)
            .with_field("code", "sh010")
            .with_field("sg_sequence", json!({"type": "Sequence", "id": 5}));
        assert_eq!(
            pick_list_label(&record, &sequences).as_deref(),
            Some("sh010 (sq100)")
        );

        let orphan = EntityRecord::new("Shot", 2)
            .with_field("code", "sh020")
            .with_field("sg_sequence", Value::Null);
        assert_eq!(
            pick_list_label(&orphan, &sequences).as_deref(),
            Some("sh020 (None)")
        );
    }

    #[test]
    fn label_includes_asset_type() {
        let record = EntityRecord::new("Asset", 1)
            .with_field("code", "chair")
            .with_field("sg_asset_type", "prop");
        assert_eq!(
            pick_list_label(&record, &HashMap::new()).as_deref(),
            Some("chair (prop)")
        );
    }

    #[test]
    fn pick_list_filters_by_project_and_resolves_sequences() {
        let dir = MemoryDirectory::with_records(vec![
            EntityRecord::new("Sequence", 5)
                .with_field("code", "sq100")
                .with_field("project", json!({"type": "Project", "id": 7})),
            EntityRecord::new("Shot", 1)
                .with_field("code", "sh010")
                .with_field("sg_sequence", json!({"type": "Sequence", "id": 5}))
                .with_field("project", json!({"type": "Project", "id": 7})),
            EntityRecord::new("Shot", 2)
                .with_field("code", "sh999")
                .with_field("sg_sequence", Value::Null)
                .with_field("project", json!({"type": "Project", "id": 8})),
        ]);

        let entries = pick_list(&dir, "Shot", Some(7)).unwrap();
        assert_eq!(
            entries,
            vec![PickEntry {
                label: "sh010 (sq100)".into(),
                id: 1
            }]
        );
    }

    #[test]
    fn projects_ignore_project_filter() {
        let dir = MemoryDirectory::with_records(vec![
            EntityRecord::new("Project", 7).with_field("name", "Big Job"),
            EntityRecord::new("Project", 8).with_field("name", "Small Job"),
        ]);
        let entries = pick_list(&dir, "Project", Some(7)).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn listing_stops_at_unnamed_record() {
        let dir = MemoryDirectory::with_records(vec![
            EntityRecord::new("Ticket", 1).with_field("title", "broken"),
            EntityRecord::new("Ticket", 2).with_field("name", "ok"),
        ]);
        assert!(pick_list(&dir, "Ticket", None).unwrap().is_empty());
    }
}
