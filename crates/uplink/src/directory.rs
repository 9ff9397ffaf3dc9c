//! Entity directory seam
//!
//! The remote service is only ever reached through [`EntityDirectory`]. The
//! resolver needs `find_one`; pick lists need `find`. Implementations decide
//! how to talk to the service and must classify their failures so callers can
//! tell a flaky network from a broken configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Equality filters: field name -> required value.
pub type Filters = BTreeMap<String, String>;

/// A record returned by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub entity_type: String,
    pub id: i64,
    /// Whatever fields the directory chose to return.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(entity_type: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field; `None` when absent, null, or not a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Whether this record satisfies a single equality filter.
    ///
    /// Entity references (objects carrying an `id`) compare by id.
    fn matches_filter(&self, name: &str, expected: &str) -> bool {
        if name == "id" {
            return self.id.to_string() == expected;
        }
        match self.fields.get(name) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Number(n)) => n.to_string() == expected,
            Some(Value::Bool(b)) => b.to_string() == expected,
            Some(Value::Object(obj)) => obj
                .get("id")
                .map(|id| match id {
                    Value::String(s) => s == expected,
                    other => other.to_string() == expected,
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Directory failure, classified by whether retrying later could help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("schema error: {0}")]
    Schema(String),
}

impl DirectoryError {
    /// Connectivity-class failures. Everything else is a misconfiguration.
    pub fn is_transient(&self) -> bool {
        matches!(self, DirectoryError::Timeout(_) | DirectoryError::Unavailable(_))
    }
}

/// Lookup service for remote entities.
pub trait EntityDirectory {
    /// Find at most one entity of `entity_type` matching every filter.
    ///
    /// Filters naming a field the entity type does not have must produce
    /// `Ok(None)`, not an error.
    fn find_one(
        &self,
        entity_type: &str,
        filters: &Filters,
    ) -> Result<Option<EntityRecord>, DirectoryError>;

    /// Find every matching entity, returning at least the requested fields
    /// when the entity has them.
    fn find(
        &self,
        entity_type: &str,
        filters: &Filters,
        fields: &[&str],
    ) -> Result<Vec<EntityRecord>, DirectoryError>;
}

impl<D: EntityDirectory + ?Sized> EntityDirectory for &D {
    fn find_one(
        &self,
        entity_type: &str,
        filters: &Filters,
    ) -> Result<Option<EntityRecord>, DirectoryError> {
        (**self).find_one(entity_type, filters)
    }

    fn find(
        &self,
        entity_type: &str,
        filters: &Filters,
        fields: &[&str],
    ) -> Result<Vec<EntityRecord>, DirectoryError> {
        (**self).find(entity_type, filters, fields)
    }
}

/// In-memory directory for offline use and tests.
///
/// Failures can be scripted per entity type to exercise the resolver's
/// error handling.
#[derive(Default)]
pub struct MemoryDirectory {
    records: Vec<EntityRecord>,
    failures: RefCell<HashMap<String, DirectoryError>>,
    lookups: Cell<usize>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<EntityRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, record: EntityRecord) {
        self.records.push(record);
    }

    /// Make every lookup of `entity_type` fail with `error`.
    pub fn fail_entity_type(&self, entity_type: &str, error: DirectoryError) {
        self.failures
            .borrow_mut()
            .insert(entity_type.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    /// Number of `find_one`/`find` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    fn check_failure(&self, entity_type: &str) -> Result<(), DirectoryError> {
        self.lookups.set(self.lookups.get() + 1);
        match self.failures.borrow().get(entity_type) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn matching<'a>(
        &'a self,
        entity_type: &'a str,
        filters: &'a Filters,
    ) -> impl Iterator<Item = &'a EntityRecord> + 'a {
        self.records.iter().filter(move |record| {
            record.entity_type == entity_type
                && filters
                    .iter()
                    .all(|(name, value)| record.matches_filter(name, value))
        })
    }
}

impl EntityDirectory for MemoryDirectory {
    fn find_one(
        &self,
        entity_type: &str,
        filters: &Filters,
    ) -> Result<Option<EntityRecord>, DirectoryError> {
        self.check_failure(entity_type)?;
        Ok(self.matching(entity_type, filters).next().cloned())
    }

    fn find(
        &self,
        entity_type: &str,
        filters: &Filters,
        fields: &[&str],
    ) -> Result<Vec<EntityRecord>, DirectoryError> {
        self.check_failure(entity_type)?;
        Ok(self
            .matching(entity_type, filters)
            .map(|record| {
                if fields.is_empty() {
                    return record.clone();
                }
                let mut projected = EntityRecord::new(record.entity_type.clone(), record.id);
                for field in fields {
                    if let Some(value) = record.field(field) {
                        projected.fields.insert((*field).to_string(), value.clone());
                    }
                }
                projected
            })
            .collect())
    }
}

impl fmt::Debug for MemoryDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDirectory")
            .field("records", &self.records.len())
            .field("lookups", &self.lookups.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(pairs: &[(&str, &str)]) -> Filters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn directory() -> MemoryDirectory {
        MemoryDirectory::with_records(vec![
            EntityRecord::new("Asset", 1)
                .with_field("code", "chair")
                .with_field("sg_asset_type", "prop"),
            EntityRecord::new("Asset", 2)
                .with_field("code", "table")
                .with_field("project", json!({"type": "Project", "id": 7})),
            EntityRecord::new("Shot", 3).with_field("code", "chair"),
        ])
    }

    #[test]
    fn find_one_requires_every_filter() {
        let dir = directory();
        let hit = dir
            .find_one("Asset", &filters(&[("code", "chair"), ("sg_asset_type", "prop")]))
            .unwrap();
        assert_eq!(hit.map(|r| r.id), Some(1));

        let miss = dir
            .find_one("Asset", &filters(&[("code", "chair"), ("sg_asset_type", "char")]))
            .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn unknown_field_is_empty_not_error() {
        let dir = directory();
        let result = dir.find_one("Asset", &filters(&[("no_such_field", "x")]));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn entity_reference_filters_compare_by_id() {
        let dir = directory();
        let hit = dir.find_one("Asset", &filters(&[("project", "7")])).unwrap();
        assert_eq!(hit.map(|r| r.id), Some(2));
    }

    #[test]
    fn find_projects_requested_fields() {
        let dir = directory();
        let found = dir.find("Asset", &Filters::new(), &["code"]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.has_field("code")));
        assert!(found.iter().all(|r| !r.has_field("sg_asset_type")));
    }

    #[test]
    fn scripted_failures_apply_per_entity_type() {
        let dir = directory();
        dir.fail_entity_type("Asset", DirectoryError::Unavailable("down".into()));

        assert!(dir.find_one("Asset", &Filters::new()).is_err());
        assert!(dir.find_one("Shot", &Filters::new()).is_ok());
        assert_eq!(dir.lookups(), 2);

        dir.clear_failures();
        assert!(dir.find_one("Asset", &Filters::new()).is_ok());
    }
}
