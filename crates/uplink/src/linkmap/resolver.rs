//! Link resolution: path -> remote entity.
//!
//! Rules are tried in declaration order. The first rule whose pattern matches
//! the path *and* whose directory lookup finds an entity wins.

use super::rules::RuleSet;
use crate::directory::EntityDirectory;
use crate::error::{Result, UplinkError};
use crate::types::Link;
use tracing::{debug, warn};

/// Resolve the link for `path`.
///
/// Returns `Ok(None)` when no rule produced an entity. A transient directory
/// failure only disqualifies the rule being evaluated; an authorization or
/// schema failure is returned immediately.
pub fn resolve<D>(path: &str, rules: &RuleSet, directory: &D) -> Result<Option<Link>>
where
    D: EntityDirectory + ?Sized,
{
    for (idx, matcher) in rules.matchers().iter().enumerate() {
        let Some(filters) = matcher.filters(path) else {
            continue;
        };

        debug!(
            path,
            rule = idx,
            entity_type = matcher.entity_type(),
            ?filters,
            "Link map rule matched"
        );

        match directory.find_one(matcher.entity_type(), &filters) {
            Ok(Some(record)) => {
                let link = Link::from_record(&record);
                debug!(path, entity_type = %link.entity_type, id = link.id, "Resolved link");
                return Ok(Some(link));
            }
            Ok(None) => continue,
            Err(err) => match UplinkError::from(err) {
                UplinkError::DirectoryTransient(err) => {
                    warn!(
                        path,
                        rule = idx,
                        entity_type = matcher.entity_type(),
                        error = %err,
                        "Directory lookup failed; treating rule as no match"
                    );
                    continue;
                }
                fatal => return Err(fatal),
            },
        }
    }

    Ok(None)
}

/// Resolver bound to one rule set and one directory.
pub struct LinkResolver<'a, D: ?Sized> {
    rules: &'a RuleSet,
    directory: &'a D,
}

impl<'a, D> LinkResolver<'a, D>
where
    D: EntityDirectory + ?Sized,
{
    pub fn new(rules: &'a RuleSet, directory: &'a D) -> Self {
        Self { rules, directory }
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    pub fn resolve(&self, path: &str) -> Result<Option<Link>> {
        resolve(path, self.rules, self.directory)
    }
}
