//! Link map rules and rule sets.

use super::patterns::{compile_pattern, CompiledMatcher};
use crate::error::{Result, UplinkError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// One `EntityType: pattern` line of the link map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Entity type to look up when the pattern matches (e.g. "Asset")
    pub entity_type: String,
    /// Path pattern with globs and `$variables`
    pub pattern: String,
}

impl MappingRule {
    pub fn new(entity_type: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            pattern: pattern.into(),
        }
    }

    /// Parse a single `EntityType: pattern` line.
    ///
    /// Splits on the first `:` so patterns may contain colons themselves.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let malformed = |reason: &str| UplinkError::MalformedRule {
            text: line.to_string(),
            reason: reason.to_string(),
        };

        let (entity_type, pattern) = line
            .split_once(':')
            .ok_or_else(|| malformed("expected 'EntityType: pattern'"))?;
        let entity_type = entity_type.trim();
        let pattern = pattern.trim();

        if entity_type.is_empty() {
            return Err(malformed("missing entity type"));
        }
        if pattern.is_empty() {
            return Err(malformed("missing pattern"));
        }

        Ok(Self::new(entity_type, pattern))
    }

    pub fn compile(&self) -> Result<CompiledMatcher> {
        compile_pattern(&self.entity_type, &self.pattern)
    }
}

impl fmt::Display for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity_type, self.pattern)
    }
}

/// A link map line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleWarning {
    /// 1-based line number in the link map text
    pub line: usize,
    pub text: String,
    pub reason: String,
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Couldn't parse link map line {} '{}': {}",
            self.line, self.text, self.reason
        )
    }
}

/// Compiled rules in declaration order.
///
/// Built once whenever the link map changes and then shared read-only by
/// every resolution. Broken lines never prevent the remaining rules from
/// compiling; they are collected as warnings instead.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    matchers: Vec<CompiledMatcher>,
    warnings: Vec<RuleWarning>,
}

impl RuleSet {
    /// Parse newline-delimited link map text.
    pub fn parse(text: &str) -> Self {
        let mut set = RuleSet::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match MappingRule::parse(line).and_then(|rule| rule.compile()) {
                Ok(matcher) => set.matchers.push(matcher),
                Err(err) => {
                    let reason = match err {
                        UplinkError::MalformedRule { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    let warning = RuleWarning {
                        line: idx + 1,
                        text: line.to_string(),
                        reason,
                    };
                    warn!(line = warning.line, rule = %warning.text, reason = %warning.reason, "Skipping malformed link map rule");
                    set.warnings.push(warning);
                }
            }
        }

        set
    }

    /// Compile already-split rules, skipping the ones that fail.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a MappingRule>) -> Self {
        let mut set = RuleSet::default();
        for (idx, rule) in rules.into_iter().enumerate() {
            match rule.compile() {
                Ok(matcher) => set.matchers.push(matcher),
                Err(err) => {
                    warn!(rule = %rule, error = %err, "Skipping rule that failed to compile");
                    set.warnings.push(RuleWarning {
                        line: idx + 1,
                        text: rule.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        set
    }

    pub fn matchers(&self) -> &[CompiledMatcher] {
        &self.matchers
    }

    pub fn warnings(&self) -> &[RuleWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Entity types referenced by the rule set, in first-seen order.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for matcher in &self.matchers {
            if !types.contains(&matcher.entity_type()) {
                types.push(matcher.entity_type());
            }
        }
        types
    }
}
