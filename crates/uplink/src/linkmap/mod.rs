//! Link map: rules that map file paths to remote entities.
//!
//! Each line of the link map reads `EntityType: pattern`. Patterns are
//! compiled once into a [`RuleSet`]; [`resolve`] walks the set in order and
//! asks the [`EntityDirectory`](crate::directory::EntityDirectory) for the
//! entity the captured values describe.

pub mod patterns;
pub mod resolver;
pub mod rules;

pub use patterns::{compile, compile_pattern, CompiledMatcher};
pub use resolver::{resolve, LinkResolver};
pub use rules::{MappingRule, RuleSet, RuleWarning};
