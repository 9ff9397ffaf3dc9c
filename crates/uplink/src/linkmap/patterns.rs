//! Path pattern compilation.
//!
//! A link map pattern is a path with glob wildcards and `$variables`:
//!
//! ```text
//! /job_root/*/assets/$type/${name}
//! ```
//!
//! - `*` matches one or more characters within a path segment
//! - `?` matches exactly one character
//! - `$name` / `${name}` captures one path segment and binds it to `name`
//! - `$$` is a literal `$`
//!
//! Everything else matches literally. The compiled regex is unanchored, so a
//! pattern can match anywhere inside a path.

use super::rules::MappingRule;
use crate::directory::Filters;
use crate::error::{Result, UplinkError};
use regex::Regex;
use std::path::MAIN_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    AnySegment,
    AnyChar,
    Variable(String),
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_char(ch: char) -> bool {
    ch == '_' || ch == '.' || ch.is_ascii_alphanumeric()
}

/// Read an identifier starting at `start`, returning it and the index after it.
fn read_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    match chars.get(start) {
        Some(&ch) if is_ident_start(ch) => {}
        _ => return None,
    }
    let end = chars[start..]
        .iter()
        .position(|&ch| !is_ident_char(ch))
        .map(|offset| start + offset)
        .unwrap_or(chars.len());
    Some((chars[start..end].iter().collect(), end))
}

/// Parse a variable reference right after a lone `$` at `start`.
fn read_variable(chars: &[char], start: usize) -> Option<(String, usize)> {
    if chars.get(start) == Some(&'{') {
        let (name, end) = read_ident(chars, start + 1)?;
        if chars.get(end) == Some(&'}') {
            return Some((name, end + 1));
        }
        return None;
    }
    read_ident(chars, start)
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Literal(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '$' => {
                let run = chars[i..].iter().take_while(|&&ch| ch == '$').count();
                for _ in 0..run / 2 {
                    push_literal(&mut tokens, "$");
                }
                i += run;
                if run % 2 == 1 {
                    match read_variable(&chars, i) {
                        Some((name, next)) => {
                            tokens.push(Token::Variable(name));
                            i = next;
                        }
                        None => push_literal(&mut tokens, "$"),
                    }
                }
            }
            '*' => {
                tokens.push(Token::AnySegment);
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            ch => {
                let mut buf = [0u8; 4];
                push_literal(&mut tokens, ch.encode_utf8(&mut buf));
                i += 1;
            }
        }
    }

    tokens
}

/// One or more characters that are not the path separator.
fn segment_class() -> String {
    format!("[^{}]+", regex::escape(&MAIN_SEPARATOR.to_string()))
}

/// A mapping rule compiled into a reusable matcher.
///
/// Immutable once built; safe to share across any number of resolutions.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    entity_type: String,
    raw_pattern: String,
    regex: Regex,
    /// Variable name per capture group, in group order.
    variables: Vec<String>,
}

impl CompiledMatcher {
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Variable names in the order their groups appear. Duplicates are kept.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Captured `(variable, text)` pairs for the leftmost match, in group order.
    pub fn captures(&self, path: &str) -> Option<Vec<(&str, String)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.variables
                .iter()
                .enumerate()
                .filter_map(|(idx, name)| {
                    caps.get(idx + 1)
                        .map(|m| (name.as_str(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// Equality filters for a matching path.
    ///
    /// When a variable occurs more than once, the last occurrence wins.
    pub fn filters(&self, path: &str) -> Option<Filters> {
        let captures = self.captures(path)?;
        let mut filters = Filters::new();
        for (name, value) in captures {
            filters.insert(name.to_string(), value);
        }
        Some(filters)
    }
}

/// Compile a pattern for `entity_type`.
pub fn compile_pattern(entity_type: &str, pattern: &str) -> Result<CompiledMatcher> {
    let segment = segment_class();
    let mut expr = String::with_capacity(pattern.len() * 2);
    let mut variables = Vec::new();

    for token in tokenize(pattern) {
        match token {
            Token::Literal(text) => expr.push_str(&regex::escape(&text)),
            Token::AnySegment => expr.push_str(&segment),
            Token::AnyChar => expr.push('.'),
            Token::Variable(name) => {
                expr.push('(');
                expr.push_str(&segment);
                expr.push(')');
                variables.push(name);
            }
        }
    }

    let regex = Regex::new(&expr).map_err(|e| UplinkError::MalformedRule {
        text: format!("{}: {}", entity_type, pattern),
        reason: e.to_string(),
    })?;
    debug_assert_eq!(regex.captures_len(), variables.len() + 1);

    Ok(CompiledMatcher {
        entity_type: entity_type.to_string(),
        raw_pattern: pattern.to_string(),
        regex,
        variables,
    })
}

/// Compile a full rule line such as `Asset: /jobs/*/assets/$type/$code`.
pub fn compile(raw_rule: &str) -> Result<CompiledMatcher> {
    let rule = MappingRule::parse(raw_rule)?;
    rule.compile()
}
