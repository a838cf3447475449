//! Placeholder substitution for flow documents.
//!
//! Flow documents may reference variables with `${NAME}` syntax. Substitution
//! is *safe*: a placeholder nobody defines is left verbatim, so shell
//! snippets such as `${HOME}` inside a `command` step survive when the
//! variable is meant for the shell.
//!
//! # Syntax
//!
//! - `${NAME}` - replaced with the variable value, if defined
//! - `$${NAME}` - produces literal `${NAME}` in output
//! - `$$` - produces a single `$`
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use actionflow::config::{substitute, InterpolationContext};
//!
//! let ctx = InterpolationContext::default()
//!     .with_document(HashMap::from([("RELEASE".to_string(), "17.0".to_string())]));
//! assert_eq!(substitute("v${RELEASE} ${UNSET}", &ctx), "v17.0 ${UNSET}");
//! ```

use std::collections::{HashMap, HashSet};

use super::settings::SETTINGS_VARS;

/// Prefix marking process variables that override document values.
pub const OVERRIDE_PREFIX: &str = "AF_";

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Parse a string containing `${var}` placeholders.
///
/// An unterminated `${` is kept as literal text.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(escaped) = after.strip_prefix('$') {
            // `$$` collapses to `$`, which also turns `$${X}` into a literal `${X}`.
            literal.push('$');
            if let Some(body) = escaped.strip_prefix('{') {
                match body.find('}') {
                    Some(end) => {
                        literal.push('{');
                        literal.push_str(&body[..=end]);
                        rest = &body[end + 1..];
                    }
                    None => rest = escaped,
                }
            } else {
                rest = escaped;
            }
            continue;
        }

        match after.strip_prefix('{').and_then(|body| Some((body, body.find('}')?))) {
            Some((body, end)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(body[..end].to_string()));
                rest = &body[end + 1..];
            }
            None => {
                literal.push('$');
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Extract all variable names from an interpolated string.
pub fn extract_variables(input: &str) -> HashSet<String> {
    parse_interpolation(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Check if a string contains any placeholder.
pub fn has_interpolation(input: &str) -> bool {
    parse_interpolation(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Variable(_)))
}

/// Variables available to placeholders.
///
/// Variables are resolved in priority order:
/// 1. Process variables prefixed `AF_` (prefix stripped), except the
///    settings variables such as `AF_HOME`
/// 2. The document's `env` mapping
/// 3. The plain process environment
#[derive(Debug, Default, Clone)]
pub struct InterpolationContext {
    /// `AF_`-prefixed process variables, prefix stripped
    pub overrides: HashMap<String, String>,

    /// Document `env` values
    pub document: HashMap<String, String>,

    /// Process environment
    pub process: HashMap<String, String>,
}

impl InterpolationContext {
    /// Build the override and process layers from a process environment.
    pub fn from_process<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let process: HashMap<String, String> = vars.into_iter().collect();
        let overrides = process
            .iter()
            .filter(|(key, _)| !SETTINGS_VARS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                key.strip_prefix(OVERRIDE_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect();
        Self {
            overrides,
            process,
            ..Default::default()
        }
    }

    /// Attach the document's `env` values.
    pub fn with_document(mut self, document: HashMap<String, String>) -> Self {
        self.document = document;
        self
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.overrides
            .get(name)
            .or_else(|| self.document.get(name))
            .or_else(|| self.process.get(name))
            .map(String::as_str)
    }
}

/// Substitute every known placeholder in `input`; unknown ones stay verbatim.
pub fn substitute(input: &str, context: &InterpolationContext) -> String {
    let mut result = String::with_capacity(input.len());
    for segment in parse_interpolation(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => match context.resolve(&name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("${");
                    result.push_str(&name);
                    result.push('}');
                }
            },
        }
    }
    result
}
