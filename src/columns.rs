//! Declared column set of a log table.
//!
//! The baseline columns are always present; additional fields are appended
//! in configuration order. Names are checked against a conservative
//! allow-list because they end up spliced into DDL and placeholder names.

use crate::errors::SinkError;

pub const ID: &str = "id";
pub const CHANNEL: &str = "channel";
pub const LEVEL: &str = "level";
pub const MESSAGE: &str = "message";
pub const TIME: &str = "time";

/// Fixed columns in table order.
pub const BASELINE: [&str; 5] = [ID, CHANNEL, LEVEL, MESSAGE, TIME];

const MAX_IDENTIFIER_LEN: usize = 64;

/// Accept `[A-Za-z_][A-Za-z0-9_]*` up to 64 characters.
pub fn validate_identifier(name: &str) -> Result<(), SinkError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if head_ok && tail_ok && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(SinkError::InvalidIdentifier(name.to_string()))
    }
}

/// SQL identifiers are case-insensitive, so every comparison folds case.
pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

pub fn is_baseline(name: &str) -> bool {
    BASELINE.iter().any(|b| same_name(b, name))
}

/// Ordered, duplicate-free list of column names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSet {
    names: Vec<String>,
}

impl ColumnSet {
    /// Only the baseline columns.
    pub fn baseline() -> Self {
        Self {
            names: BASELINE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Baseline followed by `additional`, skipping names already present.
    pub fn with_additional<S: AsRef<str>>(additional: &[S]) -> Result<Self, SinkError> {
        let mut set = Self::baseline();
        for field in additional {
            let field = field.as_ref();
            validate_identifier(field)?;
            if !set.contains(field) {
                set.names.push(field.to_string());
            }
        }
        Ok(set)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    /// The declared spelling of `name`, if it names a column of this set.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .find(|n| same_name(n, name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The non-baseline columns, in declaration order.
    pub fn additional(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|n| !is_baseline(n))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::baseline()
    }
}
