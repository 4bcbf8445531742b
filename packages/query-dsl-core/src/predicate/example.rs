//! Query by example: derive a predicate from a partially filled probe record.

use std::collections::BTreeSet;

use super::builder::{build_predicate, CombinedPredicate};
use super::condition::{escape_like, Filter};
use crate::record::Record;
use crate::value::Value;

/// How text fields of the probe are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMatcher {
    #[default]
    Exact,
    Starting,
    Ending,
    Containing,
}

/// Rules for turning a probe into filters.
#[derive(Debug, Clone, Default)]
pub struct ExampleMatcher {
    ignored_paths: BTreeSet<String>,
    string_matcher: StringMatcher,
    include_null_values: bool,
}

impl ExampleMatcher {
    /// Matcher that compares every non-null probe field for equality.
    pub fn matching() -> Self {
        Self::default()
    }

    pub fn with_ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_string_matcher(mut self, matcher: StringMatcher) -> Self {
        self.string_matcher = matcher;
        self
    }

    /// Null probe fields become `IS NULL` filters instead of being skipped.
    pub fn with_include_null_values(mut self) -> Self {
        self.include_null_values = true;
        self
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths.contains(path)
    }
}

/// A probe record together with its matcher.
#[derive(Debug, Clone)]
pub struct Example {
    probe: Record,
    matcher: ExampleMatcher,
}

impl Example {
    pub fn of(probe: Record, matcher: ExampleMatcher) -> Self {
        Self { probe, matcher }
    }

    pub fn probe(&self) -> &Record {
        &self.probe
    }

    /// Converts the probe into a conjunction of field filters.
    pub fn to_predicate(&self) -> CombinedPredicate {
        let filters = self
            .probe
            .iter()
            .filter(|(name, _)| !self.matcher.is_ignored(name))
            .map(|(name, value)| self.filter_for(name, value));
        build_predicate(filters)
    }

    fn filter_for(&self, name: &str, value: &Value) -> Filter {
        match value {
            Value::Null if self.matcher.include_null_values => Filter::is_null(name),
            Value::Null => Filter::eq(name, None::<Value>),
            Value::Text(text) => {
                let literal = escape_like(text);
                let pattern = match self.matcher.string_matcher {
                    StringMatcher::Exact => return Filter::eq(name, Some(text.as_str())),
                    StringMatcher::Starting => format!("{}%", literal),
                    StringMatcher::Ending => format!("%{}", literal),
                    StringMatcher::Containing => format!("%{}%", literal),
                };
                Filter::like(name, Some(pattern.as_str()))
            }
            other => Filter::eq(name, Some(other.clone())),
        }
    }
}
