//! Boolean predicate expressions.

use std::fmt;

use super::builder::CombinedPredicate;
use super::condition::{Condition, Filter};
use crate::error::QueryError;
use crate::record::{FieldSource, Record};

/// Boolean expression over record fields.
///
/// Grouping is explicit in the tree, so `a.and(b).or(c)` is `(a AND b) OR c`.
/// `MatchAll` is the identity of `and` and absorbs `or`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    #[default]
    MatchAll,
    Condition(Condition),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Conjunction of every present input; absent inputs are skipped.
    pub fn all<I>(parts: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoPredicate,
    {
        parts
            .into_iter()
            .filter_map(IntoPredicate::into_predicate)
            .fold(Predicate::MatchAll, |acc, p| acc.and(p))
    }

    /// Disjunction of every present input; absent inputs are skipped.
    ///
    /// With no present input the result matches everything, the same as an
    /// empty `where` clause.
    pub fn any<I>(parts: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoPredicate,
    {
        let mut present = parts.into_iter().filter_map(IntoPredicate::into_predicate);
        match present.next() {
            None => Predicate::MatchAll,
            Some(first) => present.fold(first, |acc, p| acc.or(p)),
        }
    }

    pub fn and(self, other: impl Into<Predicate>) -> Predicate {
        match (self, other.into()) {
            (Predicate::MatchAll, p) | (p, Predicate::MatchAll) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(mut right)) => {
                right.insert(0, p);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    pub fn or(self, other: impl Into<Predicate>) -> Predicate {
        match (self, other.into()) {
            (Predicate::MatchAll, _) | (_, Predicate::MatchAll) => Predicate::MatchAll,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, Predicate::Or(mut right)) => {
                right.insert(0, p);
                Predicate::Or(right)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        match self {
            Predicate::Not(inner) => *inner,
            p => Predicate::Not(Box::new(p)),
        }
    }

    /// Returns `true` if the predicate places no constraint on records.
    pub fn is_match_all(&self) -> bool {
        match self {
            Predicate::MatchAll => true,
            Predicate::And(parts) => parts.iter().all(Predicate::is_match_all),
            _ => false,
        }
    }

    /// Returns `true` only when the predicate is known to hold for the row.
    pub fn matches<R: FieldSource + ?Sized>(&self, row: &R) -> bool {
        self.evaluate(row) == Some(true)
    }

    /// Evaluates the predicate under SQL three-valued logic.
    ///
    /// `None` is unknown: `NOT unknown` stays unknown, `AND` is false if any
    /// part is false and `OR` is true if any part is true.
    pub fn evaluate<R: FieldSource + ?Sized>(&self, row: &R) -> Option<bool> {
        match self {
            Predicate::MatchAll => Some(true),
            Predicate::Condition(c) => c.evaluate(row),
            Predicate::And(parts) => {
                let mut result = Some(true);
                for part in parts {
                    match part.evaluate(row) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Predicate::Or(parts) => {
                let mut result = Some(false);
                for part in parts {
                    match part.evaluate(row) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Predicate::Not(inner) => inner.evaluate(row).map(|b| !b),
        }
    }

    /// Returns `true` if any condition compares against a subquery.
    pub fn has_subqueries(&self) -> bool {
        self.conditions().iter().any(|c| c.has_subquery())
    }

    /// Runs every subquery in the tree through `fetch` and substitutes the
    /// selected values, leaving a predicate a store can evaluate row by row.
    pub fn resolve<E, F>(&self, fetch: &mut F) -> Result<Predicate, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let resolved = match self {
            Predicate::MatchAll => Predicate::MatchAll,
            Predicate::Condition(c) => Predicate::Condition(c.resolve(fetch)?),
            Predicate::And(parts) | Predicate::Or(parts) => {
                let mut resolved = Vec::with_capacity(parts.len());
                for part in parts {
                    resolved.push(part.resolve(&mut *fetch)?);
                }
                if matches!(self, Predicate::And(_)) {
                    Predicate::And(resolved)
                } else {
                    Predicate::Or(resolved)
                }
            }
            Predicate::Not(inner) => Predicate::Not(Box::new(inner.resolve(fetch)?)),
        };
        Ok(resolved)
    }

    /// Visits every condition in the tree, depth first.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::MatchAll => {}
            Predicate::Condition(c) => out.push(c),
            Predicate::And(parts) | Predicate::Or(parts) => {
                for p in parts {
                    p.collect_conditions(out);
                }
            }
            Predicate::Not(inner) => inner.collect_conditions(out),
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(parts) | Predicate::Or(parts) if parts.len() > 1 => {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::MatchAll => write!(f, "TRUE"),
            Predicate::Condition(c) => write!(f, "{}", c),
            Predicate::And(parts) | Predicate::Or(parts) => {
                if parts.is_empty() {
                    let empty = if matches!(self, Predicate::And(_)) { "TRUE" } else { "FALSE" };
                    return write!(f, "{}", empty);
                }
                let joiner = if matches!(self, Predicate::And(_)) { " AND " } else { " OR " };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    part.fmt_child(f)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => {
                write!(f, "NOT ")?;
                inner.fmt_child(f)
            }
        }
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

/// Anything that may contribute a predicate, or nothing when absent.
pub trait IntoPredicate {
    fn into_predicate(self) -> Option<Predicate>;
}

impl IntoPredicate for Predicate {
    fn into_predicate(self) -> Option<Predicate> {
        Some(self)
    }
}

impl IntoPredicate for Condition {
    fn into_predicate(self) -> Option<Predicate> {
        Some(Predicate::Condition(self))
    }
}

impl IntoPredicate for CombinedPredicate {
    fn into_predicate(self) -> Option<Predicate> {
        Some(self.into())
    }
}

impl IntoPredicate for Filter {
    fn into_predicate(self) -> Option<Predicate> {
        self.into_condition().map(Predicate::Condition)
    }
}

impl<T: IntoPredicate> IntoPredicate for Option<T> {
    fn into_predicate(self) -> Option<Predicate> {
        self.and_then(IntoPredicate::into_predicate)
    }
}
