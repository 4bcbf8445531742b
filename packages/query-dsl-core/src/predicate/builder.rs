//! Combining optional filters into one predicate.

use std::fmt;

use super::condition::{Condition, Filter};
use super::expr::{IntoPredicate, Predicate};
use crate::record::FieldSource;

/// Ordered conjunction of present conditions.
///
/// Absent filters never appear here. An empty conjunction matches every
/// record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedPredicate {
    conditions: Vec<Condition>,
}

impl CombinedPredicate {
    /// A predicate with no conditions.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns `true` when no condition survived, i.e. every record matches.
    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches<R: FieldSource + ?Sized>(&self, row: &R) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Appends the conditions of `other`, keeping order.
    pub fn and(mut self, other: CombinedPredicate) -> CombinedPredicate {
        self.conditions.extend(other.conditions);
        self
    }

    /// Disjunction with another predicate.
    pub fn or(self, other: impl Into<Predicate>) -> Predicate {
        Predicate::from(self).or(other)
    }
}

impl From<CombinedPredicate> for Predicate {
    fn from(combined: CombinedPredicate) -> Self {
        let mut conditions = combined.conditions;
        match conditions.len() {
            0 => Predicate::MatchAll,
            1 => Predicate::Condition(conditions.remove(0)),
            _ => Predicate::And(conditions.into_iter().map(Predicate::Condition).collect()),
        }
    }
}

impl fmt::Display for CombinedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

/// Builds the conjunction of every present filter.
///
/// # Arguments
/// * `filters` - Candidate filters in evaluation order
///
/// # Returns
/// A `CombinedPredicate` holding the present conditions in input order.
/// When every filter is absent the result matches all records.
pub fn build_predicate<I>(filters: I) -> CombinedPredicate
where
    I: IntoIterator<Item = Filter>,
{
    let mut skipped = 0usize;
    let conditions: Vec<Condition> = filters
        .into_iter()
        .filter_map(|filter| {
            let condition = filter.into_condition();
            if condition.is_none() {
                skipped += 1;
            }
            condition
        })
        .collect();

    if conditions.is_empty() {
        tracing::debug!(
            "No present filters ({} absent), predicate matches all records",
            skipped
        );
    } else {
        tracing::debug!(
            "Built predicate with {} conditions ({} absent skipped)",
            conditions.len(),
            skipped
        );
    }

    CombinedPredicate { conditions }
}

/// Mutable accumulator for dynamic `and`/`or` chains.
///
/// Absent inputs are ignored. A builder that never received a present
/// input builds `Predicate::MatchAll`; the first present input becomes the
/// whole expression regardless of whether it arrived through `and` or `or`.
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    current: Option<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, part: impl IntoPredicate) -> &mut Self {
        if let Some(p) = part.into_predicate() {
            self.current = Some(match self.current.take() {
                Some(current) => current.and(p),
                None => p,
            });
        }
        self
    }

    pub fn or(&mut self, part: impl IntoPredicate) -> &mut Self {
        if let Some(p) = part.into_predicate() {
            self.current = Some(match self.current.take() {
                Some(current) => current.or(p),
                None => p,
            });
        }
        self
    }

    pub fn and_not(&mut self, part: impl IntoPredicate) -> &mut Self {
        self.and(part.into_predicate().map(Predicate::not))
    }

    pub fn or_not(&mut self, part: impl IntoPredicate) -> &mut Self {
        self.or(part.into_predicate().map(Predicate::not))
    }

    /// Returns `true` once any present input has been added.
    pub fn has_value(&self) -> bool {
        self.current.is_some()
    }

    pub fn build(&self) -> Predicate {
        self.current.clone().unwrap_or_default()
    }
}
