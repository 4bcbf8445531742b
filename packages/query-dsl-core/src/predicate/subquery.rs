//! Subqueries over the same store.
//!
//! A subquery selects one field from the rows matching its own predicate,
//! either as a list of values (`age IN (SELECT age ...)`) or folded through
//! an aggregate into a scalar (`age = (SELECT max(age) ...)`). Stores never
//! see subqueries: the repository runs them first and substitutes the
//! results as plain operands.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::expr::Predicate;
use crate::error::QueryError;
use crate::record::{FieldSource, Record};
use crate::value::Value;

/// Aggregate function applied to the selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Max => "max",
            Aggregate::Min => "min",
        }
    }

    /// Folds the non-null values of a column.
    ///
    /// # Arguments
    /// * `field` - Column name, used in error messages
    /// * `values` - Column values; nulls are skipped as in SQL
    ///
    /// # Returns
    /// `Count` is never null. Every other aggregate over no values is null.
    /// `Avg` is always a float; `Sum` stays an int unless a float is present.
    ///
    /// # Errors
    /// `TypeMismatch` when `Sum`/`Avg` meet a non-number, `InvalidArgument`
    /// when `Max`/`Min` meet values that do not compare or an int `Sum`
    /// overflows.
    pub fn apply<I>(&self, field: &str, values: I) -> Result<Value, QueryError>
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        if let Aggregate::Count = self {
            return Ok(Value::Int(values.len() as i64));
        }
        if values.is_empty() {
            return Ok(Value::Null);
        }

        match self {
            Aggregate::Max => extreme(field, values, Ordering::Greater),
            Aggregate::Min => extreme(field, values, Ordering::Less),
            Aggregate::Sum => sum(field, &values),
            Aggregate::Avg => {
                let total = numbers(field, &values)?.sum::<f64>();
                Ok(Value::Float(total / values.len() as f64))
            }
            Aggregate::Count => Ok(Value::Int(values.len() as i64)),
        }
    }
}

fn numbers<'a>(
    field: &'a str,
    values: &'a [Value],
) -> Result<impl Iterator<Item = f64> + 'a, QueryError> {
    if let Some(other) = values.iter().find(|v| v.as_f64().is_none()) {
        return Err(QueryError::TypeMismatch {
            field: field.to_string(),
            expected: "number",
            got: other.kind(),
        });
    }
    Ok(values.iter().filter_map(Value::as_f64))
}

fn sum(field: &str, values: &[Value]) -> Result<Value, QueryError> {
    if values.iter().all(|v| matches!(v, Value::Int(_))) {
        let mut total = 0i64;
        for value in values.iter().filter_map(Value::as_i64) {
            total = total.checked_add(value).ok_or_else(|| {
                QueryError::invalid(format!("sum of '{}' overflows", field))
            })?;
        }
        return Ok(Value::Int(total));
    }
    Ok(Value::Float(numbers(field, values)?.sum()))
}

fn extreme(field: &str, values: Vec<Value>, keep: Ordering) -> Result<Value, QueryError> {
    let mut values = values.into_iter();
    let mut best = values.next().unwrap_or_default();
    for value in values {
        match value.compare(&best) {
            Some(ord) if ord == keep => best = value,
            Some(_) => {}
            None => {
                return Err(QueryError::invalid(format!(
                    "cannot aggregate '{}': {} and {} do not compare",
                    field, best, value
                )))
            }
        }
    }
    Ok(best)
}

/// A field selected from the rows matching a nested predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    field: String,
    aggregate: Option<Aggregate>,
    predicate: Box<Predicate>,
}

impl SubQuery {
    /// Selects `field` of every matching row.
    pub fn select(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            aggregate: None,
            predicate: Box::new(Predicate::MatchAll),
        }
    }

    /// Selects `aggregate(field)` over the matching rows.
    pub fn aggregate(aggregate: Aggregate, field: impl Into<String>) -> Self {
        Self {
            aggregate: Some(aggregate),
            ..Self::select(field)
        }
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Max, field)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Min, field)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Avg, field)
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Sum, field)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Count, field)
    }

    /// Restricts the rows the subquery reads.
    pub fn matching(mut self, predicate: impl Into<Predicate>) -> Self {
        self.predicate = Box::new(predicate.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn aggregate_fn(&self) -> Option<Aggregate> {
        self.aggregate
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Aggregated subqueries yield exactly one value.
    pub fn is_scalar(&self) -> bool {
        self.aggregate.is_some()
    }

    /// Runs the subquery and returns the selected values.
    ///
    /// Nested subqueries in the predicate are resolved first. An aggregated
    /// subquery returns a single value.
    pub fn values<E, F>(&self, fetch: &mut F) -> Result<Vec<Value>, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let predicate = self.predicate.resolve(&mut *fetch)?;
        let rows = fetch(&predicate)?;
        let column = rows.iter().map(|row| {
            row.field(&self.field)
                .map(Cow::into_owned)
                .unwrap_or_default()
        });

        match self.aggregate {
            Some(aggregate) => Ok(vec![aggregate.apply(&self.field, column)?]),
            None => Ok(column.collect()),
        }
    }

    /// Runs an aggregated subquery.
    ///
    /// # Errors
    /// `InvalidArgument` when the subquery has no aggregate.
    pub fn scalar<E, F>(&self, fetch: &mut F) -> Result<Value, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        if !self.is_scalar() {
            return Err(QueryError::invalid(format!(
                "subquery on '{}' needs an aggregate to yield one value",
                self.field
            ))
            .into());
        }
        Ok(self.values(fetch)?.pop().unwrap_or_default())
    }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregate {
            Some(aggregate) => write!(f, "SELECT {}({})", aggregate.as_str(), self.field)?,
            None => write!(f, "SELECT {}", self.field)?,
        }
        if !self.predicate.is_match_all() {
            write!(f, " WHERE {}", self.predicate)?;
        }
        Ok(())
    }
}
