//! Projections of records into reduced shapes.
//!
//! A [`Projection`] is a list of output columns, the equivalent of a select
//! list. A column reads a field (optionally renamed) or computes a value with
//! an [`Expr`]: a constant, a concatenation, a `CASE` or a scalar subquery.
//! [`FromRecord`] builds a typed DTO from a record, the equivalent of a
//! constructor projection.

use std::borrow::Cow;

use crate::error::QueryError;
use crate::predicate::{Predicate, SubQuery};
use crate::record::{FieldSource, Record};
use crate::value::Value;

/// A computed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(String),
    Constant(Value),
    /// Text concatenation; null if any part is null
    Concat(Vec<Expr>),
    Case(Box<Case>),
    /// Aggregated subquery, null until resolved
    Scalar(SubQuery),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// Concatenates the text form of each part: `username || '_' || age`.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Expr::Concat(parts.into_iter().map(Into::into).collect())
    }

    /// Evaluates the expression against one row.
    pub fn eval<R: FieldSource + ?Sized>(&self, row: &R) -> Value {
        match self {
            Expr::Field(name) => row.field(name).map(Cow::into_owned).unwrap_or_default(),
            Expr::Constant(value) => value.clone(),
            Expr::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part.eval(row).to_text() {
                        Some(piece) => text.push_str(&piece),
                        None => return Value::Null,
                    }
                }
                Value::Text(text)
            }
            Expr::Case(case) => case.eval(row),
            Expr::Scalar(_) => Value::Null,
        }
    }

    fn has_subqueries(&self) -> bool {
        match self {
            Expr::Field(_) | Expr::Constant(_) => false,
            Expr::Concat(parts) => parts.iter().any(Expr::has_subqueries),
            Expr::Case(case) => case.has_subqueries(),
            Expr::Scalar(_) => true,
        }
    }

    fn resolve<E, F>(&self, fetch: &mut F) -> Result<Expr, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let resolved = match self {
            Expr::Field(_) | Expr::Constant(_) => self.clone(),
            Expr::Concat(parts) => {
                let mut resolved = Vec::with_capacity(parts.len());
                for part in parts {
                    resolved.push(part.resolve(&mut *fetch)?);
                }
                Expr::Concat(resolved)
            }
            Expr::Case(case) => Expr::Case(Box::new(case.resolve(fetch)?)),
            Expr::Scalar(sub) => Expr::Constant(sub.scalar(fetch)?),
        };
        Ok(resolved)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Constant(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Constant(Value::from(value))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Constant(Value::from(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Constant(Value::from(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Constant(Value::from(value))
    }
}

impl From<SubQuery> for Expr {
    fn from(sub: SubQuery) -> Self {
        Expr::Scalar(sub)
    }
}

/// `CASE WHEN .. THEN .. ELSE .. END`. Branches are tried in order; a branch
/// whose condition is unknown does not fire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Case {
    branches: Vec<(Predicate, Expr)>,
    otherwise: Option<Expr>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, condition: impl Into<Predicate>, then: impl Into<Expr>) -> Self {
        self.branches.push((condition.into(), then.into()));
        self
    }

    /// Closes the case with an `ELSE` value.
    pub fn otherwise(mut self, value: impl Into<Expr>) -> Expr {
        self.otherwise = Some(value.into());
        Expr::Case(Box::new(self))
    }

    /// Closes the case without `ELSE`; unmatched rows yield null.
    pub fn end(self) -> Expr {
        Expr::Case(Box::new(self))
    }

    fn eval<R: FieldSource + ?Sized>(&self, row: &R) -> Value {
        self.branches
            .iter()
            .find(|(condition, _)| condition.matches(row))
            .map(|(_, then)| then)
            .or(self.otherwise.as_ref())
            .map_or(Value::Null, |expr| expr.eval(row))
    }

    fn has_subqueries(&self) -> bool {
        self.branches
            .iter()
            .any(|(condition, then)| condition.has_subqueries() || then.has_subqueries())
            || self.otherwise.as_ref().is_some_and(Expr::has_subqueries)
    }

    fn resolve<E, F>(&self, fetch: &mut F) -> Result<Case, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let mut branches = Vec::with_capacity(self.branches.len());
        for (condition, then) in &self.branches {
            branches.push((condition.resolve(&mut *fetch)?, then.resolve(&mut *fetch)?));
        }
        let otherwise = match &self.otherwise {
            Some(expr) => Some(expr.resolve(fetch)?),
            None => None,
        };
        Ok(Case {
            branches,
            otherwise,
        })
    }
}

/// One projected column.
#[derive(Debug, Clone, PartialEq)]
struct Column {
    expr: Expr,
    alias: String,
}

impl Column {
    fn field(name: String) -> Self {
        Self {
            expr: Expr::Field(name.clone()),
            alias: name,
        }
    }
}

/// Output columns with optional aliases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    columns: Vec<Column>,
}

impl Projection {
    /// Selects the given fields under their own names.
    pub fn of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = fields
            .into_iter()
            .map(|f| Column::field(f.into()))
            .collect();
        Self { columns }
    }

    /// Adds a field under a different output name.
    pub fn alias(mut self, source: impl Into<String>, alias: impl Into<String>) -> Self {
        self.columns.push(Column {
            expr: Expr::Field(source.into()),
            alias: alias.into(),
        });
        self
    }

    /// Adds a field under its own name.
    pub fn and(mut self, field: impl Into<String>) -> Self {
        self.columns.push(Column::field(field.into()));
        self
    }

    /// Adds a computed column.
    pub fn computed(mut self, alias: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.columns.push(Column {
            expr: expr.into(),
            alias: alias.into(),
        });
        self
    }

    /// Adds a column holding the same value for every row.
    pub fn constant(self, alias: impl Into<String>, value: impl Into<Value>) -> Self {
        self.computed(alias, Expr::Constant(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Output field names in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.alias.as_str())
    }

    /// Returns `true` if a column needs a subquery run first.
    pub fn has_subqueries(&self) -> bool {
        self.columns.iter().any(|c| c.expr.has_subqueries())
    }

    /// Runs the subqueries of every column through `fetch` and replaces
    /// them with their values.
    pub fn resolve<E, F>(&self, fetch: &mut F) -> Result<Projection, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            columns.push(Column {
                expr: column.expr.resolve(&mut *fetch)?,
                alias: column.alias.clone(),
            });
        }
        Ok(Projection { columns })
    }

    /// Projects a row. Missing source fields project as null.
    pub fn apply<R: FieldSource + ?Sized>(&self, row: &R) -> Record {
        self.columns
            .iter()
            .map(|c| (c.alias.clone(), c.expr.eval(row)))
            .collect()
    }

    /// Projects a row and returns the values in column order.
    pub fn apply_tuple<R: FieldSource + ?Sized>(&self, row: &R) -> Vec<Value> {
        self.columns.iter().map(|c| c.expr.eval(row)).collect()
    }
}

/// Typed construction from a record.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, QueryError>;
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> Result<Self, QueryError> {
        Ok(record.clone())
    }
}
