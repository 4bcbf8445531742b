//! Field conditions and optional filters.

use std::cmp::Ordering;
use std::fmt;

use super::expr::Predicate;
use super::subquery::SubQuery;
use crate::error::QueryError;
use crate::record::{FieldSource, Record};
use crate::value::Value;

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Inclusive on both ends
    Between,
    In,
    /// SQL `LIKE` with `%` and `_` wildcards
    Like,
    IsNull,
    IsNotNull,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Ge => "ge",
            Op::Lt => "lt",
            Op::Le => "le",
            Op::Between => "between",
            Op::In => "in",
            Op::Like => "like",
            Op::IsNull => "isnull",
            Op::IsNotNull => "isnotnull",
        }
    }

    /// Parses an operator name as used in query strings.
    pub fn parse(name: &str) -> Option<Op> {
        let op = match name.to_ascii_lowercase().as_str() {
            "eq" => Op::Eq,
            "ne" => Op::Ne,
            "gt" => Op::Gt,
            "ge" | "goe" => Op::Ge,
            "lt" => Op::Lt,
            "le" | "loe" => Op::Le,
            "between" => Op::Between,
            "in" => Op::In,
            "like" => Op::Like,
            "isnull" => Op::IsNull,
            "isnotnull" => Op::IsNotNull,
            _ => return None,
        };
        Some(op)
    }

    /// Operator symbol as rendered in SQL-like display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Between => "BETWEEN",
            Op::In => "IN",
            Op::Like => "LIKE",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }

    /// Null checks carry no operand and are never absent.
    pub fn is_unary(&self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(Value),
    Range(Value, Value),
    List(Vec<Value>),
    /// Resolved into `Single` or `List` before the store sees it
    Subquery(SubQuery),
}

fn check_shape(field: &str, op: Op, operand: &Operand) -> Result<(), QueryError> {
    let ok = match op {
        Op::IsNull | Op::IsNotNull => matches!(operand, Operand::None),
        Op::Between => matches!(operand, Operand::Range(..)),
        Op::In => matches!(operand, Operand::List(_) | Operand::Subquery(_)),
        Op::Like => matches!(operand, Operand::Single(Value::Text(_))),
        Op::Eq | Op::Ne | Op::Gt | Op::Ge | Op::Lt | Op::Le => match operand {
            Operand::Single(_) => true,
            Operand::Subquery(sub) => sub.is_scalar(),
            _ => false,
        },
    };
    if ok {
        Ok(())
    } else {
        Err(QueryError::invalid(format!(
            "operator '{}' on field '{}' does not accept operand {:?}",
            op.as_str(),
            field,
            operand
        )))
    }
}

/// A present predicate over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    op: Op,
    operand: Operand,
}

impl Condition {
    /// Creates a condition, checking that the operand fits the operator.
    pub fn new(field: impl Into<String>, op: Op, operand: Operand) -> Result<Self, QueryError> {
        let field = field.into();
        check_shape(&field, op, &operand)?;
        Ok(Self { field, op, operand })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Shorthand for `Predicate::from(self).and(other)`.
    pub fn and(self, other: impl Into<Predicate>) -> Predicate {
        Predicate::from(self).and(other)
    }

    /// Shorthand for `Predicate::from(self).or(other)`.
    pub fn or(self, other: impl Into<Predicate>) -> Predicate {
        Predicate::from(self).or(other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::from(self).not()
    }

    pub fn has_subquery(&self) -> bool {
        matches!(self.operand, Operand::Subquery(_))
    }

    /// Replaces a subquery operand with the values it selects.
    pub fn resolve<E, F>(&self, fetch: &mut F) -> Result<Condition, E>
    where
        F: FnMut(&Predicate) -> Result<Vec<Record>, E>,
        E: From<QueryError>,
    {
        let Operand::Subquery(sub) = &self.operand else {
            return Ok(self.clone());
        };
        let operand = match self.op {
            Op::In => Operand::List(sub.values(fetch)?),
            _ => Operand::Single(sub.scalar(fetch)?),
        };
        Ok(Condition {
            field: self.field.clone(),
            op: self.op,
            operand,
        })
    }

    /// Returns `true` only when the condition holds; unknown counts as a miss.
    pub fn matches<R: FieldSource + ?Sized>(&self, row: &R) -> bool {
        self.evaluate(row) == Some(true)
    }

    /// Evaluates the condition under SQL three-valued logic.
    ///
    /// # Returns
    /// `None` (unknown) when the field or the operand is null, when the
    /// kinds do not compare, or when a subquery operand was never resolved.
    /// Only `IsNull`/`IsNotNull` are always known.
    pub fn evaluate<R: FieldSource + ?Sized>(&self, row: &R) -> Option<bool> {
        let value = row.field(&self.field);
        let value = value.as_deref().unwrap_or(&Value::Null);

        match (self.op, &self.operand) {
            (Op::IsNull, _) => Some(value.is_null()),
            (Op::IsNotNull, _) => Some(!value.is_null()),
            (Op::Eq, Operand::Single(expected)) => value.compare(expected).map(Ordering::is_eq),
            (Op::Ne, Operand::Single(expected)) => value.compare(expected).map(Ordering::is_ne),
            (Op::Gt, Operand::Single(bound)) => value.compare(bound).map(Ordering::is_gt),
            (Op::Ge, Operand::Single(bound)) => value.compare(bound).map(Ordering::is_ge),
            (Op::Lt, Operand::Single(bound)) => value.compare(bound).map(Ordering::is_lt),
            (Op::Le, Operand::Single(bound)) => value.compare(bound).map(Ordering::is_le),
            (Op::Between, Operand::Range(low, high)) => {
                let above = value.compare(low).map(Ordering::is_ge);
                let below = value.compare(high).map(Ordering::is_le);
                match (above, below) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            (Op::In, Operand::List(candidates)) => {
                if value.is_null() {
                    return None;
                }
                let mut unknown = false;
                for candidate in candidates {
                    match value.compare(candidate) {
                        Some(Ordering::Equal) => return Some(true),
                        Some(_) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            (Op::Like, Operand::Single(Value::Text(pattern))) => {
                value.as_str().map(|text| like_match(text, pattern))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match (&self.op, &self.operand) {
            (Op::IsNull, _) => write!(f, "{} IS NULL", field),
            (Op::IsNotNull, _) => write!(f, "{} IS NOT NULL", field),
            (Op::Between, Operand::Range(low, high)) => {
                write!(f, "{} BETWEEN {} AND {}", field, low, high)
            }
            (Op::In, Operand::List(values)) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", field, joined.join(", "))
            }
            (op, Operand::Single(value)) => write!(f, "{} {} {}", field, op.symbol(), value),
            (op, Operand::Subquery(sub)) => write!(f, "{} {} ({})", field, op.symbol(), sub),
            (op, operand) => write!(f, "{} {} {:?}", field, op.as_str(), operand),
        }
    }
}

/// Escape character recognised in `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Escapes `%`, `_` and the escape character so `text` matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize_like(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyOne,
            // A trailing escape matches itself
            LIKE_ESCAPE => LikeToken::Literal(chars.next().unwrap_or(LIKE_ESCAPE)),
            c => LikeToken::Literal(c),
        };
        tokens.push(token);
    }
    tokens
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one, and
/// `\` makes the next character literal.
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = tokenize_like(pattern);
    let (mut ti, mut pi) = (0, 0);
    // Position of the last `%` seen and the text index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        let step = match pattern.get(pi) {
            Some(LikeToken::AnyOne) => true,
            Some(LikeToken::Literal(c)) => *c == text[ti],
            _ => false,
        };
        if step {
            ti += 1;
            pi += 1;
        } else if pattern.get(pi) == Some(&LikeToken::AnyRun) {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, absorbed)) = backtrack {
            pi = star + 1;
            ti = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    while pattern.get(pi) == Some(&LikeToken::AnyRun) {
        pi += 1;
    }
    pi == pattern.len()
}

/// A candidate filter whose operand may be absent.
///
/// An absent filter is skipped when predicates are built; it never turns
/// into an `= NULL` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    op: Op,
    operand: Option<Operand>,
}

impl Filter {
    /// Creates a filter from raw parts.
    ///
    /// # Arguments
    /// * `field` - Field name
    /// * `op` - Comparison operator
    /// * `operand` - Operand, or `None` for "do not filter on this field"
    ///
    /// # Returns
    /// `Err(QueryError::InvalidArgument)` if a present operand does not fit `op`.
    pub fn new(
        field: impl Into<String>,
        op: Op,
        operand: Option<Operand>,
    ) -> Result<Self, QueryError> {
        let field = field.into();
        let operand = if op.is_unary() {
            Some(Operand::None)
        } else {
            operand
        };
        if let Some(operand) = &operand {
            check_shape(&field, op, operand)?;
        }
        Ok(Self { field, op, operand })
    }

    fn single<V: Into<Value>>(field: impl Into<String>, op: Op, value: Option<V>) -> Self {
        Self {
            field: field.into(),
            op,
            operand: value.map(|v| Operand::Single(v.into())),
        }
    }

    pub fn eq<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Eq, value)
    }

    pub fn ne<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Ne, value)
    }

    pub fn gt<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Gt, value)
    }

    pub fn ge<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Ge, value)
    }

    pub fn lt<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Lt, value)
    }

    pub fn le<V: Into<Value>>(field: impl Into<String>, value: Option<V>) -> Self {
        Self::single(field, Op::Le, value)
    }

    /// Inclusive range filter; absent unless both bounds are given.
    pub fn between<V: Into<Value>>(field: impl Into<String>, bounds: Option<(V, V)>) -> Self {
        Self {
            field: field.into(),
            op: Op::Between,
            operand: bounds.map(|(low, high)| Operand::Range(low.into(), high.into())),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: Option<Vec<V>>) -> Self {
        Self {
            field: field.into(),
            op: Op::In,
            operand: values.map(|vs| Operand::List(vs.into_iter().map(Into::into).collect())),
        }
    }

    pub fn like(field: impl Into<String>, pattern: Option<&str>) -> Self {
        Self::single(field, Op::Like, pattern)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: Op::IsNull,
            operand: Some(Operand::None),
        }
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: Op::IsNotNull,
            operand: Some(Operand::None),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn is_absent(&self) -> bool {
        self.operand.is_none()
    }

    /// Converts into a condition, or `None` when the operand is absent.
    pub fn into_condition(self) -> Option<Condition> {
        let operand = self.operand?;
        Some(Condition {
            field: self.field,
            op: self.op,
            operand,
        })
    }
}

/// Typed entry point for building conditions: `field("age").gt(10)`.
pub fn field(name: impl Into<String>) -> FieldRef {
    FieldRef { name: name.into() }
}

/// A named field used to build conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    name: String,
}

macro_rules! comparison {
    ($name:ident, $opt_name:ident, $sub_name:ident, $op:expr) => {
        pub fn $name(&self, value: impl Into<Value>) -> Condition {
            self.single($op, value.into())
        }

        /// Returns `None` when `value` is absent.
        pub fn $opt_name<V: Into<Value>>(&self, value: Option<V>) -> Option<Condition> {
            value.map(|v| self.$name(v))
        }

        /// Compares against an aggregated subquery.
        ///
        /// # Errors
        /// `InvalidArgument` when the subquery has no aggregate.
        pub fn $sub_name(&self, subquery: SubQuery) -> Result<Condition, QueryError> {
            Condition::new(self.name.clone(), $op, Operand::Subquery(subquery))
        }
    };
}

impl FieldRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn single(&self, op: Op, value: Value) -> Condition {
        Condition {
            field: self.name.clone(),
            op,
            operand: Operand::Single(value),
        }
    }

    comparison!(eq, eq_opt, eq_subquery, Op::Eq);
    comparison!(ne, ne_opt, ne_subquery, Op::Ne);
    comparison!(gt, gt_opt, gt_subquery, Op::Gt);
    comparison!(ge, ge_opt, ge_subquery, Op::Ge);
    comparison!(lt, lt_opt, lt_subquery, Op::Lt);
    comparison!(le, le_opt, le_subquery, Op::Le);

    pub fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        Condition {
            field: self.name.clone(),
            op: Op::Between,
            operand: Operand::Range(low.into(), high.into()),
        }
    }

    pub fn is_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Condition {
        Condition {
            field: self.name.clone(),
            op: Op::In,
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
        }
    }

    /// `field IN (SELECT ...)`.
    pub fn in_subquery(&self, subquery: SubQuery) -> Condition {
        Condition {
            field: self.name.clone(),
            op: Op::In,
            operand: Operand::Subquery(subquery),
        }
    }

    pub fn like(&self, pattern: &str) -> Condition {
        self.single(Op::Like, Value::from(pattern))
    }

    /// `LIKE 'prefix%'` with the prefix taken literally.
    pub fn starts_with(&self, prefix: &str) -> Condition {
        self.like(&format!("{}%", escape_like(prefix)))
    }

    pub fn ends_with(&self, suffix: &str) -> Condition {
        self.like(&format!("%{}", escape_like(suffix)))
    }

    pub fn contains(&self, infix: &str) -> Condition {
        self.like(&format!("%{}%", escape_like(infix)))
    }

    pub fn is_null(&self) -> Condition {
        Condition {
            field: self.name.clone(),
            op: Op::IsNull,
            operand: Operand::None,
        }
    }

    pub fn is_not_null(&self) -> Condition {
        Condition {
            field: self.name.clone(),
            op: Op::IsNotNull,
            operand: Operand::None,
        }
    }
}
