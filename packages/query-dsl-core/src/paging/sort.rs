//! Sort keys with explicit null placement.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::FieldSource;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Where null (or missing) sort keys go, independent of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullOrdering {
    NullsFirst,
    #[default]
    NullsLast,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    field: String,
    direction: Direction,
    nulls: NullOrdering,
}

impl Order {
    pub fn new(field: impl Into<String>, direction: Direction, nulls: NullOrdering) -> Self {
        Self {
            field: field.into(),
            direction,
            nulls,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Asc, NullOrdering::default())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Desc, NullOrdering::default())
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::NullsFirst;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::NullsLast;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn null_ordering(&self) -> NullOrdering {
        self.nulls
    }

    /// Compares two rows on this key.
    ///
    /// Null placement is applied before the direction, so `NullsLast` keeps
    /// nulls at the end of a descending sort as well.
    pub fn compare<R: FieldSource + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        let a = a.field(&self.field);
        let b = b.field(&self.field);
        let a = a.as_deref().filter(|v| !v.is_null());
        let b = b.as_deref().filter(|v| !v.is_null());

        let null_first = match self.nulls {
            NullOrdering::NullsFirst => Ordering::Less,
            NullOrdering::NullsLast => Ordering::Greater,
        };

        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => null_first,
            (Some(_), None) => null_first.reverse(),
            (Some(x), Some(y)) => {
                let ord = sort_cmp(x, y);
                match self.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            }
        }
    }
}

/// Total order over non-null values.
///
/// Numbers order by their `f64` key under `total_cmp` (so `-0.0 < 0.0` and
/// NaN sorts at the ends), then by kind, then exactly for two ints whose
/// keys collide above 2^53. Other kinds order naturally within themselves
/// and by kind rank across each other.
fn sort_cmp(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a
                .total_cmp(&b)
                .then_with(|| kind_rank(x).cmp(&kind_rank(y))),
            _ => kind_rank(x).cmp(&kind_rank(y)),
        },
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::Float(_) => 3,
        Value::Text(_) => 4,
    }
}

/// Ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(order: Order) -> Self {
        Self {
            orders: vec![order],
        }
    }

    /// Adds a tie-breaking key.
    pub fn then(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn compare<R: FieldSource + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        self.orders
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Sorts rows in place. Stable: rows equal on every key keep their order.
    pub fn sort_rows<R: FieldSource>(&self, rows: &mut [R]) {
        if self.is_unsorted() {
            return;
        }
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

impl FromIterator<Order> for Sort {
    fn from_iter<I: IntoIterator<Item = Order>>(iter: I) -> Self {
        Self {
            orders: iter.into_iter().collect(),
        }
    }
}
