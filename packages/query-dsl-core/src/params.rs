//! URL-style query string parsing.
//!
//! Turns `username=member1&age.gt=10&page=1&size=3&sort=age,desc,nullslast`
//! into a list of filters and a page request.

use percent_encoding::percent_decode_str;

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::paging::{Direction, NullOrdering, Order, PageRequest, Sort};
use crate::predicate::{build_predicate, CombinedPredicate, Filter, Op, Operand};
use crate::value::Value;

/// Filters and paging parsed from a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub filters: Vec<Filter>,
    pub page: PageRequest,
}

impl QueryParams {
    /// Parses a query string.
    ///
    /// # Arguments
    /// * `query_str` - Raw query string without the leading `?`, if any
    /// * `config` - Supplies the default page size, the page size cap and the
    ///   null ordering for sort keys that omit one
    ///
    /// # Returns
    /// `Err(QueryError::InvalidArgument)` for unknown operators, malformed
    /// `page`/`size`/`sort` values or operands that do not fit their operator.
    ///
    /// # Notes
    /// - An empty value (`username=`) yields an absent filter.
    /// - `isnull`/`isnotnull` ignore their value and may omit the `=`.
    pub fn parse(query_str: Option<&str>, config: &QueryConfig) -> Result<Self, QueryError> {
        let mut page = None;
        let mut size = None;
        let mut orders = Vec::new();
        let mut filters = Vec::new();

        if let Some(query_str) = query_str {
            for pair in query_str.split('&').filter(|p| !p.is_empty()) {
                let (key, encoded_value) = pair.split_once('=').unwrap_or((pair, ""));
                let key = percent_decode_str(key).decode_utf8_lossy();
                let decoded_value = percent_decode_str(encoded_value).decode_utf8_lossy();

                match key.as_ref() {
                    "page" => page = Some(parse_number("page", &decoded_value)?),
                    "size" => size = Some(parse_number("size", &decoded_value)?),
                    "sort" => orders.push(parse_order(&decoded_value, config)?),
                    _ => filters.push(parse_filter(&key, &decoded_value)?),
                }
            }
        }

        let max = i64::try_from(config.max_page_size).unwrap_or(i64::MAX);
        let default_size = i64::try_from(config.default_page_size).unwrap_or(max);
        let size = size.unwrap_or(default_size).min(max);

        let page = PageRequest::of(page.unwrap_or(0), size)?
            .with_sort(orders.into_iter().collect::<Sort>());

        tracing::debug!(
            "Parsed query params: {} filters, page {} size {}",
            filters.len(),
            page.offset(),
            page.limit()
        );

        Ok(Self { filters, page })
    }

    /// Conjunction of the present filters.
    pub fn predicate(&self) -> CombinedPredicate {
        build_predicate(self.filters.iter().cloned())
    }
}

fn parse_number(name: &str, raw: &str) -> Result<i64, QueryError> {
    raw.trim().parse().map_err(|e| {
        QueryError::invalid(format!("Invalid {} value '{}': {}", name, raw, e))
    })
}

fn parse_order(raw: &str, config: &QueryConfig) -> Result<Order, QueryError> {
    let mut parts = raw.split(',').map(str::trim);
    let field = match parts.next() {
        Some(field) if !field.is_empty() => field,
        _ => return Err(QueryError::invalid("sort requires a field name")),
    };

    let mut direction = Direction::Asc;
    let mut nulls = config.default_null_ordering;
    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "asc" => direction = Direction::Asc,
            "desc" => direction = Direction::Desc,
            "nullsfirst" => nulls = NullOrdering::NullsFirst,
            "nullslast" => nulls = NullOrdering::NullsLast,
            other => {
                return Err(QueryError::invalid(format!(
                    "Invalid sort option '{}' for field '{}'",
                    other, field
                )))
            }
        }
    }
    Ok(Order::new(field, direction, nulls))
}

/// Splits `field.op` keys. A suffix that is not an operator name belongs to
/// the field path, so `team.name=teamA` filters on `team.name`.
fn parse_filter(key: &str, raw: &str) -> Result<Filter, QueryError> {
    let (field, op) = key
        .rsplit_once('.')
        .and_then(|(field, op_name)| Op::parse(op_name).map(|op| (field, op)))
        .unwrap_or((key, Op::Eq));
    if field.is_empty() {
        return Err(QueryError::invalid(format!("Missing field name in '{}'", key)));
    }

    if op.is_unary() {
        return Filter::new(field, op, None);
    }
    if raw.is_empty() {
        return Filter::new(field, op, None);
    }

    let operand = match op {
        Op::Like => Operand::Single(Value::Text(raw.to_string())),
        Op::In => Operand::List(raw.split(',').map(parse_value).collect()),
        Op::Between => match raw.split_once(',') {
            Some((low, high)) => Operand::Range(parse_value(low), parse_value(high)),
            None => {
                return Err(QueryError::invalid(format!(
                    "between on field '{}' needs two comma separated bounds, got '{}'",
                    field, raw
                )))
            }
        },
        _ => Operand::Single(parse_value(raw)),
    };
    Filter::new(field, op, Some(operand))
}

/// Parses a scalar as JSON, falling back to text.
fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::Text(raw.to_string()))
}
