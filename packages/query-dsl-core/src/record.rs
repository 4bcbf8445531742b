//! Records and field access.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::value::Value;

/// Read access to named fields.
///
/// Predicates, sort keys and projections only see rows through this trait,
/// so application structs can be queried without converting to `Record`.
/// A missing field is treated the same as a null one.
pub trait FieldSource {
    /// Returns the value of `name`, or `None` if the row has no such field.
    fn field(&self, name: &str) -> Option<Cow<'_, Value>>;
}

/// A row as a map of field names to values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a text field, failing if it is missing, null or not text.
    pub fn require_text(&self, name: &str) -> Result<&str, QueryError> {
        match self.non_null(name)? {
            Value::Text(s) => Ok(s),
            other => Err(QueryError::TypeMismatch {
                field: name.to_string(),
                expected: "text",
                got: other.kind(),
            }),
        }
    }

    /// Returns an integer field, failing if it is missing, null or not an int.
    pub fn require_int(&self, name: &str) -> Result<i64, QueryError> {
        match self.non_null(name)? {
            Value::Int(v) => Ok(*v),
            other => Err(QueryError::TypeMismatch {
                field: name.to_string(),
                expected: "int",
                got: other.kind(),
            }),
        }
    }

    /// Returns a text field that may be null or missing.
    pub fn optional_text(&self, name: &str) -> Result<Option<&str>, QueryError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s)),
            Some(other) => Err(QueryError::TypeMismatch {
                field: name.to_string(),
                expected: "text",
                got: other.kind(),
            }),
        }
    }

    fn non_null(&self, name: &str) -> Result<&Value, QueryError> {
        match self.get(name) {
            None | Some(Value::Null) => Err(QueryError::MissingField {
                field: name.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }
}

impl FieldSource for Record {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.fields.get(name).map(Cow::Borrowed)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).field(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
