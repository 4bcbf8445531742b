//! Bulk updates and deletes.

use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::record::Record;
use crate::value::Value;

/// New value for one field of every matched row.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// Overwrite with a constant
    Set(Value),
    /// Add to a numeric field; null stays null
    Add(i64),
}

impl Assignment {
    /// Applies the assignment to `field` of `record`.
    ///
    /// # Returns
    /// `Err(QueryError::TypeMismatch)` when adding to a non-numeric field,
    /// `Err(QueryError::InvalidArgument)` when an integer addition overflows.
    pub fn apply(&self, field: &str, record: &mut Record) -> Result<(), QueryError> {
        match self {
            Assignment::Set(value) => {
                record.set(field, value.clone());
            }
            Assignment::Add(delta) => match record.get_mut(field) {
                None | Some(Value::Null) => {}
                Some(Value::Int(current)) => {
                    *current = current.checked_add(*delta).ok_or_else(|| {
                        QueryError::invalid(format!(
                            "adding {} to field '{}' overflows",
                            delta, field
                        ))
                    })?;
                }
                Some(Value::Float(current)) => *current += *delta as f64,
                Some(other) => {
                    return Err(QueryError::TypeMismatch {
                        field: field.to_string(),
                        expected: "number",
                        got: other.kind(),
                    })
                }
            },
        }
        Ok(())
    }
}

/// Bulk update of every row matching a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    predicate: Predicate,
    assignments: Vec<(String, Assignment)>,
}

impl Update {
    pub fn new(predicate: impl Into<Predicate>) -> Self {
        Self {
            predicate: predicate.into(),
            assignments: Vec::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push((field.into(), Assignment::Set(value.into())));
        self
    }

    pub fn add(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.assignments.push((field.into(), Assignment::Add(delta)));
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn assignments(&self) -> &[(String, Assignment)] {
        &self.assignments
    }

    /// Applies every assignment in order.
    pub fn apply(&self, record: &mut Record) -> Result<(), QueryError> {
        for (field, assignment) in &self.assignments {
            assignment.apply(field, record)?;
        }
        Ok(())
    }
}

/// A write executed against a store, returning the affected row count.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Update(Update),
    Delete { predicate: Predicate },
}

impl Mutation {
    pub fn delete(predicate: impl Into<Predicate>) -> Self {
        Mutation::Delete {
            predicate: predicate.into(),
        }
    }

    /// Rows this mutation applies to.
    pub fn predicate(&self) -> &Predicate {
        match self {
            Mutation::Update(update) => update.predicate(),
            Mutation::Delete { predicate } => predicate,
        }
    }

    /// Same writes, applied to the rows of `predicate` instead.
    pub fn with_predicate(&self, predicate: Predicate) -> Mutation {
        match self {
            Mutation::Update(update) => Mutation::Update(Update {
                predicate,
                assignments: update.assignments.clone(),
            }),
            Mutation::Delete { .. } => Mutation::Delete { predicate },
        }
    }
}

impl From<Update> for Mutation {
    fn from(update: Update) -> Self {
        Mutation::Update(update)
    }
}
