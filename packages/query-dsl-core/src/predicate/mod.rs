//! Dynamic predicate construction and evaluation.
//!
//! Callers describe candidate filters whose values may be absent. Absent
//! filters are dropped, never compared against null, and the rest are
//! combined into a predicate the storage layer evaluates per record.

mod builder;
mod condition;
mod example;
mod expr;
mod subquery;

pub use builder::{build_predicate, CombinedPredicate, PredicateBuilder};
pub use condition::{escape_like, field, Condition, FieldRef, Filter, Op, Operand};
pub use example::{Example, ExampleMatcher, StringMatcher};
pub use expr::{IntoPredicate, Predicate};
pub use subquery::{Aggregate, SubQuery};
