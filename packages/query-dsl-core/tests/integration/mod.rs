//! Integration tests for query-dsl-core.
//!
//! 1. Member repository: paging, slicing, counting, bulk mutations
//! 2. Querying: dynamic predicates, sort, projections, query strings
//! 3. Subqueries and computed columns
//! 4. Properties of predicate composition

pub mod helpers;
pub mod member_repository_tests;
pub mod property_tests;
pub mod querying_tests;
pub mod subquery_tests;
