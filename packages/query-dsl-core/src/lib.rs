//! Composable query predicates, paging and projections.
//!
//! Provides dynamic predicate construction with absent-filter skipping,
//! page and slice computation, record projections, and a storage
//! interface with an in-memory reference store.

pub mod config;
pub mod error;
pub mod paging;
pub mod params;
pub mod predicate;
pub mod projection;
pub mod record;
pub mod store;
pub mod value;

pub use config::QueryConfig;
pub use error::QueryError;
pub use paging::{
    paginate, slice, Direction, NullOrdering, Order, PageRequest, PageResult, SliceResult, Sort,
};
pub use params::QueryParams;
pub use predicate::{
    build_predicate, field, Aggregate, CombinedPredicate, Condition, Example, ExampleMatcher,
    Filter, Op, Operand, Predicate, PredicateBuilder, StringMatcher, SubQuery,
};
pub use projection::{Case, Expr, FromRecord, Projection};
pub use record::{FieldSource, Record};
pub use store::{MemoryStore, Mutation, RecordStore, Repository, RepositoryError, Update};
pub use value::Value;
