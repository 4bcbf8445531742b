//! Storage interface, in-memory store and repository facade.
//!
//! Predicates are plain data; a [`RecordStore`] decides how to evaluate them.
//! [`MemoryStore`] evaluates them directly against a copy-on-write row
//! snapshot. [`Repository`] turns predicates and page requests into pages,
//! slices and projections on top of any store.

mod memory_store;
mod mutation;
mod repository;

pub use memory_store::{MemoryStore, StoreError};
pub use mutation::{Assignment, Mutation, Update};
pub use repository::{Repository, RepositoryError};

use crate::paging::Sort;
use crate::predicate::Predicate;
use crate::record::Record;

/// Query operations a backing store provides.
///
/// Implementations own predicate evaluation. Their errors are passed through
/// the repository unmodified.
pub trait RecordStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All rows matching `predicate`, ordered by `sort`.
    fn fetch(&self, predicate: &Predicate, sort: &Sort) -> Result<Vec<Record>, Self::Error>;

    /// Number of rows matching `predicate`.
    fn count(&self, predicate: &Predicate) -> Result<usize, Self::Error>;

    /// At most `limit` matching rows after skipping `row_offset`, ordered by `sort`.
    fn fetch_page(
        &self,
        predicate: &Predicate,
        row_offset: usize,
        limit: usize,
        sort: &Sort,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Applies a bulk update or delete and returns the number of affected rows.
    fn execute(&self, mutation: &Mutation) -> Result<usize, Self::Error>;
}
