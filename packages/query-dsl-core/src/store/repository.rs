//! Repository facade over a record store.

use thiserror::Error;

use crate::error::QueryError;
use crate::paging::{paginate, slice, PageRequest, PageResult, SliceResult, Sort};
use crate::predicate::{Example, Predicate, SubQuery};
use crate::projection::{FromRecord, Projection};
use crate::record::Record;
use crate::value::Value;

use super::mutation::Mutation;
use super::RecordStore;

/// Repository errors: either a query problem or the store's own error.
#[derive(Error, Debug)]
pub enum RepositoryError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Store failure, passed through unmodified
    #[error("Store error: {0}")]
    Store(#[source] E),
}

/// Query entry point combining predicates, paging and projections.
///
/// Pages always issue a count query next to the page fetch; slices never
/// count and probe one extra row instead. Subqueries in predicates and
/// projections run against the same store before the outer query.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S: RecordStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Replaces subqueries with the values they select.
    fn resolve(&self, predicate: Predicate) -> Result<Predicate, RepositoryError<S::Error>> {
        if !predicate.has_subqueries() {
            return Ok(predicate);
        }
        let resolved = predicate.resolve(&mut |p: &Predicate| self.fetch_unsorted(p))?;
        tracing::debug!("Resolved subqueries: [{}] -> [{}]", predicate, resolved);
        Ok(resolved)
    }

    fn fetch_unsorted(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, RepositoryError<S::Error>> {
        self.store
            .fetch(predicate, &Sort::unsorted())
            .map_err(RepositoryError::Store)
    }

    pub fn find_all(
        &self,
        predicate: impl Into<Predicate>,
        sort: &Sort,
    ) -> Result<Vec<Record>, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        self.store
            .fetch(&predicate, sort)
            .map_err(RepositoryError::Store)
    }

    /// Returns the single matching row, if any.
    ///
    /// # Returns
    /// `Err(RepositoryError::Query(QueryError::NonUniqueResult))` when more
    /// than one row matches.
    pub fn find_one(
        &self,
        predicate: impl Into<Predicate>,
    ) -> Result<Option<Record>, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        let mut rows = self
            .store
            .fetch_page(&predicate, 0, 2, &Sort::unsorted())
            .map_err(RepositoryError::Store)?;
        if rows.len() > 1 {
            let count = self
                .store
                .count(&predicate)
                .map_err(RepositoryError::Store)?;
            return Err(QueryError::NonUniqueResult { count }.into());
        }
        Ok(rows.pop())
    }

    /// First matching row under `sort`.
    pub fn find_first(
        &self,
        predicate: impl Into<Predicate>,
        sort: &Sort,
    ) -> Result<Option<Record>, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        let mut rows = self
            .store
            .fetch_page(&predicate, 0, 1, sort)
            .map_err(RepositoryError::Store)?;
        Ok(rows.pop())
    }

    pub fn count(
        &self,
        predicate: impl Into<Predicate>,
    ) -> Result<usize, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        self.store
            .count(&predicate)
            .map_err(RepositoryError::Store)
    }

    /// Runs an aggregated subquery on its own, e.g. `SubQuery::avg("age")`.
    ///
    /// # Returns
    /// `Err(RepositoryError::Query(QueryError::InvalidArgument))` when the
    /// subquery has no aggregate.
    pub fn aggregate(&self, subquery: &SubQuery) -> Result<Value, RepositoryError<S::Error>> {
        subquery.scalar(&mut |p: &Predicate| self.fetch_unsorted(p))
    }

    /// Fetches one page together with the total number of matches.
    ///
    /// # Arguments
    /// * `predicate` - Row filter
    /// * `request` - Page index, page size and sort
    ///
    /// # Returns
    /// `PageResult` whose metadata comes from a separate count query,
    /// reconciled against the rows actually returned.
    pub fn find_page(
        &self,
        predicate: impl Into<Predicate>,
        request: &PageRequest,
    ) -> Result<PageResult<Record>, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        let row_offset = request.row_offset()?;

        let total = self
            .store
            .count(&predicate)
            .map_err(RepositoryError::Store)?;
        let items = self
            .store
            .fetch_page(&predicate, row_offset, request.limit(), request.sort())
            .map_err(RepositoryError::Store)?;

        tracing::debug!(
            "find_page [{}] page {} size {}: {} of {} rows",
            predicate,
            request.offset(),
            request.limit(),
            items.len(),
            total
        );
        Ok(paginate(items, total, request)?)
    }

    /// Fetches one slice without counting.
    ///
    /// # Notes
    /// - Requests `limit + 1` rows; the extra row only decides `has_next`.
    pub fn find_slice(
        &self,
        predicate: impl Into<Predicate>,
        request: &PageRequest,
    ) -> Result<SliceResult<Record>, RepositoryError<S::Error>> {
        let predicate = self.resolve(predicate.into())?;
        let row_offset = request.row_offset()?;
        let items = self
            .store
            .fetch_page(&predicate, row_offset, request.probe_limit(), request.sort())
            .map_err(RepositoryError::Store)?;
        Ok(slice(items, request)?)
    }

    /// Rows equal to the non-null, non-ignored fields of the probe.
    pub fn find_by_example(
        &self,
        example: &Example,
        sort: &Sort,
    ) -> Result<Vec<Record>, RepositoryError<S::Error>> {
        self.find_all(example.to_predicate(), sort)
    }

    /// Fetches a page and maps each row through `projection` into `T`.
    pub fn find_projected<T: FromRecord>(
        &self,
        predicate: impl Into<Predicate>,
        projection: &Projection,
        request: &PageRequest,
    ) -> Result<PageResult<T>, RepositoryError<S::Error>> {
        let projection = if projection.has_subqueries() {
            projection.resolve(&mut |p: &Predicate| self.fetch_unsorted(p))?
        } else {
            projection.clone()
        };
        let page = self.find_page(predicate, request)?;
        Ok(page.try_map(|row| T::from_record(&projection.apply(&row)))?)
    }

    /// Executes a bulk update or delete.
    ///
    /// Subqueries in the mutation's predicate are evaluated before any row
    /// is written.
    pub fn execute(&self, mutation: &Mutation) -> Result<usize, RepositoryError<S::Error>> {
        if mutation.predicate().has_subqueries() {
            let predicate = self.resolve(mutation.predicate().clone())?;
            return self
                .store
                .execute(&mutation.with_predicate(predicate))
                .map_err(RepositoryError::Store);
        }
        self.store.execute(mutation).map_err(RepositoryError::Store)
    }
}
