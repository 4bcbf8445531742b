//! In-memory record store.
//!
//! Rows live in an `ArcSwap<Vec<Record>>`. Reads load the current snapshot
//! and never block; writes clone the snapshot, modify the clone and swap it
//! in. A mutex serializes writers so concurrent mutations do not lose each
//! other's changes.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::error::QueryError;
use crate::paging::Sort;
use crate::predicate::Predicate;
use crate::record::Record;

use super::mutation::Mutation;
use super::RecordStore;

/// Memory store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A mutation could not be applied to a row
    #[error("Mutation failed: {0}")]
    Mutation(#[from] QueryError),

    /// Writer lock poisoned by a panicking writer
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Vector-backed store with copy-on-write snapshots.
#[derive(Debug)]
pub struct MemoryStore {
    rows: ArcSwap<Vec<Record>>,
    write_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            rows: ArcSwap::new(Arc::new(records)),
            write_lock: Mutex::new(()),
        }
    }

    /// Current rows. The snapshot is unaffected by later writes.
    ///
    /// # Performance
    /// - O(1), no copy
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        self.rows.load_full()
    }

    pub fn len(&self) -> usize {
        self.rows.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.load().is_empty()
    }

    pub fn insert(&self, record: Record) -> Result<(), StoreError> {
        self.insert_all(std::iter::once(record))
    }

    /// Appends rows in a single swap.
    ///
    /// # Performance
    /// - O(n) clone of the current rows
    pub fn insert_all<I: IntoIterator<Item = Record>>(&self, records: I) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut rows = self.rows.load_full().as_ref().clone();
        let before = rows.len();
        rows.extend(records);
        tracing::debug!("Inserted {} records", rows.len() - before);
        self.rows.store(Arc::new(rows));
        Ok(())
    }

    /// Matching rows in storage order.
    fn select(rows: &[Record], predicate: &Predicate) -> Vec<Record> {
        if predicate.is_match_all() {
            return rows.to_vec();
        }
        #[cfg(feature = "parallel")]
        let matched = {
            use rayon::prelude::*;
            rows.par_iter()
                .filter(|row| predicate.matches(*row))
                .cloned()
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let matched = rows
            .iter()
            .filter(|row| predicate.matches(*row))
            .cloned()
            .collect();
        matched
    }

    fn sorted(rows: &[Record], predicate: &Predicate, sort: &Sort) -> Vec<Record> {
        let mut matched = Self::select(rows, predicate);
        sort.sort_rows(&mut matched);
        matched
    }
}

impl RecordStore for MemoryStore {
    type Error = StoreError;

    fn fetch(&self, predicate: &Predicate, sort: &Sort) -> Result<Vec<Record>, StoreError> {
        let rows = self.rows.load();
        let result = Self::sorted(&rows, predicate, sort);
        tracing::debug!("fetch [{}] returned {} rows", predicate, result.len());
        Ok(result)
    }

    fn count(&self, predicate: &Predicate) -> Result<usize, StoreError> {
        let rows = self.rows.load();
        if predicate.is_match_all() {
            return Ok(rows.len());
        }
        #[cfg(feature = "parallel")]
        let count = {
            use rayon::prelude::*;
            rows.par_iter().filter(|row| predicate.matches(*row)).count()
        };
        #[cfg(not(feature = "parallel"))]
        let count = rows.iter().filter(|row| predicate.matches(*row)).count();
        Ok(count)
    }

    fn fetch_page(
        &self,
        predicate: &Predicate,
        row_offset: usize,
        limit: usize,
        sort: &Sort,
    ) -> Result<Vec<Record>, StoreError> {
        let rows = self.rows.load();
        let page: Vec<Record> = Self::sorted(&rows, predicate, sort)
            .into_iter()
            .skip(row_offset)
            .take(limit)
            .collect();
        tracing::debug!(
            "fetch_page [{}] offset {} limit {} returned {} rows",
            predicate,
            row_offset,
            limit,
            page.len()
        );
        Ok(page)
    }

    /// Applies the mutation to a copy of the rows and publishes it only if
    /// every affected row was updated successfully.
    fn execute(&self, mutation: &Mutation) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let current = self.rows.load_full();

        let (rows, affected) = match mutation {
            Mutation::Update(update) => {
                let mut rows = current.as_ref().clone();
                let mut affected = 0;
                for row in rows.iter_mut() {
                    if update.predicate().matches(&*row) {
                        update.apply(row)?;
                        affected += 1;
                    }
                }
                (rows, affected)
            }
            Mutation::Delete { predicate } => {
                let rows: Vec<Record> = current
                    .iter()
                    .filter(|row| !predicate.matches(*row))
                    .cloned()
                    .collect();
                let affected = current.len() - rows.len();
                (rows, affected)
            }
        };

        tracing::debug!(
            "execute [{}] affected {} rows",
            mutation.predicate(),
            affected
        );
        self.rows.store(Arc::new(rows));
        Ok(affected)
    }
}
