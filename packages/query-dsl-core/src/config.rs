//! Query configuration.

use crate::paging::NullOrdering;

/// Query configuration.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Page size used when a request does not name one
    pub default_page_size: usize,
    /// Upper bound applied to requested page sizes
    pub max_page_size: usize,
    /// Null placement for sort keys that do not specify one
    pub default_null_ordering: NullOrdering,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 2000,
            default_null_ordering: NullOrdering::NullsLast,
        }
    }
}
