//! Sorting, page requests, pages and slices.
//!
//! Pages carry a total count obtained from a separate count query. Slices
//! never count; they fetch one row past the page and report whether it
//! existed.

mod page;
mod request;
mod slice_result;
mod sort;

pub use page::{paginate, PageResult};
pub use request::PageRequest;
pub use slice_result::{slice, SliceResult};
pub use sort::{Direction, NullOrdering, Order, Sort};
