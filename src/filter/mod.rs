//! Structured predicate builder for list and report queries.

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::{Filter, Page};
pub use filter_order::FilterOrder;
pub use filter_where::FilterWhere;
pub use types::*;
