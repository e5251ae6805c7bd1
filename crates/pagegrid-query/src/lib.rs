//! Grid query descriptors and the textual query grammar they serialize to.

mod error;
mod filter;
mod group;
mod operator;
mod parse_filter;
mod query;
mod serialize;
mod sort;
mod value;

pub use error::QueryError;
pub use filter::{ColumnFilter, DistinctFilter, LogicalOp, SimpleFilter};
pub use group::{GroupDescriptor, GroupState};
pub use operator::FilterOperator;
pub use parse_filter::{Clause, ClauseValue, Condition, FilterParseError, parse_filter};
pub use query::QueryState;
pub use serialize::{serialize_filter, serialize_group, serialize_sort};
pub use sort::{SortDescriptor, SortDirection, SortState};
pub use value::render_value;
