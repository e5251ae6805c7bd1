use std::fmt;

use crate::operator::FilterOperator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The operator has no token in the query protocol.
    UnsupportedOperator(FilterOperator),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnsupportedOperator(op) => {
                write!(f, "unsupported filter operator: {op:?}")
            }
        }
    }
}

impl std::error::Error for QueryError {}
