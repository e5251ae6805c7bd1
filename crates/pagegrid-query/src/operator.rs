use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Filter operators as a grid's filtering UI exposes them.
///
/// Only a subset has a token in the query protocol; see [`FilterOperator::token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    IsLessThan,
    IsLessThanOrEqualTo,
    IsEqualTo,
    IsNotEqualTo,
    IsGreaterThanOrEqualTo,
    IsGreaterThan,
    StartsWith,
    EndsWith,
    Contains,
    IsContainedIn,
    DoesNotContain,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    /// The protocol token for this operator.
    ///
    /// The comparison and string operators map one to one. `DoesNotContain`
    /// sits outside that contiguous range upstream and is mapped explicitly.
    /// The null/empty checks have no token and are rejected instead of being
    /// dropped from the filter.
    pub fn token(self) -> Result<&'static str, QueryError> {
        let token = match self {
            FilterOperator::IsLessThan => "lt",
            FilterOperator::IsLessThanOrEqualTo => "lte",
            FilterOperator::IsEqualTo => "eq",
            FilterOperator::IsNotEqualTo => "neq",
            FilterOperator::IsGreaterThanOrEqualTo => "gte",
            FilterOperator::IsGreaterThan => "gt",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::EndsWith => "endswith",
            FilterOperator::Contains => "contains",
            FilterOperator::IsContainedIn => "in",
            FilterOperator::DoesNotContain => "doesnotcontain",
            FilterOperator::IsNull
            | FilterOperator::IsNotNull
            | FilterOperator::IsEmpty
            | FilterOperator::IsNotEmpty => return Err(QueryError::UnsupportedOperator(self)),
        };
        Ok(token)
    }

    /// Reverse lookup used by the filter parser.
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "lt" => FilterOperator::IsLessThan,
            "lte" => FilterOperator::IsLessThanOrEqualTo,
            "eq" => FilterOperator::IsEqualTo,
            "neq" => FilterOperator::IsNotEqualTo,
            "gte" => FilterOperator::IsGreaterThanOrEqualTo,
            "gt" => FilterOperator::IsGreaterThan,
            "startswith" => FilterOperator::StartsWith,
            "endswith" => FilterOperator::EndsWith,
            "contains" => FilterOperator::Contains,
            "in" => FilterOperator::IsContainedIn,
            "doesnotcontain" => FilterOperator::DoesNotContain,
            _ => return None,
        };
        Some(op)
    }
}
