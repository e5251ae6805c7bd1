use std::sync::Arc;

use pagegrid_query::{ColumnFilter, serialize_filter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::SourceError;
use crate::transport::Transport;

const DISTINCT_SEGMENT: &str = "GetDistinctValues";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// An enumeration; the members are the distinct values.
    Enum(Vec<Value>),
    Boolean,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub value_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, value_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            value_type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Values computable without a request: enum members and booleans, with
/// `null` first for nullable columns. `None` means ask the server.
pub fn static_values(column: &ColumnMeta) -> Option<Vec<Value>> {
    let values = match &column.value_type {
        ColumnType::Enum(members) => members.clone(),
        ColumnType::Boolean => vec![Value::Bool(true), Value::Bool(false)],
        ColumnType::Other => return None,
    };
    Some(with_null(column, values))
}

fn with_null(column: &ColumnMeta, mut values: Vec<Value>) -> Vec<Value> {
    if column.nullable && !values.contains(&Value::Null) {
        values.insert(0, Value::Null);
    }
    values
}

/// Decides where a column's distinct-value list comes from.
pub struct DistinctValuesResolver<X> {
    transport: Arc<X>,
}

impl<X> Clone for DistinctValuesResolver<X> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<X: Transport> DistinctValuesResolver<X> {
    pub fn new(transport: Arc<X>) -> Self {
        Self { transport }
    }

    /// Resolve the list for `column`.
    ///
    /// The remote request carries the full current filter, including any
    /// filter on `column` itself, so the list reflects the column's own
    /// constraint.
    pub async fn resolve(
        &self,
        column: &ColumnMeta,
        filters: &[ColumnFilter],
    ) -> Result<Vec<Value>, SourceError> {
        if let Some(values) = static_values(column) {
            return Ok(values);
        }

        let query = vec![
            ("columnName".to_string(), column.name.clone()),
            ("filter".to_string(), serialize_filter(filters)?),
        ];
        debug!(column = %column.name, "fetching distinct values");
        let body = self.transport.get_json(&[DISTINCT_SEGMENT], query).await?;
        let values: Vec<Value> = serde_json::from_value(body)?;
        Ok(with_null(column, values))
    }
}
