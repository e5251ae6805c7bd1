use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;
use crate::operator::FilterOperator;
use crate::value::render_value;

/// One `operator value` rule on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFilter {
    pub operator: FilterOperator,
    pub value: Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SimpleFilter {
    pub fn new(operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: value.into(),
            is_active: true,
        }
    }

    pub fn equals(value: impl Into<Value>) -> Self {
        Self::new(FilterOperator::IsEqualTo, value)
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// `column~token~'value'`
    pub fn to_clause(&self, column: &str) -> Result<String, QueryError> {
        let token = self.operator.token()?;
        Ok(format!("{column}~{token}~{}", render_value(&self.value)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn token(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// The set of values picked in a column's distinct-values list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistinctFilter {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub values: Vec<SimpleFilter>,
}

impl DistinctFilter {
    pub fn of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            is_active: true,
            values: values.into_iter().map(SimpleFilter::equals).collect(),
        }
    }
}

/// All filter state attached to one column.
///
/// Up to two field rules, combined by `logical` when both are active, plus
/// an optional distinct-value selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    #[serde(default)]
    pub filter1: Option<SimpleFilter>,
    #[serde(default)]
    pub filter2: Option<SimpleFilter>,
    #[serde(default)]
    pub logical: LogicalOp,
    #[serde(default)]
    pub distinct: DistinctFilter,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            filter1: None,
            filter2: None,
            logical: LogicalOp::And,
            distinct: DistinctFilter::default(),
        }
    }

    pub fn with_filter1(mut self, filter: SimpleFilter) -> Self {
        self.filter1 = Some(filter);
        self
    }

    pub fn with_filter2(mut self, logical: LogicalOp, filter: SimpleFilter) -> Self {
        self.logical = logical;
        self.filter2 = Some(filter);
        self
    }

    pub fn with_distinct(mut self, distinct: DistinctFilter) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn is_active(&self) -> bool {
        active(&self.filter1).is_some()
            || active(&self.filter2).is_some()
            || (self.distinct.is_active && !self.distinct.values.is_empty())
    }

    /// The top-level clauses this column contributes, in order: the field
    /// rule (simple or composite) first, then the distinct-value union.
    pub fn clauses(&self) -> Result<Vec<String>, QueryError> {
        let mut clauses = Vec::with_capacity(2);
        let column = self.column.as_str();

        match (active(&self.filter1), active(&self.filter2)) {
            (Some(f1), Some(f2)) => clauses.push(format!(
                "({}~{}~{})",
                f1.to_clause(column)?,
                self.logical.token(),
                f2.to_clause(column)?
            )),
            (Some(f), None) | (None, Some(f)) => clauses.push(f.to_clause(column)?),
            (None, None) => {}
        }

        if self.distinct.is_active {
            let parts = self
                .distinct
                .values
                .iter()
                .map(|f| f.to_clause(column))
                .collect::<Result<Vec<_>, _>>()?;
            match parts.len() {
                0 => {}
                1 => clauses.extend(parts),
                _ => clauses.push(format!("({})", parts.join("~or~"))),
            }
        }

        Ok(clauses)
    }
}

fn active(filter: &Option<SimpleFilter>) -> Option<&SimpleFilter> {
    filter.as_ref().filter(|f| f.is_active)
}
