use serde::{Deserialize, Serialize};

use crate::sort::SortDirection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub column: String,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl GroupDescriptor {
    pub fn new(column: impl Into<String>, direction: Option<SortDirection>) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Ordered grouping levels. Empty means the view is not grouped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState(pub Vec<GroupDescriptor>);

impl GroupState {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn levels(&self) -> &[GroupDescriptor] {
        &self.0
    }
}
