use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn token(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub column: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// The sort the protocol can carry: a single column, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState(pub Option<SortDescriptor>);

impl SortState {
    pub fn unsorted() -> Self {
        Self(None)
    }

    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self(Some(SortDescriptor::new(column, direction)))
    }

    /// Collapse a stacked sort to its primary column.
    pub fn from_descriptors(descriptors: &[SortDescriptor]) -> Self {
        Self(descriptors.first().cloned())
    }

    pub fn is_sorted(&self) -> bool {
        self.0.is_some()
    }
}
