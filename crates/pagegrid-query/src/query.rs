use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::filter::ColumnFilter;
use crate::group::GroupState;
use crate::serialize::{serialize_filter, serialize_group, serialize_sort};
use crate::sort::SortState;

/// Everything a fetch needs, captured when the fetch is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    #[serde(default)]
    pub filters: Vec<ColumnFilter>,
    #[serde(default)]
    pub sort: SortState,
    #[serde(default)]
    pub group: GroupState,
    #[serde(default)]
    pub page_index: usize,
    pub page_size: usize,
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: Vec::new(),
            sort: SortState::default(),
            group: GroupState::default(),
            page_index: 0,
            page_size,
        }
    }

    /// The protocol's page numbers start at 1.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Absolute index of the first row of the current page.
    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }

    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty()
    }

    /// Query parameters in protocol order: `sort`, `page`, `pageSize`,
    /// `filter`, `group`. Empty sort, filter and group values are omitted.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>, QueryError> {
        let mut pairs = Vec::with_capacity(5);

        let sort = serialize_sort(&self.sort);
        if !sort.is_empty() {
            pairs.push(("sort".to_string(), sort));
        }
        pairs.push(("page".to_string(), self.page_number().to_string()));
        pairs.push(("pageSize".to_string(), self.page_size.to_string()));

        let filter = serialize_filter(&self.filters)?;
        if !filter.is_empty() {
            pairs.push(("filter".to_string(), filter));
        }

        let group = serialize_group(&self.group);
        if !group.is_empty() {
            pairs.push(("group".to_string(), group));
        }

        Ok(pairs)
    }

    /// The unencoded query string, e.g. for logging.
    pub fn to_query_string(&self) -> Result<String, QueryError> {
        Ok(self
            .query_pairs()?
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SimpleFilter;
    use crate::group::GroupDescriptor;
    use crate::sort::SortDirection;

    #[test]
    fn first_page_is_page_one() {
        let state = QueryState::new(25);
        assert_eq!(state.page_number(), 1);
        assert_eq!(state.to_query_string().unwrap(), "page=1&pageSize=25");
    }

    #[test]
    fn offset_follows_page_index() {
        let mut state = QueryState::new(10);
        state.page_index = 3;
        assert_eq!(state.offset(), 30);
        assert_eq!(state.page_number(), 4);
    }

    #[test]
    fn grouped_state_carries_group_param() {
        let mut state = QueryState::new(10);
        state.filters = vec![ColumnFilter::new("Dept").with_filter1(SimpleFilter::equals("R&D"))];
        state.group = GroupState(vec![GroupDescriptor::new(
            "Dept",
            Some(SortDirection::Ascending),
        )]);
        assert!(state.is_grouped());
        assert_eq!(
            state.to_query_string().unwrap(),
            "page=1&pageSize=10&filter=Dept~eq~'R&D'&group=Dept-asc"
        );
    }
}
