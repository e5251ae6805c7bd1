use pagegrid_query::{ColumnFilter, GroupState, QueryState, SortDescriptor, SortState};
use serde::{Deserialize, Serialize};

/// Which part of the grid's state a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Filter,
    Sort,
    Group,
    Page,
}

impl ViewChange {
    /// Filter, sort and group changes alter which rows exist and in what
    /// order; paging only moves over the same rows.
    pub fn changes_query_shape(self) -> bool {
        !matches!(self, ViewChange::Page)
    }
}

/// The grid's mutable query state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    filters: Vec<ColumnFilter>,
    sort: Vec<SortDescriptor>,
    group: GroupState,
    page_index: usize,
    page_size: usize,
}

impl GridView {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: Vec::new(),
            sort: Vec::new(),
            group: GroupState::default(),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn filters(&self) -> &[ColumnFilter] {
        &self.filters
    }

    pub fn sort(&self) -> &[SortDescriptor] {
        &self.sort
    }

    pub fn group(&self) -> &GroupState {
        &self.group
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace every column filter. Always returns to the first page: the
    /// new result set may be shorter than the page being viewed.
    pub fn set_filters(&mut self, filters: Vec<ColumnFilter>) -> ViewChange {
        self.filters = filters;
        self.page_index = 0;
        ViewChange::Filter
    }

    /// Replace the filter of one column, keeping the other columns' order.
    pub fn set_column_filter(&mut self, filter: ColumnFilter) -> ViewChange {
        match self.filters.iter_mut().find(|f| f.column == filter.column) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
        self.page_index = 0;
        ViewChange::Filter
    }

    pub fn clear_column_filter(&mut self, column: &str) -> ViewChange {
        self.filters.retain(|f| f.column != column);
        self.page_index = 0;
        ViewChange::Filter
    }

    pub fn set_sort(&mut self, sort: Vec<SortDescriptor>) -> ViewChange {
        self.sort = sort;
        ViewChange::Sort
    }

    pub fn set_group(&mut self, group: GroupState) -> ViewChange {
        self.group = group;
        ViewChange::Group
    }

    pub fn move_to_page(&mut self, page_index: usize) -> ViewChange {
        self.page_index = page_index;
        ViewChange::Page
    }

    pub fn set_page_size(&mut self, page_size: usize) -> ViewChange {
        self.page_size = page_size.max(1);
        self.page_index = 0;
        ViewChange::Page
    }

    /// Freeze the current state for one fetch. Only the primary sort column
    /// is carried.
    pub fn snapshot(&self) -> QueryState {
        QueryState {
            filters: self.filters.clone(),
            sort: SortState::from_descriptors(&self.sort),
            group: self.group.clone(),
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}
