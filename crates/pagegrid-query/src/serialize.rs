use crate::error::QueryError;
use crate::filter::ColumnFilter;
use crate::group::GroupState;
use crate::sort::SortState;

/// Serialize column filters into the `filter` parameter.
///
/// Every clause of every column is joined with `~and~`, in column order.
/// Columns without an active rule contribute nothing; an operator without a
/// protocol token fails the whole filter.
pub fn serialize_filter(filters: &[ColumnFilter]) -> Result<String, QueryError> {
    let mut clauses = Vec::new();
    for filter in filters {
        clauses.extend(filter.clauses()?);
    }
    Ok(clauses.join("~and~"))
}

/// `column-asc` / `column-desc`, or empty when unsorted.
pub fn serialize_sort(sort: &SortState) -> String {
    match &sort.0 {
        Some(s) => format!("{}-{}", s.column, s.direction.token()),
        None => String::new(),
    }
}

/// Group levels as `column-dir`, joined with `~`. A level without a
/// direction keeps the dash and drops the suffix.
pub fn serialize_group(group: &GroupState) -> String {
    group
        .levels()
        .iter()
        .map(|g| format!("{}-{}", g.column, g.direction.map_or("", |d| d.token())))
        .collect::<Vec<_>>()
        .join("~")
}
