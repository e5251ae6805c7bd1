use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Servers send `null` for empty collections as often as they omit them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of rows as the server returns it.
///
/// `total` counts every row matching the filter before paging and is what
/// the collection is sized from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct QueryResult<T> {
    #[serde(
        alias = "Data",
        alias = "Items",
        alias = "data",
        default,
        deserialize_with = "null_as_default"
    )]
    pub items: Vec<T>,
    #[serde(alias = "Total", default)]
    pub total: usize,
    #[serde(
        rename = "aggregates",
        alias = "AggregateResults",
        default,
        deserialize_with = "null_as_default"
    )]
    pub aggregates: Vec<AggregateResult>,
    #[serde(alias = "Errors", default)]
    pub errors: Option<Value>,
}

/// Rows sharing one grouping key. Only one level of grouping is handled;
/// nested subgroups are left to the server to flatten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GroupBucket<T> {
    #[serde(alias = "Key", default)]
    pub key: Value,
    #[serde(alias = "Member", default)]
    pub member: Option<String>,
    #[serde(alias = "Items", default, deserialize_with = "null_as_default")]
    pub items: Vec<T>,
    #[serde(alias = "HasSubgroups", default)]
    pub has_subgroups: bool,
    #[serde(alias = "Count", alias = "ItemCount", default)]
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(alias = "Member", default)]
    pub member: String,
    #[serde(alias = "AggregateMethodName", default)]
    pub aggregate_method_name: String,
    #[serde(alias = "Value", default)]
    pub value: Value,
}

/// A decoded response in whichever shape was requested.
#[derive(Debug, Clone)]
pub enum LoadedPage<T> {
    Items(QueryResult<T>),
    Groups(QueryResult<GroupBucket<T>>),
}

impl<T> LoadedPage<T> {
    pub fn total(&self) -> usize {
        match self {
            LoadedPage::Items(r) => r.total,
            LoadedPage::Groups(r) => r.total,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LoadedPage::Items(r) => r.items.len(),
            LoadedPage::Groups(r) => r.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
