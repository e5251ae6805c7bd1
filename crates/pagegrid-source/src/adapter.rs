use std::future::Future;

use pagegrid_query::QueryState;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SourceError;
use crate::fence::Ticket;
use crate::response::{LoadedPage, QueryResult};
use crate::transport::Transport;

/// Row types a grid source can hold.
pub trait Row: DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T: DeserializeOwned + Clone + Send + Sync + 'static> Row for T {}

/// One fetch: the frozen query, the ticket it was issued under, and the
/// absolute index its first row is written to.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: Ticket,
    pub state: QueryState,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows were written. `short_page` marks a non-tail page that came back
    /// with fewer rows than the page size.
    Applied {
        written: usize,
        total: usize,
        short_page: bool,
    },
    /// A newer load was issued while this one was in flight; nothing written.
    Stale,
    /// The reset came from the loader's own writes and was not acted on.
    Ignored,
    /// No fetch was issued; rows load when the grid asks for a window.
    Deferred,
}

/// Which response shape to ask the server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Items,
    Groups,
}

/// The seam between a loading strategy and its backing store.
pub trait DataSourceAdapter: Send + Sync {
    type Item: Row;

    /// Issue the request and decode the response.
    fn load(
        &self,
        request: &LoadRequest,
    ) -> impl Future<Output = Result<LoadedPage<Self::Item>, SourceError>> + Send;

    /// Write a decoded response into the backing store, unless a newer
    /// request has been issued since.
    fn apply_result(&self, request: &LoadRequest, page: LoadedPage<Self::Item>) -> LoadOutcome;
}

/// GET the resource for `state` and decode it as `shape`.
///
/// The group parameter is only sent when groups are asked for; a flat
/// request leaves grouping of the returned page to the grid.
pub(crate) async fn fetch_page<T, X>(
    transport: &X,
    state: &QueryState,
    shape: ResponseShape,
) -> Result<LoadedPage<T>, SourceError>
where
    T: Row,
    X: Transport,
{
    let mut pairs = state.query_pairs()?;
    if shape == ResponseShape::Items {
        pairs.retain(|(key, _)| key != "group");
    }
    debug!(page = state.page_number(), page_size = state.page_size, ?shape, "fetching");

    let body = transport.get_json(&[], pairs).await?;
    let page = match shape {
        ResponseShape::Items => LoadedPage::Items(serde_json::from_value::<QueryResult<T>>(body)?),
        ResponseShape::Groups => LoadedPage::Groups(serde_json::from_value(body)?),
    };
    Ok(page)
}
