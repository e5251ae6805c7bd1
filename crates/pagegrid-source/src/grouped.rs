use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::adapter::{DataSourceAdapter, LoadOutcome, LoadRequest, ResponseShape, Row, fetch_page};
use crate::config::SourceConfig;
use crate::distinct::ColumnMeta;
use crate::error::SourceError;
use crate::paged::{PagedCore, RefillPhase};
use crate::response::{GroupBucket, LoadedPage};
use crate::store::{CollectionChange, Slot};
use crate::suppression::ChangeSuppression;
use crate::transport::Transport;
use crate::view::{GridView, ViewChange};

/// Page-refill loader that asks the server to group when the view has
/// group levels.
///
/// Grouped responses land in [`groups`](Self::groups), which is emptied at
/// the start of every refresh. Without group levels it behaves exactly like
/// [`PagedRefillLoader`](crate::PagedRefillLoader).
pub struct GroupAwareLoader<T, X> {
    core: PagedCore<T, X>,
}

impl<T: Row, X: Transport> GroupAwareLoader<T, X> {
    pub fn new(transport: Arc<X>, page_size: usize) -> Self {
        Self {
            core: PagedCore::new(transport, page_size),
        }
    }

    pub fn from_config(transport: Arc<X>, config: &SourceConfig) -> Self {
        Self::new(transport, config.page_size)
    }

    pub async fn update_view(
        &self,
        f: impl FnOnce(&mut GridView) -> ViewChange,
    ) -> Result<LoadOutcome, SourceError> {
        self.core.update_view(self, f).await
    }

    pub async fn on_collection_changed(
        &self,
        change: CollectionChange,
    ) -> Result<LoadOutcome, SourceError> {
        self.core.on_collection_changed(self, change).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, SourceError> {
        self.core.refresh(self).await
    }

    pub fn is_grouped(&self) -> bool {
        !self.core.view().group().is_empty()
    }

    pub fn groups(&self) -> Vec<GroupBucket<T>> {
        self.core.groups()
    }

    pub fn view(&self) -> GridView {
        self.core.view()
    }

    pub fn phase(&self) -> RefillPhase {
        self.core.phase()
    }

    pub fn item_count(&self) -> usize {
        self.core.item_count()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.core.get(index)
    }

    pub fn page_items(&self) -> Vec<Slot<T>> {
        self.core.page_items()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.core.subscribe()
    }

    pub fn suppression(&self) -> &ChangeSuppression {
        self.core.suppression()
    }

    pub async fn distinct_values(&self, column: &ColumnMeta) -> Result<Vec<Value>, SourceError> {
        self.core.distinct_values(column).await
    }
}

impl<T: Row, X: Transport> DataSourceAdapter for GroupAwareLoader<T, X> {
    type Item = T;

    async fn load(&self, request: &LoadRequest) -> Result<LoadedPage<T>, SourceError> {
        let shape = if request.state.is_grouped() {
            ResponseShape::Groups
        } else {
            ResponseShape::Items
        };
        fetch_page(self.core.transport(), &request.state, shape).await
    }

    fn apply_result(&self, request: &LoadRequest, page: LoadedPage<T>) -> LoadOutcome {
        self.core.apply(request, page)
    }
}
