use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::adapter::{LoadOutcome, Row};
use crate::config::{LoadStrategy, SourceConfig};
use crate::distinct::ColumnMeta;
use crate::error::SourceError;
use crate::grouped::GroupAwareLoader;
use crate::paged::PagedRefillLoader;
use crate::store::{CollectionChange, Slot};
use crate::transport::Transport;
use crate::view::{GridView, ViewChange};
use crate::windowed::WindowedLoader;

/// A grid data source with its loading strategy chosen at construction.
pub enum GridSource<T, X> {
    EagerPaged(PagedRefillLoader<T, X>),
    GroupAware(GroupAwareLoader<T, X>),
    VirtualWindowed(WindowedLoader<T, X>),
}

impl<T: Row, X: Transport> GridSource<T, X> {
    pub fn from_config(transport: Arc<X>, config: &SourceConfig) -> Self {
        match config.strategy {
            LoadStrategy::EagerPaged => {
                GridSource::EagerPaged(PagedRefillLoader::from_config(transport, config))
            }
            LoadStrategy::GroupAware => {
                GridSource::GroupAware(GroupAwareLoader::from_config(transport, config))
            }
            LoadStrategy::VirtualWindowed => {
                GridSource::VirtualWindowed(WindowedLoader::from_config(transport, config))
            }
        }
    }

    pub fn strategy(&self) -> LoadStrategy {
        match self {
            GridSource::EagerPaged(_) => LoadStrategy::EagerPaged,
            GridSource::GroupAware(_) => LoadStrategy::GroupAware,
            GridSource::VirtualWindowed(_) => LoadStrategy::VirtualWindowed,
        }
    }

    /// Paged sources reload immediately; a windowed source defers until the
    /// grid asks for a window.
    pub async fn update_view(
        &self,
        f: impl FnOnce(&mut GridView) -> ViewChange,
    ) -> Result<LoadOutcome, SourceError> {
        match self {
            GridSource::EagerPaged(loader) => loader.update_view(f).await,
            GridSource::GroupAware(loader) => loader.update_view(f).await,
            GridSource::VirtualWindowed(loader) => Ok(loader.update_view(f)),
        }
    }

    /// Load the current page, or the first window.
    pub async fn refresh(&self) -> Result<LoadOutcome, SourceError> {
        match self {
            GridSource::EagerPaged(loader) => loader.refresh().await,
            GridSource::GroupAware(loader) => loader.refresh().await,
            GridSource::VirtualWindowed(loader) => loader.on_items_loading(0).await,
        }
    }

    /// Row count the grid should size itself to.
    pub fn item_count(&self) -> usize {
        match self {
            GridSource::EagerPaged(loader) => loader.item_count(),
            GridSource::GroupAware(loader) => loader.item_count(),
            GridSource::VirtualWindowed(loader) => loader.virtual_count(),
        }
    }

    pub fn get(&self, index: usize) -> Option<T> {
        match self {
            GridSource::EagerPaged(loader) => loader.get(index),
            GridSource::GroupAware(loader) => loader.get(index),
            GridSource::VirtualWindowed(loader) => loader.get(index),
        }
    }

    /// The rows the grid shows first: the current page for paged sources,
    /// the window at index 0 for a windowed one.
    pub fn page_items(&self) -> Vec<Slot<T>> {
        match self {
            GridSource::EagerPaged(loader) => loader.page_items(),
            GridSource::GroupAware(loader) => loader.page_items(),
            GridSource::VirtualWindowed(loader) => loader.window(0, loader.load_size()),
        }
    }

    pub fn view(&self) -> GridView {
        match self {
            GridSource::EagerPaged(loader) => loader.view(),
            GridSource::GroupAware(loader) => loader.view(),
            GridSource::VirtualWindowed(loader) => loader.view(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        match self {
            GridSource::EagerPaged(loader) => loader.subscribe(),
            GridSource::GroupAware(loader) => loader.subscribe(),
            GridSource::VirtualWindowed(loader) => loader.subscribe(),
        }
    }

    pub async fn distinct_values(&self, column: &ColumnMeta) -> Result<Vec<Value>, SourceError> {
        match self {
            GridSource::EagerPaged(loader) => loader.distinct_values(column).await,
            GridSource::GroupAware(loader) => loader.distinct_values(column).await,
            GridSource::VirtualWindowed(loader) => loader.distinct_values(column).await,
        }
    }
}
