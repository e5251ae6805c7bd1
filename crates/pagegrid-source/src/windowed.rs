use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::adapter::{DataSourceAdapter, LoadOutcome, LoadRequest, ResponseShape, Row, fetch_page};
use crate::config::SourceConfig;
use crate::distinct::{ColumnMeta, DistinctValuesResolver};
use crate::error::SourceError;
use crate::fence::SequenceFence;
use crate::lock;
use crate::response::LoadedPage;
use crate::store::{CollectionChange, Notifier, Slot, VirtualWindow};
use crate::suppression::ChangeSuppression;
use crate::transport::Transport;
use crate::view::{GridView, ViewChange};

/// Virtual-scrolling strategy. Rows are fetched when the grid scrolls a
/// window into view, and written at the absolute index it asked for.
pub struct WindowedLoader<T, X> {
    transport: Arc<X>,
    distinct: DistinctValuesResolver<X>,
    view: Mutex<GridView>,
    window: Mutex<VirtualWindow<T>>,
    load_size: usize,
    provisional_count: usize,
    suppression: ChangeSuppression,
    fence: SequenceFence,
    notifier: Notifier,
}

impl<T: Row, X: Transport> WindowedLoader<T, X> {
    pub fn new(transport: Arc<X>, load_size: usize, provisional_count: usize) -> Self {
        let suppression = ChangeSuppression::new();
        let notifier = Notifier::new(suppression.clone());
        let load_size = load_size.max(1);
        Self {
            distinct: DistinctValuesResolver::new(Arc::clone(&transport)),
            transport,
            view: Mutex::new(GridView::new(load_size)),
            window: Mutex::new(VirtualWindow::new(notifier.clone(), provisional_count)),
            load_size,
            provisional_count,
            suppression,
            fence: SequenceFence::new(),
            notifier,
        }
    }

    pub fn from_config(transport: Arc<X>, config: &SourceConfig) -> Self {
        Self::new(transport, config.page_size, config.provisional_count)
    }

    /// The grid scrolled a window starting at `start_index` into view.
    ///
    /// The fetch asks for page `start_index / load_size` and its rows are
    /// written from `start_index` on. For a start that is not a multiple of
    /// the load size the rows land shifted by `start_index % load_size`.
    pub async fn on_items_loading(&self, start_index: usize) -> Result<LoadOutcome, SourceError> {
        let shift = start_index % self.load_size;
        if shift != 0 {
            warn!(
                start_index,
                load_size = self.load_size,
                shift,
                "window start is not page aligned, rows are written shifted"
            );
        }
        let mut state = lock(&self.view).snapshot();
        state.page_size = self.load_size;
        state.page_index = start_index / self.load_size;
        let request = LoadRequest {
            ticket: self.fence.current(),
            state,
            offset: start_index,
        };
        let page = self.load(&request).await?;
        Ok(self.apply_result(&request, page))
    }

    /// Mutate the grid state. Filter, sort and group changes drop every
    /// loaded row and any window still in flight; the rows reload as the
    /// grid asks for them again.
    pub fn update_view(&self, f: impl FnOnce(&mut GridView) -> ViewChange) -> LoadOutcome {
        let change = {
            let mut view = lock(&self.view);
            f(&mut view)
        };
        if !change.changes_query_shape() {
            return LoadOutcome::Ignored;
        }

        let ticket = self.fence.issue();
        {
            let bulk = self.suppression.begin();
            let mut window = lock(&self.window);
            window.clear(&bulk);
            // A window that believes it is empty never asks for rows again.
            if window.virtual_count() == 0 {
                debug!(provisional = self.provisional_count, "restoring provisional row count");
                window.set_virtual_count(self.provisional_count);
            }
        }
        self.notifier.send(CollectionChange::Reset {
            ticket: Some(ticket),
        });
        LoadOutcome::Deferred
    }

    pub fn view(&self) -> GridView {
        lock(&self.view).clone()
    }

    pub fn virtual_count(&self) -> usize {
        lock(&self.window).virtual_count()
    }

    pub fn load_size(&self) -> usize {
        self.load_size
    }

    /// `len` slots starting at `offset`, unloaded where nothing was fetched.
    pub fn window(&self, offset: usize, len: usize) -> Vec<Slot<T>> {
        lock(&self.window).window(offset, len)
    }

    pub fn loaded_count(&self) -> usize {
        lock(&self.window).loaded_count()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        lock(&self.window).get(index).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.notifier.subscribe()
    }

    pub fn suppression(&self) -> &ChangeSuppression {
        &self.suppression
    }

    pub async fn distinct_values(&self, column: &ColumnMeta) -> Result<Vec<Value>, SourceError> {
        let filters = lock(&self.view).filters().to_vec();
        self.distinct.resolve(column, &filters).await
    }
}

impl<T: Row, X: Transport> DataSourceAdapter for WindowedLoader<T, X> {
    type Item = T;

    async fn load(&self, request: &LoadRequest) -> Result<LoadedPage<T>, SourceError> {
        fetch_page(&*self.transport, &request.state, ResponseShape::Items).await
    }

    fn apply_result(&self, request: &LoadRequest, page: LoadedPage<T>) -> LoadOutcome {
        let bulk = self.suppression.begin();
        let mut window = lock(&self.window);
        if !self.fence.is_current(request.ticket) {
            debug!(start = request.offset, "dropping window loaded for an earlier query");
            return LoadOutcome::Stale;
        }

        let total = page.total();
        let items = match page {
            LoadedPage::Items(result) => result.items,
            LoadedPage::Groups(result) => result.items.into_iter().flat_map(|g| g.items).collect(),
        };
        let written = window.write_range(&bulk, request.offset, items);
        window.set_virtual_count(total);
        info!(start = request.offset, written, total, "window loaded");
        LoadOutcome::Applied {
            written,
            total,
            short_page: false,
        }
    }
}
