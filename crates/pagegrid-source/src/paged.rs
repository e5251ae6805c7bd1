use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::adapter::{DataSourceAdapter, LoadOutcome, LoadRequest, ResponseShape, Row, fetch_page};
use crate::config::SourceConfig;
use crate::distinct::{ColumnMeta, DistinctValuesResolver};
use crate::error::SourceError;
use crate::fence::{SequenceFence, Ticket};
use crate::lock;
use crate::response::{GroupBucket, LoadedPage};
use crate::store::{CollectionChange, Notifier, Slot, SlotBuffer};
use crate::suppression::ChangeSuppression;
use crate::transport::Transport;
use crate::view::{GridView, ViewChange};

/// Where a page refresh currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillPhase {
    Idle,
    Invalidated,
    Clearing,
    Fetching,
    Writing,
}

struct PageStore<T> {
    slots: SlotBuffer<T>,
    groups: Vec<GroupBucket<T>>,
    total: usize,
}

/// What a refresh cleared, kept until its response arrives.
struct Stash<T> {
    offset: usize,
    full: bool,
    slots: Vec<Slot<T>>,
    groups: Vec<GroupBucket<T>>,
}

/// State shared by the page-refill strategies.
pub(crate) struct PagedCore<T, X> {
    transport: Arc<X>,
    distinct: DistinctValuesResolver<X>,
    view: Mutex<GridView>,
    store: Mutex<PageStore<T>>,
    phase: Mutex<(Ticket, RefillPhase)>,
    full_clear: AtomicBool,
    suppression: ChangeSuppression,
    fence: SequenceFence,
    notifier: Notifier,
}

impl<T: Row, X: Transport> PagedCore<T, X> {
    pub(crate) fn new(transport: Arc<X>, page_size: usize) -> Self {
        let suppression = ChangeSuppression::new();
        let notifier = Notifier::new(suppression.clone());
        let fence = SequenceFence::new();
        Self {
            distinct: DistinctValuesResolver::new(Arc::clone(&transport)),
            transport,
            view: Mutex::new(GridView::new(page_size)),
            store: Mutex::new(PageStore {
                slots: SlotBuffer::new(notifier.clone()),
                groups: Vec::new(),
                total: 0,
            }),
            phase: Mutex::new((fence.current(), RefillPhase::Idle)),
            full_clear: AtomicBool::new(false),
            suppression,
            fence,
            notifier,
        }
    }

    pub(crate) fn transport(&self) -> &X {
        &self.transport
    }

    /// Apply a view mutation and reload. The reset observers see carries the
    /// refresh's ticket, so forwarding it back is recognised as an echo.
    pub(crate) async fn update_view<A>(
        &self,
        adapter: &A,
        f: impl FnOnce(&mut GridView) -> ViewChange,
    ) -> Result<LoadOutcome, SourceError>
    where
        A: DataSourceAdapter<Item = T>,
    {
        let change = {
            let mut view = lock(&self.view);
            f(&mut view)
        };
        if change.changes_query_shape() {
            // Rows cached for other pages belong to the old query.
            self.full_clear.store(true, Ordering::SeqCst);
        }
        if self.suppression.is_active() {
            debug!(?change, "view changed during a bulk update, not reloading");
            return Ok(LoadOutcome::Ignored);
        }

        let ticket = self.fence.issue();
        self.notifier.send(CollectionChange::Reset {
            ticket: Some(ticket),
        });
        self.run(adapter, ticket).await
    }

    pub(crate) async fn on_collection_changed<A>(
        &self,
        adapter: &A,
        change: CollectionChange,
    ) -> Result<LoadOutcome, SourceError>
    where
        A: DataSourceAdapter<Item = T>,
    {
        match change {
            CollectionChange::Reset {
                ticket: Some(ticket),
            } if ticket <= self.fence.current() => {
                debug!(ticket = ticket.get(), "reset raised by this loader, not reloading");
                Ok(LoadOutcome::Ignored)
            }
            CollectionChange::Reset { .. } if self.suppression.is_active() => {
                debug!("reset raised by a bulk update, not reloading");
                Ok(LoadOutcome::Ignored)
            }
            CollectionChange::Reset { .. } => self.refresh(adapter).await,
            _ => Ok(LoadOutcome::Ignored),
        }
    }

    pub(crate) async fn refresh<A>(&self, adapter: &A) -> Result<LoadOutcome, SourceError>
    where
        A: DataSourceAdapter<Item = T>,
    {
        let ticket = self.fence.issue();
        self.run(adapter, ticket).await
    }

    async fn run<A>(&self, adapter: &A, ticket: Ticket) -> Result<LoadOutcome, SourceError>
    where
        A: DataSourceAdapter<Item = T>,
    {
        let state = lock(&self.view).snapshot();
        let request = LoadRequest {
            ticket,
            offset: state.offset(),
            state,
        };
        self.enter(ticket, RefillPhase::Invalidated);

        self.enter(ticket, RefillPhase::Clearing);
        let stash = self.clear(&request);

        self.enter(ticket, RefillPhase::Fetching);
        let page = match adapter.load(&request).await {
            Ok(page) => page,
            Err(e) => {
                if self.fence.is_current(ticket) {
                    warn!(
                        error = %e,
                        page = request.state.page_number(),
                        "load failed, previous rows restored"
                    );
                    self.restore(stash);
                    self.enter(ticket, RefillPhase::Idle);
                }
                return Err(e);
            }
        };

        self.enter(ticket, RefillPhase::Writing);
        let outcome = adapter.apply_result(&request, page);
        self.enter(ticket, RefillPhase::Idle);
        Ok(outcome)
    }

    /// Only the newest refresh moves the visible phase.
    fn enter(&self, ticket: Ticket, phase: RefillPhase) {
        let mut current = lock(&self.phase);
        if ticket >= current.0 {
            *current = (ticket, phase);
        }
    }

    fn clear(&self, request: &LoadRequest) -> Stash<T> {
        let bulk = self.suppression.begin();
        let mut store = lock(&self.store);
        let full = self.full_clear.swap(false, Ordering::SeqCst);
        let (offset, len) = if full {
            (0, store.slots.len())
        } else {
            (request.offset, request.state.page_size)
        };
        let slots = store.slots.clear_range(&bulk, offset, len);
        let groups = std::mem::take(&mut store.groups);
        Stash {
            offset,
            full,
            slots,
            groups,
        }
    }

    fn restore(&self, stash: Stash<T>) {
        let bulk = self.suppression.begin();
        let mut store = lock(&self.store);
        store.slots.restore(&bulk, stash.offset, stash.slots);
        store.groups = stash.groups;
        if stash.full {
            self.full_clear.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) fn apply(&self, request: &LoadRequest, page: LoadedPage<T>) -> LoadOutcome {
        let bulk = self.suppression.begin();
        let mut store = lock(&self.store);

        // Checked under the store lock so a newer refresh cannot clear
        // between the check and the write.
        if !self.fence.is_current(request.ticket) {
            debug!(ticket = request.ticket.get(), "dropping response of superseded load");
            return LoadOutcome::Stale;
        }

        let total = page.total();
        let page_size = request.state.page_size;
        let outcome = match page {
            LoadedPage::Items(result) => {
                let mut items = result.items;
                if items.len() > page_size {
                    warn!(
                        returned = items.len(),
                        page_size,
                        "server returned more rows than a page"
                    );
                    items.truncate(page_size);
                }
                let written = store.slots.write_range(&bulk, request.offset, items);
                let short_page = written < page_size && request.offset + written < total;
                if short_page {
                    warn!(
                        page = request.state.page_number(),
                        written,
                        page_size,
                        total,
                        "page shorter than the total implies, trailing slots left unloaded"
                    );
                }
                LoadOutcome::Applied {
                    written,
                    total,
                    short_page,
                }
            }
            LoadedPage::Groups(result) => {
                let count = result.items.len();
                store.groups.extend(result.items);
                self.notifier.send(CollectionChange::GroupsLoaded { count });
                LoadOutcome::Applied {
                    written: count,
                    total,
                    short_page: false,
                }
            }
        };

        if store.total != total {
            store.total = total;
            self.notifier.send(CollectionChange::CountChanged { count: total });
        }
        info!(page = request.state.page_number(), total, "page loaded");
        outcome
    }

    pub(crate) fn view(&self) -> GridView {
        lock(&self.view).clone()
    }

    pub(crate) fn phase(&self) -> RefillPhase {
        lock(&self.phase).1
    }

    pub(crate) fn item_count(&self) -> usize {
        lock(&self.store).total
    }

    pub(crate) fn get(&self, index: usize) -> Option<T> {
        lock(&self.store).slots.get(index).cloned()
    }

    pub(crate) fn page_items(&self) -> Vec<Slot<T>> {
        let (offset, len) = {
            let view = lock(&self.view);
            (view.page_index() * view.page_size(), view.page_size())
        };
        lock(&self.store).slots.window(offset, len)
    }

    pub(crate) fn groups(&self) -> Vec<GroupBucket<T>> {
        lock(&self.store).groups.clone()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.notifier.subscribe()
    }

    pub(crate) fn suppression(&self) -> &ChangeSuppression {
        &self.suppression
    }

    pub(crate) async fn distinct_values(
        &self,
        column: &ColumnMeta,
    ) -> Result<Vec<Value>, SourceError> {
        let filters = lock(&self.view).filters().to_vec();
        self.distinct.resolve(column, &filters).await
    }
}

/// Eager strategy: every change reloads the current page in place.
pub struct PagedRefillLoader<T, X> {
    core: PagedCore<T, X>,
}

impl<T: Row, X: Transport> PagedRefillLoader<T, X> {
    pub fn new(transport: Arc<X>, page_size: usize) -> Self {
        Self {
            core: PagedCore::new(transport, page_size),
        }
    }

    pub fn from_config(transport: Arc<X>, config: &SourceConfig) -> Self {
        Self::new(transport, config.page_size)
    }

    /// Mutate the grid state and reload the page it now points at.
    pub async fn update_view(
        &self,
        f: impl FnOnce(&mut GridView) -> ViewChange,
    ) -> Result<LoadOutcome, SourceError> {
        self.core.update_view(self, f).await
    }

    /// Entry point for collection notifications. Resets this loader raised
    /// itself, and resets arriving while a bulk update is writing, are
    /// ignored; any other reset reloads the current page.
    pub async fn on_collection_changed(
        &self,
        change: CollectionChange,
    ) -> Result<LoadOutcome, SourceError> {
        self.core.on_collection_changed(self, change).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, SourceError> {
        self.core.refresh(self).await
    }

    pub fn view(&self) -> GridView {
        self.core.view()
    }

    pub fn phase(&self) -> RefillPhase {
        self.core.phase()
    }

    /// Server-side row count of the last applied load.
    pub fn item_count(&self) -> usize {
        self.core.item_count()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.core.get(index)
    }

    /// The slots of the current page, always `page_size` long.
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

impl<T: Row, X: Transport> DataSourceAdapter for PagedRefillLoader<T, X> {
    type Item = T;

    async fn load(&self, request: &LoadRequest) -> Result<LoadedPage<T>, SourceError> {
        fetch_page(self.core.transport(), &request.state, ResponseShape::Items).await
    }

    fn apply_result(&self, request: &LoadRequest, page: LoadedPage<T>) -> LoadOutcome {
        self.core.apply(request, page)
    }
}
