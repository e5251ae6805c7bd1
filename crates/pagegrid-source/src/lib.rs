mod adapter;
mod config;
mod distinct;
mod error;
mod fence;
mod grouped;
mod paged;
mod response;
mod source;
mod store;
mod suppression;
mod transport;
mod view;
mod windowed;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use adapter::{DataSourceAdapter, LoadOutcome, LoadRequest, ResponseShape, Row};
pub use config::{
    Credentials, DEFAULT_PAGE_SIZE, LoadStrategy, PROVISIONAL_COUNT, SourceConfig, TransportConfig,
};
pub use distinct::{ColumnMeta, ColumnType, DistinctValuesResolver, static_values};
pub use error::{SourceError, TransportError};
pub use fence::{SequenceFence, Ticket};
pub use grouped::GroupAwareLoader;
pub use paged::{PagedRefillLoader, RefillPhase};
pub use response::{AggregateResult, GroupBucket, LoadedPage, QueryResult};
pub use source::GridSource;
pub use store::{CollectionChange, Notifier, Slot, SlotBuffer, VirtualWindow};
pub use suppression::{BulkUpdate, ChangeSuppression};
pub use transport::{HttpTransport, Transport};
pub use view::{GridView, ViewChange};
pub use windowed::WindowedLoader;

/// Lock, ignoring poison left by a panicked writer.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
