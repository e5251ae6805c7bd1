use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scoped suppression of per-slot change notifications.
///
/// Every [`BulkUpdate`] token keeps suppression active until it is dropped,
/// so nested and overlapping bulk writes compose. Collection resets that
/// arrive while any token is alive come from the loader's own writes and
/// must not start another load.
#[derive(Debug, Clone, Default)]
pub struct ChangeSuppression {
    depth: Arc<AtomicUsize>,
}

impl ChangeSuppression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> BulkUpdate {
        self.depth.fetch_add(1, Ordering::SeqCst);
        BulkUpdate {
            depth: Arc::clone(&self.depth),
        }
    }

    pub fn is_active(&self) -> bool {
        self.depth() > 0
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Token for one suppressed region. Bulk store operations take it by
/// reference as proof that per-slot notifications are off.
#[must_use = "suppression ends as soon as the token is dropped"]
#[derive(Debug)]
pub struct BulkUpdate {
    depth: Arc<AtomicUsize>,
}

impl Drop for BulkUpdate {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_by_default() {
        assert!(!ChangeSuppression::new().is_active());
    }

    #[test]
    fn nested_regions() {
        let suppression = ChangeSuppression::new();
        let outer = suppression.begin();
        {
            let _inner = suppression.begin();
            assert_eq!(suppression.depth(), 2);
        }
        assert!(suppression.is_active());
        drop(outer);
        assert!(!suppression.is_active());
    }

    #[test]
    fn overlapping_regions_release_out_of_order() {
        let suppression = ChangeSuppression::new();
        let first = suppression.begin();
        let second = suppression.clone().begin();
        drop(first);
        assert!(suppression.is_active());
        drop(second);
        assert_eq!(suppression.depth(), 0);
    }
}
