use std::collections::BTreeMap;

use tokio::sync::broadcast;

use crate::fence::Ticket;
use crate::suppression::{BulkUpdate, ChangeSuppression};

const CHANNEL_CAPACITY: usize = 256;

/// A position in the backing arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Unloaded,
    Loaded(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unloaded
    }
}

impl<T> Slot<T> {
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            Slot::Loaded(item) => Some(item),
            Slot::Unloaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Slot::Loaded(_))
    }
}

/// What observers of a collection are told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    /// The view's query changed and its contents are being reloaded.
    /// `ticket` is set when a loader raised the reset for a refresh it has
    /// already started; `None` comes from outside the loader.
    Reset { ticket: Option<Ticket> },
    SlotReplaced { index: usize },
    RangeCleared { offset: usize, len: usize },
    RangeLoaded { offset: usize, len: usize },
    GroupsLoaded { count: usize },
    CountChanged { count: usize },
}

/// Fan-out of [`CollectionChange`]s. Single-slot changes are held back while
/// a bulk update is active; bulk operations report once for the whole range.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<CollectionChange>,
    suppression: ChangeSuppression,
}

impl Notifier {
    pub fn new(suppression: ChangeSuppression) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            suppression,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.sender.subscribe()
    }

    pub fn suppression(&self) -> &ChangeSuppression {
        &self.suppression
    }

    pub fn send(&self, change: CollectionChange) {
        // No subscribers is not an error.
        let _ = self.sender.send(change);
    }

    fn slot_changed(&self, index: usize) {
        if !self.suppression.is_active() {
            self.send(CollectionChange::SlotReplaced { index });
        }
    }
}

/// Index-addressed arena of rows.
///
/// Rows live at their absolute position (`page_index * page_size + i`).
/// Writing past the end grows the arena with unloaded slots.
#[derive(Debug)]
pub struct SlotBuffer<T> {
    slots: Vec<Slot<T>>,
    notifier: Notifier,
}

impl<T: Clone> SlotBuffer<T> {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            slots: Vec::new(),
            notifier,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot<T>> {
        self.slots.get(index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slot(index).and_then(Slot::as_loaded)
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_loaded()).count()
    }

    /// `len` slots starting at `offset`, padded with unloaded slots past the
    /// end of the arena.
    pub fn window(&self, offset: usize, len: usize) -> Vec<Slot<T>> {
        (offset..offset + len)
            .map(|i| self.slots.get(i).cloned().unwrap_or_default())
            .collect()
    }

    pub fn ensure_len(&mut self, len: usize) {
        if self.slots.len() < len {
            self.slots.resize_with(len, Slot::default);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    pub fn write(&mut self, index: usize, item: T) {
        self.ensure_len(index + 1);
        self.slots[index] = Slot::Loaded(item);
        self.notifier.slot_changed(index);
    }

    pub fn write_range(&mut self, _bulk: &BulkUpdate, offset: usize, items: Vec<T>) -> usize {
        let len = items.len();
        for (i, item) in items.into_iter().enumerate() {
            self.write(offset + i, item);
        }
        self.notifier.send(CollectionChange::RangeLoaded { offset, len });
        len
    }

    /// Unload `[offset, offset + len)` and hand back what was there.
    pub fn clear_range(&mut self, _bulk: &BulkUpdate, offset: usize, len: usize) -> Vec<Slot<T>> {
        let end = (offset + len).min(self.slots.len());
        if offset >= end {
            return Vec::new();
        }
        let stash: Vec<Slot<T>> = self.slots[offset..end]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        self.notifier.send(CollectionChange::RangeCleared {
            offset,
            len: end - offset,
        });
        stash
    }

    /// Put slots taken by [`clear_range`](Self::clear_range) back.
    pub fn restore(&mut self, _bulk: &BulkUpdate, offset: usize, stash: Vec<Slot<T>>) {
        let len = stash.len();
        if len == 0 {
            return;
        }
        self.ensure_len(offset + len);
        for (i, slot) in stash.into_iter().enumerate() {
            self.slots[offset + i] = slot;
        }
        self.notifier.send(CollectionChange::RangeLoaded { offset, len });
    }
}

/// Sparse, open-ended window over the full result set.
///
/// Only loaded rows take memory; a window scrolled in near the end of a
/// large result set does not allocate the rows before it. `virtual_count` is
/// what the grid believes the row count is. It starts as a provisional
/// estimate and becomes authoritative with the first response.
#[derive(Debug)]
pub struct VirtualWindow<T> {
    rows: BTreeMap<usize, T>,
    virtual_count: usize,
    notifier: Notifier,
}

impl<T: Clone> VirtualWindow<T> {
    pub fn new(notifier: Notifier, provisional_count: usize) -> Self {
        Self {
            rows: BTreeMap::new(),
            virtual_count: provisional_count,
            notifier,
        }
    }

    pub fn virtual_count(&self) -> usize {
        self.virtual_count
    }

    /// Declare the row count, dropping loaded rows at or past it.
    pub fn set_virtual_count(&mut self, count: usize) {
        if self.virtual_count == count {
            return;
        }
        self.virtual_count = count;
        self.rows.retain(|&index, _| index < count);
        self.notifier.send(CollectionChange::CountChanged { count });
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.virtual_count {
            return None;
        }
        self.rows.get(&index)
    }

    pub fn slot(&self, index: usize) -> Slot<T> {
        self.get(index).cloned().map_or(Slot::Unloaded, Slot::Loaded)
    }

    /// `len` slots starting at `offset`.
    pub fn window(&self, offset: usize, len: usize) -> Vec<Slot<T>> {
        (offset..offset + len).map(|i| self.slot(i)).collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.rows.len()
    }

    pub fn write_range(&mut self, _bulk: &BulkUpdate, offset: usize, items: Vec<T>) -> usize {
        let len = items.len();
        self.rows
            .extend(items.into_iter().enumerate().map(|(i, item)| (offset + i, item)));
        self.notifier.send(CollectionChange::RangeLoaded { offset, len });
        len
    }

    pub fn clear(&mut self, _bulk: &BulkUpdate) {
        let first = self.rows.keys().next().copied();
        let last = self.rows.keys().next_back().copied();
        if let (Some(first), Some(last)) = (first, last) {
            self.rows.clear();
            self.notifier.send(CollectionChange::RangeCleared {
                offset: first,
                len: last - first + 1,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> (SlotBuffer<u32>, ChangeSuppression, broadcast::Receiver<CollectionChange>) {
        let suppression = ChangeSuppression::new();
        let notifier = Notifier::new(suppression.clone());
        let rx = notifier.subscribe();
        (SlotBuffer::new(notifier), suppression, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<CollectionChange>) -> Vec<CollectionChange> {
        let mut out = Vec::new();
        while let Ok(change) = rx.try_recv() {
            out.push(change);
        }
        out
    }

    #[test]
    fn single_write_notifies_and_grows() {
        let (mut buf, _s, mut rx) = buffer();
        buf.write(3, 30);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.slot(0), Some(&Slot::Unloaded));
        assert_eq!(buf.get(3), Some(&30));
        assert_eq!(drain(&mut rx), vec![CollectionChange::SlotReplaced { index: 3 }]);
    }

    #[test]
    fn bulk_write_reports_once() {
        let (mut buf, suppression, mut rx) = buffer();
        let bulk = suppression.begin();
        assert_eq!(buf.write_range(&bulk, 2, vec![1, 2, 3]), 3);
        drop(bulk);
        assert_eq!(
            drain(&mut rx),
            vec![CollectionChange::RangeLoaded { offset: 2, len: 3 }]
        );
    }

    #[test]
    fn clear_and_restore() {
        let (mut buf, suppression, mut rx) = buffer();
        let bulk = suppression.begin();
        buf.write_range(&bulk, 0, vec![1, 2, 3]);
        let stash = buf.clear_range(&bulk, 1, 10);
        assert_eq!(stash, vec![Slot::Loaded(2), Slot::Loaded(3)]);
        assert_eq!(buf.loaded_count(), 1);
        buf.restore(&bulk, 1, stash);
        assert_eq!(buf.window(0, 4), vec![
            Slot::Loaded(1),
            Slot::Loaded(2),
            Slot::Loaded(3),
            Slot::Unloaded
        ]);
        drop(bulk);
        assert_eq!(
            drain(&mut rx),
            vec![
                CollectionChange::RangeLoaded { offset: 0, len: 3 },
                CollectionChange::RangeCleared { offset: 1, len: 2 },
                CollectionChange::RangeLoaded { offset: 1, len: 2 },
            ]
        );
    }

    #[test]
    fn clear_past_end_is_a_no_op() {
        let (mut buf, suppression, mut rx) = buffer();
        let bulk = suppression.begin();
        assert!(buf.clear_range(&bulk, 5, 5).is_empty());
        drop(bulk);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn virtual_count_truncates_loaded_rows() {
        let suppression = ChangeSuppression::new();
        let mut window = VirtualWindow::new(Notifier::new(suppression.clone()), 100);
        let bulk = suppression.begin();
        window.write_range(&bulk, 0, vec![1, 2, 3, 4]);
        window.set_virtual_count(2);
        assert_eq!(window.get(1), Some(&2));
        assert_eq!(window.get(2), None);
        assert_eq!(window.loaded_count(), 2);
    }

    #[test]
    fn far_window_only_holds_its_own_rows() {
        let suppression = ChangeSuppression::new();
        let mut window = VirtualWindow::new(Notifier::new(suppression.clone()), 20_000_000);
        let bulk = suppression.begin();
        window.write_range(&bulk, 10_000_000, (0..20).collect());
        assert_eq!(window.loaded_count(), 20);
        assert_eq!(window.get(10_000_019), Some(&19));
        assert_eq!(window.get(9_999_999), None);
        assert_eq!(window.window(10_000_018, 3), vec![
            Slot::Loaded(18),
            Slot::Loaded(19),
            Slot::Unloaded
        ]);
    }

    #[test]
    fn clear_reports_loaded_span() {
        let suppression = ChangeSuppression::new();
        let notifier = Notifier::new(suppression.clone());
        let mut rx = notifier.subscribe();
        let mut window = VirtualWindow::new(notifier, 100);
        let bulk = suppression.begin();
        window.write_range(&bulk, 40, vec![1, 2]);
        window.clear(&bulk);
        window.clear(&bulk);
        assert_eq!(window.loaded_count(), 0);
        assert_eq!(
            drain(&mut rx),
            vec![
                CollectionChange::RangeLoaded { offset: 40, len: 2 },
                CollectionChange::RangeCleared { offset: 40, len: 2 },
            ]
        );
    }
}
