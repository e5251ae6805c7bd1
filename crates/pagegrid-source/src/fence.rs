use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence number stamped on a load when it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Orders overlapping loads. Only a response carrying the most recently
/// issued ticket may be written; anything older is dropped.
#[derive(Debug, Default)]
pub struct SequenceFence {
    latest: AtomicU64,
}

impl SequenceFence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Ticket {
        Ticket(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current() == ticket
    }
}
