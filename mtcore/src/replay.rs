//! Duplicate detection over recently accepted remote message IDs.

use std::collections::{HashSet, VecDeque};

use crate::message::MessageId;

/// How many remote IDs are remembered by default.
pub const DEFAULT_REPLAY_WINDOW: usize = 500;

/// Bounded FIFO set of remote message IDs.
#[derive(Clone, Debug)]
pub struct ReplayWindow {
    order: VecDeque<MessageId>,
    seen: HashSet<MessageId>,
    capacity: usize,
}

impl ReplayWindow {
    /// Remember at most `capacity` IDs.
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity + 1),
            seen: HashSet::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Whether `id` is currently remembered.
    pub fn contains(&self, id: MessageId) -> bool {
        self.seen.contains(&id)
    }

    /// Number of remembered IDs.
    pub fn len(&self) -> usize { self.order.len() }

    /// True if nothing is remembered.
    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    /// Record `id`, returning `false` if it was already present.
    ///
    /// A repeated ID is left where it is; only new IDs are appended, evicting
    /// the oldest once the window overflows.
    pub fn insert(&mut self, id: MessageId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
                log::trace!("[mtcore] Replay window evicted msg_id {evicted}");
            }
        }
        true
    }
}

impl Default for ReplayWindow {
    fn default() -> Self { Self::new(DEFAULT_REPLAY_WINDOW) }
}
