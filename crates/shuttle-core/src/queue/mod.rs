//! Queue module: the handoff FIFO between a loop's step and its drain.

mod handoff;

pub use handoff::HandoffQueue;

use std::fmt;

/// Returned by [`HandoffQueue::push`] when a bounded queue is at capacity.
///
/// The rejected item travels back to the caller so it is never lost.
pub struct QueueFull<T> {
    pub item: T,
    pub capacity: usize,
}

impl<T> QueueFull<T> {
    /// Take the rejected item back.
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueFull")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handoff queue is full (capacity={})", self.capacity)
    }
}

impl<T> std::error::Error for QueueFull<T> {}
