//! HandoffQueue - スレッド安全な FIFO
//!
//! # 学習ポイント
//! - Mutex + Condvar による blocking pop（timeout 付き）
//! - Async からの blocking 待ちは spawn_blocking に逃がす
//! - 満杯時は item を呼び出し側に返す（捨てない）

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::QueueFull;

/// HandoffQueue is the FIFO between a loop's producing step and its drain.
///
/// # 実装詳細
/// - `VecDeque<T>` を Mutex で保護
/// - push 時に Condvar で待機中の pop を起こす
/// - capacity が `None` なら無制限（push は常に成功）
///
/// # 使用例
/// ```ignore
/// let queue = HandoffQueue::unbounded();
/// queue.push(1)?;
/// assert_eq!(queue.try_pop(), Some(1));
/// assert_eq!(queue.pop(Duration::from_millis(10)), None);
/// ```
pub struct HandoffQueue<T> {
    items: Arc<Mutex<VecDeque<T>>>,
    /// push 時の通知用
    condvar: Arc<Condvar>,
    capacity: Option<usize>,
}

impl<T> HandoffQueue<T> {
    /// A queue that never rejects a push.
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// A queue holding at most `capacity` items (at least one).
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity.max(1)))
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            condvar: Arc::new(Condvar::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Insert at the tail. Never blocks.
    ///
    /// Only a bounded queue at capacity rejects, handing the item back.
    pub fn push(&self, item: T) -> Result<(), QueueFull<T>> {
        let mut items = lock(&self.items);
        if let Some(capacity) = self.capacity
            && items.len() >= capacity
        {
            return Err(QueueFull { item, capacity });
        }
        items.push_back(item);
        drop(items);

        // 待機中のスレッドに通知
        self.condvar.notify_one();
        Ok(())
    }

    /// Remove the head if present. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        lock(&self.items).pop_front()
    }

    /// Block the calling thread until an item arrives or `timeout` elapses.
    ///
    /// `None` means the timeout expired with the queue still empty.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        wait_pop(&self.items, &self.condvar, timeout)
    }

    /// Remove every queued item at once, in FIFO order.
    pub fn drain_all(&self) -> Vec<T> {
        lock(&self.items).drain(..).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl<T: Send + 'static> HandoffQueue<T> {
    /// Same wait as [`pop`](Self::pop), run on tokio's blocking pool.
    pub async fn pop_async(&self, timeout: Duration) -> Option<T> {
        let items = self.items.clone();
        let condvar = self.condvar.clone();

        // spawn_blocking で同期待ちを実行（async context で Condvar を使うため）
        match tokio::task::spawn_blocking(move || wait_pop(&items, &condvar, timeout)).await {
            Ok(item) => item,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => None,
        }
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> std::fmt::Debug for HandoffQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn lock<T>(items: &Mutex<VecDeque<T>>) -> MutexGuard<'_, VecDeque<T>> {
    // push/pop は途中で panic しないので、poison されても中身は一貫している
    items.lock().unwrap_or_else(PoisonError::into_inner)
}

fn wait_pop<T>(items: &Mutex<VecDeque<T>>, condvar: &Condvar, timeout: Duration) -> Option<T> {
    let deadline = Instant::now().checked_add(timeout);
    let mut guard = lock(items);
    loop {
        if let Some(item) = guard.pop_front() {
            return Some(item);
        }
        guard = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return None;
                }
                condvar
                    .wait_timeout(guard, remaining)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => condvar.wait(guard).unwrap_or_else(PoisonError::into_inner),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    #[test]
    fn preserves_fifo_order() {
        let queue = HandoffQueue::unbounded();
        queue.push("a").unwrap();
        queue.push("b").unwrap();
        queue.push("c").unwrap();

        assert_eq!(queue.try_pop(), Some("a"));
        queue.push("d").unwrap();
        assert_eq!(queue.drain_all(), vec!["b", "c", "d"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn try_pop_on_empty_returns_none() {
        let queue: HandoffQueue<u32> = HandoffQueue::unbounded();
        assert_eq!(queue.try_pop(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn pop_times_out_on_empty_queue() {
        let queue: HandoffQueue<u32> = HandoffQueue::unbounded();
        let start = Instant::now();
        assert_eq!(queue.pop(Duration::from_millis(100)), None);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn pop_returns_immediately_when_item_is_queued() {
        let queue = HandoffQueue::unbounded();
        queue.push(7).unwrap();
        assert_eq!(queue.pop(Duration::from_secs(5)), Some(7));
    }

    #[test]
    fn push_wakes_blocked_pop() {
        let queue = Arc::new(HandoffQueue::unbounded());
        let waiter = thread::spawn({
            let queue = queue.clone();
            move || queue.pop(Duration::from_secs(5))
        });

        thread::sleep(Duration::from_millis(100));
        queue.push(42).unwrap();

        assert_eq!(waiter.join().unwrap(), Some(42));
    }

    #[rstest]
    #[case::one(1)]
    #[case::three(3)]
    fn bounded_queue_hands_back_overflow(#[case] capacity: usize) {
        let queue = HandoffQueue::bounded(capacity);
        for i in 0..capacity {
            queue.push(i).unwrap();
        }

        let full = queue.push(99).unwrap_err();
        assert_eq!(full.capacity, capacity);
        assert_eq!(full.into_inner(), 99);
        assert_eq!(queue.len(), capacity);

        assert_eq!(queue.try_pop(), Some(0));
        assert!(queue.push(99).is_ok());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let queue = HandoffQueue::bounded(0);
        assert_eq!(queue.capacity(), Some(1));
        assert!(queue.push(1).is_ok());
        assert!(queue.push(2).is_err());
    }

    #[test]
    fn concurrent_producer_and_reader_lose_nothing() {
        const N: usize = 10_000;
        let queue = Arc::new(HandoffQueue::unbounded());

        let producer = thread::spawn({
            let queue = queue.clone();
            move || {
                for i in 0..N {
                    queue.push(i).unwrap();
                }
            }
        });

        let mut seen = Vec::with_capacity(N);
        while seen.len() < N {
            if let Some(i) = queue.pop(Duration::from_secs(5)) {
                seen.push(i);
            } else {
                panic!("producer stalled after {} items", seen.len());
            }
        }
        producer.join().unwrap();

        assert_eq!(seen, (0..N).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn pop_async_waits_for_push() {
        let queue = Arc::new(HandoffQueue::unbounded());

        let pop_future = tokio::spawn({
            let queue = queue.clone();
            async move { queue.pop_async(Duration::from_secs(5)).await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.push("hello").unwrap();

        assert_eq!(pop_future.await.unwrap(), Some("hello"));
    }

    #[tokio::test]
    async fn pop_async_times_out() {
        let queue: HandoffQueue<u8> = HandoffQueue::unbounded();
        assert_eq!(queue.pop_async(Duration::from_millis(50)).await, None);
    }
}
