//! Unbounded FIFO hand-off between the coordinator and the workers.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Multi-producer multi-consumer blocking queue.
///
/// `remove` blocks while the queue is empty. Closing the queue wakes every
/// waiter; items already queued are still handed out before `remove`
/// reports the close.
#[derive(Debug)]
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends an item and wakes one waiter.
    pub fn add(&self, item: T) {
        self.state.lock().items.push_back(item);
        self.available.notify_one();
    }

    /// Removes the oldest item, blocking until one is available.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn remove(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Closes the queue and wakes all waiters.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BlockingQueue::new();
        for i in 0..5 {
            queue.add(i);
        }
        assert_eq!(queue.len(), 5);
        queue.close();
        let drained: Vec<_> = std::iter::from_fn(|| queue.remove()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_blocks_until_add() {
        let queue = Arc::new(BlockingQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.remove())
        };

        thread::sleep(Duration::from_millis(20));
        queue.add(42u32);
        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn test_close_drains_then_stops() {
        let queue = BlockingQueue::new();
        queue.add("a");
        queue.close();
        assert_eq!(queue.remove(), Some("a"));
        assert_eq!(queue.remove(), None);
    }

    #[test]
    fn test_close_wakes_waiters() {
        let queue: Arc<BlockingQueue<u8>> = Arc::new(BlockingQueue::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.remove())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }
}
