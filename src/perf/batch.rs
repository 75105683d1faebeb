//! Size- and time-triggered batching of work items.
//!
//! A [`BatchProcessor`] queues items and hands them to its callback in one call,
//! either as soon as the queue reaches `batch_size` or once `delay` has passed since
//! the first item of the current batch was queued, whichever happens first.
//!
//! At most one delayed flush is outstanding at a time: the timer is armed by the
//! first item of a batch and later `add`s do not re-arm it. A size-triggered or
//! manual [`BatchProcessor::flush`] cancels the pending timer.
//!
//! The queue and timer state sit behind one mutex. The delayed flush runs on a
//! short-lived timer thread that waits on a condition variable, so cancellation
//! wakes it immediately. The callback is always invoked without the lock held.

use std::fmt;
use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Options for a [`BatchProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Queue length that triggers an immediate flush
    pub batch_size: usize,
    /// Maximum time the first item of a batch waits before a flush
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay: Duration::from_millis(16),
        }
    }
}

type Callback<T> = Box<dyn Fn(Vec<T>) + Send + Sync>;

struct Queue<T> {
    items: Vec<T>,
    /// Generation of the armed timer, if one is pending
    timer: Option<u64>,
    generation: u64,
}

struct Shared<T> {
    queue: Mutex<Queue<T>>,
    cancelled: Condvar,
    callback: Callback<T>,
    options: BatchOptions,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the queued items and disarms the timer.
    fn drain(&self) -> Vec<T> {
        let mut queue = self.lock();
        queue.timer = None;
        let items = mem::take(&mut queue.items);
        drop(queue);
        self.cancelled.notify_all();
        items
    }

    fn deliver(&self, items: Vec<T>) {
        if !items.is_empty() {
            (self.callback)(items);
        }
    }
}

/// Groups items into batches delivered to a callback.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use calcexpr::perf::batch::{BatchOptions, BatchProcessor};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let batcher = BatchProcessor::new(
///     BatchOptions { batch_size: 2, delay: Duration::from_secs(60) },
///     move |batch: Vec<u32>| sink.lock().unwrap().push(batch),
/// );
/// batcher.add(1);
/// batcher.add(2);
/// assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2]]);
/// ```
pub struct BatchProcessor<T: Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> BatchProcessor<T> {
    pub fn new<F>(options: BatchOptions, callback: F) -> Self
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    items: Vec::new(),
                    timer: None,
                    generation: 0,
                }),
                cancelled: Condvar::new(),
                callback: Box::new(callback),
                options,
            }),
        }
    }

    /// Queues `item`, flushing immediately if the batch is now full.
    pub fn add(&self, item: T) {
        let mut queue = self.shared.lock();
        queue.items.push(item);

        if queue.items.len() >= self.shared.options.batch_size {
            drop(queue);
            let items = self.shared.drain();
            self.shared.deliver(items);
            return;
        }

        if queue.timer.is_none() {
            queue.generation += 1;
            let generation = queue.generation;
            queue.timer = Some(generation);
            drop(queue);
            self.spawn_timer(generation);
        }
    }

    /// Delivers every queued item now and cancels the pending timer.
    pub fn flush(&self) {
        let items = self.shared.drain();
        self.shared.deliver(items);
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true while a delayed flush is armed.
    pub fn has_pending_timer(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    pub fn options(&self) -> BatchOptions {
        self.shared.options
    }

    fn spawn_timer(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let deadline = Instant::now() + shared.options.delay;
        thread::spawn(move || {
            let mut queue = shared.lock();
            loop {
                if queue.timer != Some(generation) {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                queue = shared
                    .cancelled
                    .wait_timeout(queue, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            queue.timer = None;
            let items = mem::take(&mut queue.items);
            drop(queue);
            shared.deliver(items);
        });
    }
}

/// Dropping the processor delivers anything still queued and cancels the timer.
impl<T: Send + 'static> Drop for BatchProcessor<T> {
    fn drop(&mut self) {
        self.flush();
    }
}

impl<T: Send + 'static> fmt::Debug for BatchProcessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.lock();
        f.debug_struct("BatchProcessor")
            .field("queued", &queue.items.len())
            .field("pending_timer", &queue.timer.is_some())
            .field("options", &self.shared.options)
            .finish()
    }
}
