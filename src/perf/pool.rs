//! A bounded pool of reusable objects.

use std::fmt;

/// Options for an [`ObjectPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of idle objects kept for reuse
    pub max_size: usize,
    /// Objects created up front
    pub preallocate: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 100,
            preallocate: 0,
        }
    }
}

type Factory<T> = Box<dyn Fn() -> T + Send>;
type Reset<T> = Box<dyn Fn(&mut T) + Send>;

/// Hands out recycled objects, creating new ones through a factory when empty.
///
/// # Example
///
/// ```
/// use calcexpr::perf::pool::{ObjectPool, PoolOptions};
///
/// let mut pool = ObjectPool::new(Vec::<f64>::new, PoolOptions::default())
///     .with_reset(|buf: &mut Vec<f64>| buf.clear());
///
/// let mut buf = pool.acquire();
/// buf.push(1.0);
/// pool.release(buf);
///
/// assert!(pool.acquire().is_empty());
/// assert_eq!(pool.created(), 1);
/// ```
pub struct ObjectPool<T> {
    idle: Vec<T>,
    factory: Factory<T>,
    reset: Option<Reset<T>>,
    max_size: usize,
    created: usize,
}

impl<T> ObjectPool<T> {
    /// Creates a pool, eagerly building `options.preallocate` objects
    /// (at most `options.max_size`).
    pub fn new<F>(factory: F, options: PoolOptions) -> Self
    where
        F: Fn() -> T + Send + 'static,
    {
        let mut pool = Self {
            idle: Vec::with_capacity(options.max_size.min(options.preallocate.max(16))),
            factory: Box::new(factory),
            reset: None,
            max_size: options.max_size,
            created: 0,
        };
        for _ in 0..options.preallocate.min(options.max_size) {
            let obj = pool.create();
            pool.idle.push(obj);
        }
        pool
    }

    /// Sets the callback run on every released object.
    pub fn with_reset<R>(mut self, reset: R) -> Self
    where
        R: Fn(&mut T) + Send + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Takes an idle object, or creates one if none is available.
    pub fn acquire(&mut self) -> T {
        match self.idle.pop() {
            Some(obj) => obj,
            None => self.create(),
        }
    }

    /// Resets `obj` and keeps it for reuse; drops it if the pool is already full.
    pub fn release(&mut self, mut obj: T) {
        if let Some(reset) = &self.reset {
            reset(&mut obj);
        }
        if self.idle.len() < self.max_size {
            self.idle.push(obj);
        }
    }

    /// Number of idle objects ready to be acquired.
    pub fn available(&self) -> usize {
        self.idle.len()
    }

    /// Number of objects the factory has built so far.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn create(&mut self) -> T {
        self.created += 1;
        (self.factory)()
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("available", &self.idle.len())
            .field("created", &self.created)
            .field("max_size", &self.max_size)
            .finish()
    }
}
