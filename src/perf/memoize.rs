//! Memoization of pure functions on top of [`LruCache`].
//!
//! A [`Memoized`] value owns a function and a mutex-protected cache of its results.
//! Results are keyed by a canonical rendering of the argument value (its `Debug`
//! form by default, so `(5, 2)` and `(2, 5)` are distinct keys and `NaN` does not
//! collide with infinity); a custom key function can be supplied instead.
//!
//! Fallible functions only cache their successes: an `Err` is returned to the
//! caller and the next call with the same arguments runs the function again.
//!
//! # Example
//!
//! ```
//! use calcexpr::perf::memoize::{Memoized, MemoizeOptions};
//!
//! let square = Memoized::new(|x: &f64| x * x, MemoizeOptions::default());
//! assert_eq!(square.call(&3.0), 9.0);
//! assert_eq!(square.call(&3.0), 9.0); // served from the cache
//! assert_eq!(square.stats().hits, 1);
//! ```

use std::convert::Infallible;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rayon::prelude::*;

use super::clock::Clock;
use super::lru::{CacheStats, LruCache, LruOptions, DEFAULT_MAX_SIZE};

/// Options for a memoized function's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoizeOptions {
    pub max_size: usize,
    pub ttl: Option<Duration>,
}

impl Default for MemoizeOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
        }
    }
}

impl From<MemoizeOptions> for LruOptions {
    fn from(options: MemoizeOptions) -> Self {
        LruOptions {
            max_size: options.max_size,
            ttl: options.ttl,
        }
    }
}

type Func<A, T, E> = Box<dyn Fn(&A) -> Result<T, E> + Send + Sync>;
type KeyFn<A> = Box<dyn Fn(&A) -> String + Send + Sync>;

/// Default cache key: the `Debug` rendering of the arguments.
pub fn canonical_key<A: Debug>(args: &A) -> String {
    format!("{args:?}")
}

/// A pure function wrapped with an LRU cache of its results.
pub struct Memoized<A, T, E = Infallible> {
    func: Func<A, T, E>,
    key: KeyFn<A>,
    cache: Mutex<LruCache<T>>,
}

impl<A: Debug + 'static, T: Clone + 'static> Memoized<A, T, Infallible> {
    /// Wraps an infallible function.
    pub fn new<F>(func: F, options: MemoizeOptions) -> Self
    where
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        Self::fallible(move |args: &A| Ok(func(args)), options)
    }

    /// Returns the cached result for `args`, computing and caching it on a miss.
    pub fn call(&self, args: &A) -> T {
        match self.try_call(args) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<A: Debug + 'static, T: Clone + 'static, E: 'static> Memoized<A, T, E> {
    /// Wraps a fallible function. Only `Ok` results are cached.
    pub fn fallible<F>(func: F, options: MemoizeOptions) -> Self
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            key: Box::new(canonical_key::<A>),
            cache: Mutex::new(LruCache::with_options(options.into())),
        }
    }

    /// Replaces the key function.
    pub fn with_key<K>(mut self, key: K) -> Self
    where
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.key = Box::new(key);
        self
    }

    /// Replaces the time source used for TTL expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .set_clock(clock);
        self
    }

    /// Returns the cached result for `args`, computing it on a miss.
    ///
    /// The lock is not held while the wrapped function runs.
    ///
    /// # Errors
    /// Returns whatever error the wrapped function returns; errors are not cached.
    pub fn try_call(&self, args: &A) -> Result<T, E> {
        let key = (self.key)(args);
        if let Some(value) = self.lock().get(&key) {
            return Ok(value.clone());
        }
        let value = (self.func)(args)?;
        self.lock().set(key, value.clone());
        Ok(value)
    }

    /// Calls the function for every input in parallel, sharing the cache.
    pub fn try_call_many(&self, inputs: &[A]) -> Vec<Result<T, E>>
    where
        A: Sync,
        T: Send,
        E: Send,
    {
        inputs.par_iter().map(|args| self.try_call(args)).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<T>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Debug + Sync + 'static, T: Clone + Send + 'static> Memoized<A, T, Infallible> {
    /// Calls the function for every input in parallel, sharing the cache.
    pub fn call_many(&self, inputs: &[A]) -> Vec<T> {
        inputs.par_iter().map(|args| self.call(args)).collect()
    }
}

impl<A, T, E> fmt::Debug for Memoized<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats();
        f.debug_struct("Memoized").field("stats", &stats).finish()
    }
}
