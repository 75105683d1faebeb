//! Capacity-bounded LRU cache with optional time-to-live.
//!
//! Entries are kept in a doubly linked list ordered from most to least recently
//! used, with a hash index from key to list node. Nodes live in a slab (`Vec`) and
//! link to each other by index, so `get` and `set` are O(1): a hit unlinks the node
//! and relinks it at the head, and an insert at capacity evicts the tail.
//!
//! Recency is refreshed on both reads and writes. When a TTL is configured every
//! entry records its insertion time, and a read of an entry older than the TTL is a
//! miss that also drops the stale entry.
//!
//! # Example
//!
//! ```
//! use calcexpr::perf::lru::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get("a");      // "a" is now the most recently used
//! cache.set("c", 3);   // evicts "b"
//! assert!(cache.has("a"));
//! assert!(!cache.has("b"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use super::clock::{Clock, SystemClock};

/// Default capacity of a cache.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Construction options for [`LruCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LruOptions {
    /// Maximum number of entries
    pub max_size: usize,
    /// Maximum age of an entry, if entries expire at all
    pub ttl: Option<Duration>,
}

impl Default for LruOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
        }
    }
}

/// A cached value and, for TTL-aware caches, the time it was inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub timestamp: Option<Duration>,
}

/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that were hits, or 0 if there were none.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}  {} {}  {} {}  {} {}  {} {:.1}%",
            "size".cyan(),
            self.size,
            self.capacity,
            "hits".cyan(),
            self.hits,
            "misses".cyan(),
            self.misses,
            "evictions".cyan(),
            self.evictions,
            "hit rate".cyan(),
            self.hit_rate() * 100.0
        )
    }
}

struct Node<V> {
    key: String,
    entry: CacheEntry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Least-recently-used cache from string keys to values of type `V`.
pub struct LruCache<V> {
    index: HashMap<String, usize>,
    nodes: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    options: LruOptions,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl<V> LruCache<V> {
    /// Creates a cache holding at most `max_size` entries that never expire.
    pub fn new(max_size: usize) -> Self {
        Self::with_options(LruOptions {
            max_size,
            ttl: None,
        })
    }

    pub fn with_options(options: LruOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock::new()))
    }

    /// Creates a cache that reads entry ages from `clock`.
    pub fn with_clock(options: LruOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            index: HashMap::with_capacity(options.max_size.min(DEFAULT_MAX_SIZE)),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            options,
            clock,
            stats: CacheStats {
                capacity: options.max_size,
                ..CacheStats::default()
            },
        }
    }

    /// Replaces the time source. Existing entries keep their old timestamps.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub fn options(&self) -> LruOptions {
        self.options
    }

    /// Looks up `key`, marking it most recently used on a hit.
    ///
    /// An entry older than the TTL counts as a miss and is removed.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        if self.is_expired(idx) {
            self.remove_node(idx);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        self.detach(idx);
        self.push_front(idx);
        self.node(idx).map(|node| &node.entry.value)
    }

    /// Inserts or overwrites `key`, marking it most recently used.
    ///
    /// Inserting a new key into a full cache first evicts the least recently used one.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if self.options.max_size == 0 {
            return;
        }
        let key = key.into();
        let entry = CacheEntry {
            value,
            timestamp: self.options.ttl.map(|_| self.clock.now()),
        };

        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.nodes[idx].as_mut() {
                node.entry = entry;
            }
            self.detach(idx);
            self.push_front(idx);
            return;
        }

        if self.index.len() >= self.options.max_size {
            if let Some(lru) = self.tail {
                self.remove_node(lru);
                self.stats.evictions += 1;
            }
        }

        let node = Node {
            key: key.clone(),
            entry,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);
    }

    /// Returns true if `key` is present and not expired. Does not affect recency.
    pub fn has(&self, key: &str) -> bool {
        self.index
            .get(key)
            .is_some_and(|&idx| !self.is_expired(idx))
    }

    /// Removes `key`, returning its value.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let idx = *self.index.get(key)?;
        self.remove_node(idx).map(|entry| entry.value)
    }

    /// Removes every entry. Usage counters are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.options.max_size
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.size());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.node(idx) else { break };
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.size(),
            ..self.stats
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<V>> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn is_expired(&self, idx: usize) -> bool {
        let (Some(ttl), Some(node)) = (self.options.ttl, self.node(idx)) else {
            return false;
        };
        match node.entry.timestamp {
            Some(inserted) => self.clock.now().saturating_sub(inserted) > ttl,
            None => false,
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.nodes[h].as_mut() {
                node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn remove_node(&mut self, idx: usize) -> Option<CacheEntry<V>> {
        self.detach(idx);
        let node = self.nodes[idx].take()?;
        self.index.remove(&node.key);
        self.free.push(idx);
        Some(node.entry)
    }
}

impl<V> Default for LruCache<V> {
    fn default() -> Self {
        Self::with_options(LruOptions::default())
    }
}

impl<V: fmt::Debug> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("keys", &self.keys())
            .field("options", &self.options)
            .field("stats", &self.stats())
            .finish()
    }
}
