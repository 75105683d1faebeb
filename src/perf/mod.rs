//! Performance primitives used by the numeric layer.
//!
//! - [`lru`]: capacity- and optionally TTL-bounded LRU cache
//! - [`memoize`]: pure-function memoization backed by the LRU cache
//! - [`batch`]: size- and time-triggered batching
//! - [`pool`]: reusable object pool
//! - [`metrics`]: timing samples and memory probes
//! - [`clock`]: time sources for TTL expiry

pub mod batch;
pub mod clock;
pub mod lru;
pub mod memoize;
pub mod metrics;
pub mod pool;
