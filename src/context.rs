//! Memoized numeric primitives for an expression evaluator.
//!
//! A [`CalculationContext`] is built once by the evaluator and passed to wherever
//! numeric primitives are needed. It owns one memoized cache per function family,
//! a metrics recorder, and a pool of scratch buffers. Each context is independent,
//! so tests and separate evaluators never share cached state.
//!
//! # Example
//!
//! ```
//! use calcexpr::context::CalculationContext;
//!
//! let ctx = CalculationContext::new();
//! assert_eq!(ctx.factorial(5).unwrap(), 120.0);
//! assert_eq!(ctx.combination(5, 2), 10.0);
//! assert!(ctx.factorial(-1).is_err());
//! ```

use std::fmt;

use colored::Colorize;

use crate::errors::NumericError;
use crate::operators::combinatorics::{combination, factorial, permutation};
use crate::perf::lru::CacheStats;
use crate::perf::memoize::{MemoizeOptions, Memoized};
use crate::perf::metrics::MetricsRecorder;
use crate::perf::pool::{ObjectPool, PoolOptions};

/// Cache and pool sizing for a [`CalculationContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Caches for sin, cos and tan
    pub trigonometric: MemoizeOptions,
    /// Caches for ln and log10
    pub logarithmic: MemoizeOptions,
    /// Caches for factorial, combination and permutation
    pub combinatorial: MemoizeOptions,
    /// Pool of scratch buffers
    pub buffers: PoolOptions,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            trigonometric: MemoizeOptions::default(),
            logarithmic: MemoizeOptions::default(),
            combinatorial: MemoizeOptions {
                max_size: 200,
                ttl: None,
            },
            buffers: PoolOptions {
                max_size: 16,
                preallocate: 2,
            },
        }
    }
}

type Unary = Memoized<f64, f64>;
type Binary = Memoized<(i64, i64), f64>;

/// Shared numeric primitives with per-family result caches.
pub struct CalculationContext {
    sin: Unary,
    cos: Unary,
    tan: Unary,
    ln: Unary,
    log10: Unary,
    factorial: Memoized<i64, f64, NumericError>,
    combination: Binary,
    permutation: Binary,
    metrics: MetricsRecorder,
    buffers: ObjectPool<Vec<f64>>,
}

impl CalculationContext {
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Self {
        let trig = options.trigonometric;
        let log = options.logarithmic;
        let comb = options.combinatorial;
        Self {
            sin: Memoized::new(|x: &f64| x.sin(), trig),
            cos: Memoized::new(|x: &f64| x.cos(), trig),
            tan: Memoized::new(|x: &f64| x.tan(), trig),
            ln: Memoized::new(|x: &f64| x.ln(), log),
            log10: Memoized::new(|x: &f64| x.log10(), log),
            factorial: Memoized::fallible(|n: &i64| factorial(*n), comb),
            combination: Memoized::new(|&(n, k): &(i64, i64)| combination(n, k), comb),
            permutation: Memoized::new(|&(n, k): &(i64, i64)| permutation(n, k), comb),
            metrics: MetricsRecorder::new(),
            buffers: ObjectPool::new(Vec::new, options.buffers)
                .with_reset(|buf: &mut Vec<f64>| buf.clear()),
        }
    }

    /// Sine of `x` radians.
    pub fn sin(&self, x: f64) -> f64 {
        self.sin.call(&x)
    }

    /// Cosine of `x` radians.
    pub fn cos(&self, x: f64) -> f64 {
        self.cos.call(&x)
    }

    /// Tangent of `x` radians.
    pub fn tan(&self, x: f64) -> f64 {
        self.tan.call(&x)
    }

    /// Natural logarithm.
    pub fn ln(&self, x: f64) -> f64 {
        self.ln.call(&x)
    }

    /// Base-10 logarithm.
    pub fn log10(&self, x: f64) -> f64 {
        self.log10.call(&x)
    }

    /// # Errors
    /// Returns `NumericError::NegativeFactorialInput` for negative `n`.
    pub fn factorial(&self, n: i64) -> Result<f64, NumericError> {
        self.factorial.try_call(&n)
    }

    pub fn combination(&self, n: i64, k: i64) -> f64 {
        self.combination.call(&(n, k))
    }

    pub fn permutation(&self, n: i64, k: i64) -> f64 {
        self.permutation.call(&(n, k))
    }

    /// Sine of every input, computed in parallel through the shared cache.
    pub fn sin_many(&self, xs: &[f64]) -> Vec<f64> {
        self.sin.call_many(xs)
    }

    /// Cosine of every input, computed in parallel through the shared cache.
    pub fn cos_many(&self, xs: &[f64]) -> Vec<f64> {
        self.cos.call_many(xs)
    }

    /// Takes an empty scratch buffer from the pool.
    pub fn buffer(&mut self) -> Vec<f64> {
        self.buffers.acquire()
    }

    /// Returns a scratch buffer to the pool.
    pub fn recycle(&mut self, buffer: Vec<f64>) {
        self.buffers.release(buffer);
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricsRecorder {
        &mut self.metrics
    }

    /// Empties every result cache.
    pub fn clear_caches(&self) {
        self.sin.clear();
        self.cos.clear();
        self.tan.clear();
        self.ln.clear();
        self.log10.clear();
        self.factorial.clear();
        self.combination.clear();
        self.permutation.clear();
    }

    /// Cache statistics for each primitive, in a fixed order.
    pub fn cache_report(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            ("sin", self.sin.stats()),
            ("cos", self.cos.stats()),
            ("tan", self.tan.stats()),
            ("ln", self.ln.stats()),
            ("log10", self.log10.stats()),
            ("factorial", self.factorial.stats()),
            ("combination", self.combination.stats()),
            ("permutation", self.permutation.stats()),
        ]
    }
}

impl Default for CalculationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CalculationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, stats) in self.cache_report() {
            writeln!(f, "{:>12}: {}", name.yellow(), stats)?;
        }
        write!(f, "{}", self.metrics)
    }
}

impl fmt::Debug for CalculationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculationContext")
            .field("caches", &self.cache_report())
            .field("buffers", &self.buffers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn stats(ctx: &CalculationContext, name: &str) -> CacheStats {
        ctx.cache_report()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| s)
            .unwrap()
    }

    #[test]
    fn test_trigonometric() {
        let ctx = CalculationContext::new();
        assert!((ctx.sin(PI / 2.0) - 1.0).abs() < 1e-12);
        assert!((ctx.cos(0.0) - 1.0).abs() < 1e-12);
        assert!((ctx.tan(PI / 4.0) - 1.0).abs() < 1e-12);
        ctx.sin(PI / 2.0);
        assert_eq!(stats(&ctx, "sin").hits, 1);
        assert_eq!(stats(&ctx, "sin").misses, 1);
    }

    #[test]
    fn test_logarithms() {
        let ctx = CalculationContext::new();
        assert!((ctx.ln(std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert_eq!(ctx.log10(1000.0), 3.0);
        assert!(ctx.ln(-1.0).is_nan());
    }

    #[test]
    fn test_combinatorics() {
        let ctx = CalculationContext::new();
        assert_eq!(ctx.factorial(5), Ok(120.0));
        assert_eq!(
            ctx.factorial(-1),
            Err(NumericError::NegativeFactorialInput(-1))
        );
        assert_eq!(ctx.combination(5, 2), 10.0);
        assert_eq!(ctx.combination(5, 7), 0.0);
        assert_eq!(ctx.permutation(5, 2), 20.0);
        assert_eq!(stats(&ctx, "factorial").size, 1);
    }

    #[test]
    fn test_huge_combinatorial_inputs() {
        let ctx = CalculationContext::new();
        assert_eq!(ctx.factorial(i64::MAX), Ok(f64::INFINITY));
        assert_eq!(ctx.permutation(i64::MAX, 1_000), f64::INFINITY);
        assert_eq!(ctx.combination(i64::MAX, i64::MAX / 2), f64::INFINITY);
    }

    #[test]
    fn test_sin_many_matches_scalar() {
        let ctx = CalculationContext::new();
        let xs: Vec<f64> = (0..32).map(|i| i as f64 * 0.1).collect();
        let many = ctx.sin_many(&xs);
        for (x, y) in xs.iter().zip(many) {
            assert_eq!(x.sin(), y);
        }
        assert_eq!(stats(&ctx, "sin").size, 32);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = CalculationContext::new();
        let b = CalculationContext::new();
        a.cos(1.0);
        assert_eq!(stats(&a, "cos").size, 1);
        assert_eq!(stats(&b, "cos").size, 0);
    }

    #[test]
    fn test_clear_caches() {
        let ctx = CalculationContext::new();
        ctx.sin(1.0);
        ctx.combination(6, 3);
        ctx.clear_caches();
        assert!(ctx.cache_report().iter().all(|(_, s)| s.size == 0));
    }

    #[test]
    fn test_buffers_are_recycled_empty() {
        let mut ctx = CalculationContext::new();
        let mut buf = ctx.buffer();
        buf.extend([1.0, 2.0]);
        ctx.recycle(buf);
        let first = ctx.buffer();
        let second = ctx.buffer();
        assert!(first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn test_metrics_are_reachable() {
        let mut ctx = CalculationContext::new();
        let value = ctx.metrics_mut().measure("fact", || 3 * 2);
        assert_eq!(value, 6);
        assert_eq!(ctx.metrics().get_stats("fact").unwrap().count, 1);
    }
}
