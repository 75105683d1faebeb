//! Wall-clock timing of named operations.
//!
//! A [`MetricsRecorder`] keeps the most recent [`MAX_SAMPLES`] durations per metric
//! name and summarises them as [`Stats`]. Host memory usage is read through the
//! [`MemoryProbe`] capability: recorders default to [`Unsupported`], and
//! [`host_probe`] picks the best probe available on the current platform.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use colored::Colorize;
use itertools::Itertools;

/// Samples retained per metric; older samples are dropped first.
pub const MAX_SAMPLES: usize = 100;

/// Summary of the retained samples of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub count: usize,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p95: Duration,
}

impl Stats {
    fn from_samples(samples: &VecDeque<Duration>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sorted: Vec<Duration> = samples.iter().copied().sorted().collect();
        let count = sorted.len();
        let total: Duration = sorted.iter().sum();
        let p95_index = ((count as f64 * 0.95).floor() as usize).min(count - 1);
        Some(Self {
            count,
            average: total / count as u32,
            min: sorted[0],
            max: sorted[count - 1],
            p95: sorted[p95_index],
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}  {} {:?}  {} {:?}  {} {:?}  {} {:?}",
            "count".cyan(),
            self.count,
            "avg".cyan(),
            self.average,
            "min".cyan(),
            self.min,
            "max".cyan(),
            self.max,
            "p95".cyan(),
            self.p95
        )
    }
}

/// Process memory figures in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub resident: u64,
    pub virtual_size: u64,
}

/// A host-specific way of reading the process's memory usage.
pub trait MemoryProbe: Send + Sync {
    /// Returns `None` when the host cannot report memory usage.
    fn usage(&self) -> Option<MemoryUsage>;
}

/// Probe for hosts without memory introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl MemoryProbe for Unsupported {
    fn usage(&self) -> Option<MemoryUsage> {
        None
    }
}

/// Reads `VmRSS` and `VmSize` from `/proc/self/status` (Linux).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatus;

impl ProcStatus {
    fn parse(status: &str) -> Option<MemoryUsage> {
        let field = |name: &str| -> Option<u64> {
            let line = status.lines().find(|line| line.starts_with(name))?;
            let kib: u64 = line[name.len()..]
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse()
                .ok()?;
            Some(kib * 1024)
        };
        Some(MemoryUsage {
            resident: field("VmRSS:")?,
            virtual_size: field("VmSize:")?,
        })
    }
}

impl MemoryProbe for ProcStatus {
    fn usage(&self) -> Option<MemoryUsage> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        Self::parse(&status)
    }
}

/// The most capable probe for the platform this crate was built for.
pub fn host_probe() -> Box<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcStatus)
    } else {
        Box::new(Unsupported)
    }
}

/// Records durations of named operations.
///
/// # Example
///
/// ```
/// use calcexpr::perf::metrics::MetricsRecorder;
///
/// let mut metrics = MetricsRecorder::new();
/// let sum: u64 = metrics.measure("sum", || (1..=100).sum());
/// assert_eq!(sum, 5050);
/// assert_eq!(metrics.get_stats("sum").unwrap().count, 1);
/// assert!(metrics.get_stats("unknown").is_none());
/// ```
pub struct MetricsRecorder {
    samples: HashMap<String, VecDeque<Duration>>,
    probe: Box<dyn MemoryProbe>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::with_probe(Box::new(Unsupported))
    }

    pub fn with_probe(probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            samples: HashMap::new(),
            probe,
        }
    }

    /// Runs `work` and records how long it took under `name`.
    pub fn measure<T>(&mut self, name: &str, work: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = work();
        self.record(name, start.elapsed());
        result
    }

    /// Awaits `work` and records how long it took under `name`.
    ///
    /// The measured span includes any time the future spends suspended.
    pub async fn measure_async<F: Future>(&mut self, name: &str, work: F) -> F::Output {
        let start = Instant::now();
        let result = work.await;
        self.record(name, start.elapsed());
        result
    }

    /// Adds a sample, dropping the oldest one once [`MAX_SAMPLES`] are retained.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let samples = self.samples.entry(name.to_string()).or_default();
        if samples.len() == MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(elapsed);
    }

    /// Summarises the retained samples of `name`; `None` if there are none.
    pub fn get_stats(&self, name: &str) -> Option<Stats> {
        self.samples.get(name).and_then(Stats::from_samples)
    }

    /// Names of every metric with at least one sample, sorted.
    pub fn metric_names(&self) -> Vec<&str> {
        self.samples
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(name, _)| name.as_str())
            .sorted()
            .collect()
    }

    pub fn clear_metric(&mut self, name: &str) {
        self.samples.remove(name);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn memory_usage(&self) -> Option<MemoryUsage> {
        self.probe.usage()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.metric_names() {
            if let Some(stats) = self.get_stats(name) {
                writeln!(f, "{}: {}", name.yellow(), stats)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("metrics", &self.metric_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll, Wake, Waker};
    use std::thread::{self, Thread};

    struct ThreadWaker(Thread);

    impl Wake for ThreadWaker {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
        let mut cx = Context::from_waker(&waker);
        let mut future = pin!(future);
        loop {
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(output) => return output,
                Poll::Pending => thread::park(),
            }
        }
    }

    /// Pending until a helper thread marks it done and wakes it.
    #[derive(Default)]
    struct WokenLater {
        spawned: bool,
        done: Arc<AtomicBool>,
    }

    impl Future for WokenLater {
        type Output = u8;

        fn poll(mut self: std::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<u8> {
            if self.done.load(Ordering::SeqCst) {
                return Poll::Ready(3);
            }
            if !self.spawned {
                self.spawned = true;
                let done = Arc::clone(&self.done);
                let waker = cx.waker().clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(5));
                    done.store(true, Ordering::SeqCst);
                    waker.wake();
                });
            }
            Poll::Pending
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_measure_records_a_sample() {
        let mut metrics = MetricsRecorder::new();
        let value = metrics.measure("sleep", || {
            std::thread::sleep(ms(5));
            42
        });
        assert_eq!(value, 42);
        let stats = metrics.get_stats("sleep").unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.min >= ms(5));
    }

    #[test]
    fn test_measure_async() {
        let mut metrics = MetricsRecorder::new();
        let value = block_on(metrics.measure_async("ready", async { 7 }));
        assert_eq!(value, 7);
        assert_eq!(metrics.get_stats("ready").unwrap().count, 1);
    }

    #[test]
    fn test_measure_async_includes_suspension() {
        let mut metrics = MetricsRecorder::new();
        let value = block_on(metrics.measure_async("woken", WokenLater::default()));
        assert_eq!(value, 3);
        assert!(metrics.get_stats("woken").unwrap().min >= ms(5));
    }

    #[test]
    fn test_stats() {
        let mut metrics = MetricsRecorder::new();
        for n in [30, 10, 20, 40] {
            metrics.record("op", ms(n));
        }
        let stats = metrics.get_stats("op").unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average, ms(25));
        assert_eq!(stats.min, ms(10));
        assert_eq!(stats.max, ms(40));
        // floor(4 * 0.95) = 3
        assert_eq!(stats.p95, ms(40));
    }

    #[test]
    fn test_p95_index() {
        let mut metrics = MetricsRecorder::new();
        for n in 1..=100 {
            metrics.record("op", ms(n));
        }
        // floor(100 * 0.95) = 95, the 96th smallest sample
        assert_eq!(metrics.get_stats("op").unwrap().p95, ms(96));
    }

    #[test]
    fn test_keeps_latest_samples() {
        let mut metrics = MetricsRecorder::new();
        for n in 1..=150 {
            metrics.record("op", ms(n));
        }
        let stats = metrics.get_stats("op").unwrap();
        assert_eq!(stats.count, MAX_SAMPLES);
        assert_eq!(stats.min, ms(51));
        assert_eq!(stats.max, ms(150));
    }

    #[test]
    fn test_unknown_metric_has_no_stats() {
        let mut metrics = MetricsRecorder::new();
        assert!(metrics.get_stats("nothing").is_none());
        metrics.record("op", ms(1));
        metrics.clear_metric("op");
        assert!(metrics.get_stats("op").is_none());
    }

    #[test]
    fn test_metric_names_and_clear() {
        let mut metrics = MetricsRecorder::new();
        metrics.record("b", ms(1));
        metrics.record("a", ms(1));
        assert_eq!(metrics.metric_names(), vec!["a", "b"]);
        metrics.clear();
        assert!(metrics.metric_names().is_empty());
    }

    #[test]
    fn test_unsupported_probe() {
        assert_eq!(MetricsRecorder::new().memory_usage(), None);
    }

    #[test]
    fn test_proc_status_parsing() {
        let status = "Name:\tcalc\nVmSize:\t  2048 kB\nVmRSS:\t   512 kB\n";
        assert_eq!(
            ProcStatus::parse(status),
            Some(MemoryUsage {
                resident: 512 * 1024,
                virtual_size: 2048 * 1024,
            })
        );
        assert_eq!(ProcStatus::parse("Name:\tcalc\n"), None);
    }
}
