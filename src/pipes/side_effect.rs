//! Side-effect sinks and the pass-through pipes that feed them
//!
//! A sink is a cheap, cloneable handle to shared state. Clones observe the
//! same accumulator, so one sink can be fed by several pipes or arrows on
//! different threads and read at any time.

use super::{Path, Pipe, PipeBox, PipeItem, PipeState, Starts};
use crate::graph::PropertyValue;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Sample counts strictly between 1 and this bound use Bessel's correction
const BESSEL_CUTOFF: u64 = 30;

/// An accumulator fed with every item passing through
pub trait SideEffect<T>: Send {
    fn accept(&self, item: &T);

    /// Forget everything accepted so far
    fn clear(&self);
}

/// Values that numeric accumulators can consume
///
/// Non-numeric property values yield `None` and are skipped.
pub trait Numeric {
    fn as_f64(&self) -> Option<f64>;
}

impl Numeric for f64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }
}

impl Numeric for i64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for i32 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for u64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for PropertyValue {
    fn as_f64(&self) -> Option<f64> {
        self.as_number()
    }
}

// ============================================================
// Sinks
// ============================================================

/// Atomic item counter
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl<T> SideEffect<T> for Counter {
    fn accept(&self, _item: &T) {
        self.increment();
    }

    fn clear(&self) {
        self.reset();
    }
}

/// Collects every item in arrival order
#[derive(Debug)]
pub struct Aggregate<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> Aggregate<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Copy of everything collected so far
    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T: Clone> Default for Aggregate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> SideEffect<T> for Aggregate<T> {
    fn accept(&self, item: &T) {
        self.push(item.clone());
    }

    fn clear(&self) {
        self.items.lock().clear();
    }
}

/// Occurrence count per distinct item, in first-seen order
#[derive(Debug)]
pub struct GroupCounts<K> {
    counts: Arc<Mutex<IndexMap<K, u64>>>,
}

impl<K: Eq + Hash + Clone> GroupCounts<K> {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    pub fn add(&self, key: &K) {
        *self.counts.lock().entry(key.clone()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.lock().get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> IndexMap<K, u64> {
        self.counts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }
}

impl<K> Clone for GroupCounts<K> {
    fn clone(&self) -> Self {
        Self {
            counts: Arc::clone(&self.counts),
        }
    }
}

impl<K: Eq + Hash + Clone> Default for GroupCounts<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone + Send> SideEffect<K> for GroupCounts<K> {
    fn accept(&self, item: &K) {
        self.add(item);
    }

    fn clear(&self) {
        self.counts.lock().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Min,
    Max,
}

#[derive(Debug)]
struct ExtremumState {
    bits: AtomicU64,
    observed: AtomicBool,
}

/// Running extreme value, updated by compare-exchange
#[derive(Debug, Clone)]
struct Extremum {
    state: Arc<ExtremumState>,
    keep: Keep,
}

impl Extremum {
    fn new(keep: Keep) -> Self {
        let extremum = Self {
            state: Arc::new(ExtremumState {
                bits: AtomicU64::new(0),
                observed: AtomicBool::new(false),
            }),
            keep,
        };
        extremum.clear();
        extremum
    }

    fn initial(&self) -> f64 {
        match self.keep {
            Keep::Min => f64::INFINITY,
            Keep::Max => f64::NEG_INFINITY,
        }
    }

    fn clear(&self) {
        self.state.observed.store(false, Ordering::Release);
        self.state
            .bits
            .store(self.initial().to_bits(), Ordering::Release);
    }

    fn improves(&self, candidate: f64, existing: f64) -> bool {
        match self.keep {
            Keep::Min => candidate < existing,
            Keep::Max => candidate > existing,
        }
    }

    fn offer(&self, value: f64) {
        if value.is_nan() {
            return;
        }
        let mut current = self.state.bits.load(Ordering::Acquire);
        while self.improves(value, f64::from_bits(current)) {
            match self.state.bits.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.state.observed.store(true, Ordering::Release);
    }

    fn value(&self) -> Option<f64> {
        if self.state.observed.load(Ordering::Acquire) {
            Some(f64::from_bits(self.state.bits.load(Ordering::Acquire)))
        } else {
            None
        }
    }
}

macro_rules! extremum_sink {
    ($(#[$doc:meta])* $name:ident, $keep:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(Extremum);

        impl $name {
            pub fn new() -> Self {
                Self(Extremum::new($keep))
            }

            /// Fold one value in; NaN is ignored
            pub fn offer(&self, value: f64) {
                self.0.offer(value);
            }

            /// `None` until the first value arrives
            pub fn value(&self) -> Option<f64> {
                self.0.value()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: Numeric> SideEffect<T> for $name {
            fn accept(&self, item: &T) {
                if let Some(value) = item.as_f64() {
                    self.0.offer(value);
                }
            }

            fn clear(&self) {
                self.0.clear();
            }
        }
    };
}

extremum_sink!(
    /// Smallest numeric value seen
    Minimum,
    Keep::Min
);
extremum_sink!(
    /// Largest numeric value seen
    Maximum,
    Keep::Max
);

#[derive(Debug, Default)]
struct Moments {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

/// Streaming count, mean and standard deviation
///
/// Variance comes from the running sum and sum of squares. While the count
/// is strictly between 1 and 30 the sample (n - 1) denominator is used; at
/// 30 and above the population variance is reported.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    moments: Arc<Mutex<Moments>>,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, value: f64) {
        let mut m = self.moments.lock();
        m.count += 1;
        m.sum += value;
        m.sum_sq += value * value;
    }

    pub fn count(&self) -> u64 {
        self.moments.lock().count
    }

    pub fn sum(&self) -> f64 {
        self.moments.lock().sum
    }

    pub fn mean(&self) -> Option<f64> {
        let m = self.moments.lock();
        if m.count == 0 {
            return None;
        }
        Some(m.sum / m.count as f64)
    }

    pub fn variance(&self) -> Option<f64> {
        let m = self.moments.lock();
        if m.count == 0 {
            return None;
        }
        let n = m.count as f64;
        let mean = m.sum / n;
        let variance = if m.count > 1 && m.count < BESSEL_CUTOFF {
            (m.sum_sq - n * mean * mean) / (n - 1.0)
        } else {
            m.sum_sq / n - mean * mean
        };
        Some(variance.max(0.0))
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

impl<T: Numeric> SideEffect<T> for RunningStats {
    fn accept(&self, item: &T) {
        if let Some(value) = item.as_f64() {
            self.add(value);
        }
    }

    fn clear(&self) {
        *self.moments.lock() = Moments::default();
    }
}

// ============================================================
// Pipes
// ============================================================

/// Passes every input through unchanged while feeding a sink
///
/// A pipe built with `new` owns its sink and clears it whenever the pipe is
/// rebound or reset. A sink handed in through `with_sink` may be shared, so
/// it keeps accumulating across rebinds.
pub struct SideEffectPipe<S, T, K> {
    upstream: PipeBox<S, T>,
    sink: K,
    owns_sink: bool,
    state: PipeState,
}

impl<S, T, K> SideEffectPipe<S, T, K>
where
    S: PipeItem,
    T: PipeItem,
    K: SideEffect<T>,
{
    /// Feed an existing, possibly shared, sink
    pub fn with_sink(upstream: PipeBox<S, T>, sink: K) -> Self {
        Self {
            upstream,
            sink,
            owns_sink: false,
            state: PipeState::NotStarted,
        }
    }

    fn restart(&mut self) {
        if self.owns_sink {
            self.sink.clear();
        }
        self.state = PipeState::NotStarted;
    }

    /// The accumulator; readable at any point of the traversal
    pub fn side_effect(&self) -> &K {
        &self.sink
    }
}

impl<S, T, K> SideEffectPipe<S, T, K>
where
    S: PipeItem,
    T: PipeItem,
    K: SideEffect<T> + Default,
{
    pub fn new(upstream: PipeBox<S, T>) -> Self {
        Self {
            owns_sink: true,
            ..Self::with_sink(upstream, K::default())
        }
    }
}

impl<S, T, K> Pipe for SideEffectPipe<S, T, K>
where
    S: PipeItem,
    T: PipeItem,
    K: SideEffect<T>,
{
    type Start = S;
    type End = T;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.restart();
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        if !self.upstream.advance() {
            self.state = PipeState::Exhausted;
            return false;
        }
        if let Some(item) = self.upstream.current() {
            self.sink.accept(item);
        }
        self.state = PipeState::Advancing;
        true
    }

    fn current(&self) -> Option<&T> {
        match self.state {
            PipeState::Advancing => self.upstream.current(),
            _ => None,
        }
    }

    fn path(&self) -> Path {
        match self.state {
            PipeState::Advancing => self.upstream.path(),
            _ => Path::new(),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
        self.restart();
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

pub type CountPipe<S, T> = SideEffectPipe<S, T, Counter>;
pub type AggregatorPipe<S, T> = SideEffectPipe<S, T, Aggregate<T>>;
pub type GroupCountPipe<S, T> = SideEffectPipe<S, T, GroupCounts<T>>;
pub type MinPipe<S, T> = SideEffectPipe<S, T, Minimum>;
pub type MaxPipe<S, T> = SideEffectPipe<S, T, Maximum>;
pub type AveragePipe<S, T> = SideEffectPipe<S, T, RunningStats>;
pub type StdDevPipe<S, T> = SideEffectPipe<S, T, RunningStats>;
