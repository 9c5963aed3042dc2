//! Filter pipes
//!
//! A filter pulls from upstream until an input passes its predicate, then
//! emits that input unchanged. Filters do not extend the path; they report
//! the path of the input they let through.

use super::{Path, Pipe, PipeBox, PipeError, PipeItem, PipeResult, PipeState, Starts};
use crate::graph::{HasProperties, Label, PropertyValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use std::hash::Hash;
use std::sync::Arc;
use tracing::trace;

/// Comparison operators for filter pipes
///
/// With `PropertyValue` operands, `Null` orders below every other value and
/// is `Equal` only to `Null`. Values that cannot be ordered against each
/// other fail every ordering operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl ComparisonOp {
    /// Evaluate `left <op> right`
    pub fn compare<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            ComparisonOp::Equal => left == right,
            ComparisonOp::NotEqual => left != right,
            ComparisonOp::GreaterThan => left > right,
            ComparisonOp::GreaterThanEqual => left >= right,
            ComparisonOp::LessThan => left < right,
            ComparisonOp::LessThanEqual => left <= right,
        }
    }
}

/// Decides which inputs a `FilterPipe` lets through
pub trait Predicate<T>: Send {
    fn test(&mut self, item: &T) -> bool;

    /// Forget per-traversal state
    fn reset(&mut self) {}
}

/// Emits the inputs accepted by its predicate
pub struct FilterPipe<S, T, P> {
    upstream: PipeBox<S, T>,
    predicate: P,
    state: PipeState,
}

impl<S, T, P> FilterPipe<S, T, P>
where
    S: PipeItem,
    T: PipeItem,
    P: Predicate<T>,
{
    pub fn with_predicate(upstream: PipeBox<S, T>, predicate: P) -> Self {
        Self {
            upstream,
            predicate,
            state: PipeState::NotStarted,
        }
    }

    pub fn predicate(&self) -> &P {
        &self.predicate
    }
}

impl<S, T, P> Pipe for FilterPipe<S, T, P>
where
    S: PipeItem,
    T: PipeItem,
    P: Predicate<T>,
{
    type Start = S;
    type End = T;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.predicate.reset();
        self.state = PipeState::NotStarted;
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        while self.upstream.advance() {
            let accepted = match self.upstream.current() {
                Some(item) => self.predicate.test(item),
                None => false,
            };
            if accepted {
                self.state = PipeState::Advancing;
                return true;
            }
            trace!("Filter rejected an input");
        }
        self.state = PipeState::Exhausted;
        false
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
        self.predicate.reset();
        self.state = PipeState::NotStarted;
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

// ============================================================
// Predicates
// ============================================================

/// Compares each input against a fixed value
pub struct Comparison<T> {
    op: ComparisonOp,
    value: T,
}

impl<T: PartialOrd + Send> Predicate<T> for Comparison<T> {
    fn test(&mut self, item: &T) -> bool {
        self.op.compare(item, &self.value)
    }
}

/// Membership in a fixed collection
pub struct Membership<T> {
    items: FxHashSet<T>,
    retain: bool,
}

impl<T: Eq + Hash + Send> Predicate<T> for Membership<T> {
    fn test(&mut self, item: &T) -> bool {
        self.items.contains(item) == self.retain
    }
}

/// Accepts each input independently with a fixed probability
pub struct Sample {
    probability: f64,
    rng: StdRng,
}

impl Sample {
    fn new(probability: f64, rng: StdRng) -> PipeResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(PipeError::InvalidProbability(probability));
        }
        Ok(Self { probability, rng })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl<T> Predicate<T> for Sample {
    fn test(&mut self, _item: &T) -> bool {
        self.rng.gen::<f64>() < self.probability
    }
}

/// Rejects anything seen earlier in the traversal
///
/// The seen-set grows without bound until the pipe is reset or rebound.
pub struct Distinct<T> {
    seen: FxHashSet<T>,
}

impl<T: Eq + Hash + Clone + Send> Predicate<T> for Distinct<T> {
    fn test(&mut self, item: &T) -> bool {
        self.seen.insert(item.clone())
    }

    fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Compares an element's label against a fixed label
pub struct LabelMatch {
    op: ComparisonOp,
    label: Label,
}

impl<T: HasProperties + Send + Sync> Predicate<Arc<T>> for LabelMatch {
    fn test(&mut self, item: &Arc<T>) -> bool {
        self.op.compare(item.label(), &self.label)
    }
}

/// Compares one property of an element against a fixed value
pub struct PropertyMatch {
    key: String,
    op: ComparisonOp,
    value: PropertyValue,
}

impl<T: HasProperties + Send + Sync> Predicate<Arc<T>> for PropertyMatch {
    fn test(&mut self, item: &Arc<T>) -> bool {
        self.op.compare(&item.property(&self.key), &self.value)
    }
}

/// Arbitrary caller-supplied predicate
pub struct Object<T>(Box<dyn FnMut(&T) -> bool + Send>);

impl<T> Predicate<T> for Object<T> {
    fn test(&mut self, item: &T) -> bool {
        (self.0)(item)
    }
}

pub type ComparisonFilterPipe<S, T> = FilterPipe<S, T, Comparison<T>>;
pub type CollectionFilterPipe<S, T> = FilterPipe<S, T, Membership<T>>;
pub type RandomFilterPipe<S, T> = FilterPipe<S, T, Sample>;
pub type DuplicateFilterPipe<S, T> = FilterPipe<S, T, Distinct<T>>;
pub type LabelFilterPipe<S, T> = FilterPipe<S, Arc<T>, LabelMatch>;
pub type PropertyFilterPipe<S, T> = FilterPipe<S, Arc<T>, PropertyMatch>;
pub type ObjectFilterPipe<S, T> = FilterPipe<S, T, Object<T>>;

impl<S, T> ComparisonFilterPipe<S, T>
where
    S: PipeItem,
    T: PipeItem + PartialOrd,
{
    /// Emit inputs `e` for which `e <op> value` holds
    pub fn new(upstream: PipeBox<S, T>, op: ComparisonOp, value: T) -> Self {
        Self::with_predicate(upstream, Comparison { op, value })
    }
}

impl<S, T> CollectionFilterPipe<S, T>
where
    S: PipeItem,
    T: PipeItem + Eq + Hash,
{
    /// Emit inputs contained in `items`
    pub fn retain(upstream: PipeBox<S, T>, items: impl IntoIterator<Item = T>) -> Self {
        Self::with_predicate(
            upstream,
            Membership {
                items: items.into_iter().collect(),
                retain: true,
            },
        )
    }

    /// Emit inputs not contained in `items`
    pub fn exclude(upstream: PipeBox<S, T>, items: impl IntoIterator<Item = T>) -> Self {
        Self::with_predicate(
            upstream,
            Membership {
                items: items.into_iter().collect(),
                retain: false,
            },
        )
    }
}

impl<S: PipeItem, T: PipeItem> RandomFilterPipe<S, T> {
    /// Sample with an entropy-seeded generator
    pub fn new(upstream: PipeBox<S, T>, probability: f64) -> PipeResult<Self> {
        let sample = Sample::new(probability, StdRng::from_entropy())?;
        Ok(Self::with_predicate(upstream, sample))
    }

    /// Sample reproducibly from a fixed seed
    pub fn with_seed(upstream: PipeBox<S, T>, probability: f64, seed: u64) -> PipeResult<Self> {
        let sample = Sample::new(probability, StdRng::seed_from_u64(seed))?;
        Ok(Self::with_predicate(upstream, sample))
    }
}

impl<S, T> DuplicateFilterPipe<S, T>
where
    S: PipeItem,
    T: PipeItem + Eq + Hash,
{
    pub fn new(upstream: PipeBox<S, T>) -> Self {
        Self::with_predicate(
            upstream,
            Distinct {
                seen: FxHashSet::default(),
            },
        )
    }
}

impl<S, T> LabelFilterPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn new(upstream: PipeBox<S, Arc<T>>, op: ComparisonOp, label: impl Into<Label>) -> Self {
        Self::with_predicate(
            upstream,
            LabelMatch {
                op,
                label: label.into(),
            },
        )
    }
}

impl<S, T> PropertyFilterPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    /// Emit elements whose `key` property satisfies `property <op> value`
    pub fn new(
        upstream: PipeBox<S, Arc<T>>,
        key: impl Into<String>,
        op: ComparisonOp,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Self::with_predicate(
            upstream,
            PropertyMatch {
                key: key.into(),
                op,
                value: value.into(),
            },
        )
    }
}

impl<S: PipeItem, T: PipeItem> ObjectFilterPipe<S, T> {
    pub fn new(upstream: PipeBox<S, T>, f: impl FnMut(&T) -> bool + Send + 'static) -> Self {
        Self::with_predicate(upstream, Object(Box::new(f)))
    }
}

// ============================================================
// Path and position filters
// ============================================================

/// Rejects inputs that already occur earlier in their own path
///
/// Only the current path is consulted, not the traversal's history, so the
/// same element may pass again on a different path.
pub struct UniquePathFilterPipe<S, T> {
    upstream: PipeBox<S, T>,
    state: PipeState,
}

impl<S: PipeItem, T: PipeItem> UniquePathFilterPipe<S, T> {
    pub fn new(upstream: PipeBox<S, T>) -> Self {
        Self {
            upstream,
            state: PipeState::NotStarted,
        }
    }
}

impl<S: PipeItem, T: PipeItem> Pipe for UniquePathFilterPipe<S, T> {
    type Start = S;
    type End = T;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.state = PipeState::NotStarted;
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        while self.upstream.advance() {
            let path = self.upstream.path();
            let unique = match path.split_last() {
                Some((last, earlier)) => !earlier.contains(last),
                None => false,
            };
            if unique {
                self.state = PipeState::Advancing;
                return true;
            }
            trace!("Unique-path filter rejected a revisit");
        }
        self.state = PipeState::Exhausted;
        false
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
        self.state = PipeState::NotStarted;
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

/// Emits the inputs at positions `low..high`
///
/// Once `high` inputs have been pulled the pipe is exhausted without
/// touching upstream again.
pub struct RangeFilterPipe<S, T> {
    upstream: PipeBox<S, T>,
    low: usize,
    high: Option<usize>,
    position: usize,
    state: PipeState,
}

impl<S: PipeItem, T: PipeItem> RangeFilterPipe<S, T> {
    pub fn new(upstream: PipeBox<S, T>, low: usize, high: Option<usize>) -> PipeResult<Self> {
        if let Some(high) = high {
            if high < low {
                return Err(PipeError::InvalidRange { low, high });
            }
        }
        Ok(Self {
            upstream,
            low,
            high,
            position: 0,
            state: PipeState::NotStarted,
        })
    }
}

impl<S: PipeItem, T: PipeItem> Pipe for RangeFilterPipe<S, T> {
    type Start = S;
    type End = T;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.position = 0;
        self.state = PipeState::NotStarted;
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        loop {
            if self.high.map_or(false, |high| self.position >= high) {
                break;
            }
            if !self.upstream.advance() {
                break;
            }
            let index = self.position;
            self.position += 1;
            if index >= self.low {
                self.state = PipeState::Advancing;
                return true;
            }
        }
        self.state = PipeState::Exhausted;
        false
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
        self.position = 0;
        self.state = PipeState::NotStarted;
    }

    fn state(&self) -> PipeState {
        self.state
    }
}
