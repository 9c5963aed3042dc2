//! Lazy pull-based traversal engine
//!
//! A pipe is one step of a traversal, pulled from downstream:
//! - `advance()` asks for the next output, pulling upstream as needed
//! - `current()` is the output produced by the last successful advance
//! - `path()` is the provenance of that output back to the start value
//!
//! Pipes own their upstream (`PipeBox`), so a chain is built from the start
//! outwards and driven from the last pipe, as in a Volcano operator tree.
//! `set_starts` on any pipe rebinds the source of the first pipe in its chain.

pub mod expand;
pub mod filter;
pub mod pipeline;
pub mod side_effect;
pub mod start;
pub mod transform;
pub mod value;

pub use expand::{
    Direction, EdgesPipe, ExpandPipe, HyperEdgeVerticesPipe, MultiEdgeEdgesPipe, VerticesPipe,
};
pub use filter::{
    CollectionFilterPipe, ComparisonFilterPipe, ComparisonOp, DuplicateFilterPipe, FilterPipe,
    LabelFilterPipe, ObjectFilterPipe, Predicate, PropertyFilterPipe, RandomFilterPipe,
    RangeFilterPipe, UniquePathFilterPipe,
};
pub use pipeline::Pipeline;
pub use side_effect::{
    Aggregate, AggregatorPipe, AveragePipe, CountPipe, Counter, GroupCountPipe, GroupCounts,
    MaxPipe, Maximum, MinPipe, Minimum, Numeric, RunningStats, SideEffect, SideEffectPipe,
    StdDevPipe,
};
pub use start::StartPipe;
pub use transform::{
    IdPipe, IdentityPipe, LabelPipe, PropertyPipe, RevIdPipe, SelectPipe, Transform,
    TransformPipe,
};
pub use value::{Path, Value};

use thiserror::Error;

/// Errors raised while constructing pipes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipeError {
    #[error("Probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("Invalid range: low {low} is greater than high {high}")]
    InvalidRange { low: usize, high: usize },
}

pub type PipeResult<T> = Result<T, PipeError>;

/// Anything that can flow through a pipe and appear in a path
pub trait PipeItem: Clone + Send + Into<Value> + 'static {}

impl<T> PipeItem for T where T: Clone + Send + Into<Value> + 'static {}

/// Source sequence bound to the first pipe of a chain
pub type Starts<T> = Box<dyn Iterator<Item = T> + Send>;

/// Lifecycle of a pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    NotStarted,
    Advancing,
    Exhausted,
}

/// A single lazy traversal step
pub trait Pipe: Send {
    /// Item type accepted by the first pipe of the chain
    type Start: PipeItem;
    /// Item type this pipe emits
    type End: PipeItem;

    /// Rebind the chain's source and return every pipe to `NotStarted`
    fn set_starts(&mut self, starts: Starts<Self::Start>);

    /// Move to the next output; once this returns `false` it keeps doing so
    fn advance(&mut self) -> bool;

    /// Output of the last successful `advance`
    fn current(&self) -> Option<&Self::End>;

    /// Provenance of the current output, start value first
    fn path(&self) -> Path;

    /// Return to `NotStarted` without rebinding the source
    ///
    /// Per-pipe buffers and seen-sets are dropped. The source itself is not
    /// rewound; bind it again with `set_starts` to replay a traversal.
    fn reset(&mut self);

    fn state(&self) -> PipeState;

    /// Advance and clone the new output
    fn next_item(&mut self) -> Option<Self::End> {
        if self.advance() {
            self.current().cloned()
        } else {
            None
        }
    }
}

/// Type alias for boxed pipes
pub type PipeBox<S, E> = Box<dyn Pipe<Start = S, End = E>>;

impl<P: Pipe + ?Sized> Pipe for Box<P> {
    type Start = P::Start;
    type End = P::End;

    fn set_starts(&mut self, starts: Starts<Self::Start>) {
        (**self).set_starts(starts)
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn current(&self) -> Option<&Self::End> {
        (**self).current()
    }

    fn path(&self) -> Path {
        (**self).path()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn state(&self) -> PipeState {
        (**self).state()
    }
}
