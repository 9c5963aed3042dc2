//! One-to-one transform pipes
//!
//! Every transform pipe emits exactly one output per input and extends the
//! path with that output.

use super::{Path, Pipe, PipeBox, PipeItem, PipeState, Starts};
use crate::graph::{ElementId, HasProperties, Label, PropertyValue, RevisionId};
use std::sync::Arc;

/// The function a `TransformPipe` applies to each input
pub trait Transform<I, O>: Send {
    fn apply(&mut self, item: &I) -> O;
}

/// Emits `f(input)` for every input
pub struct TransformPipe<S, I, O, F> {
    upstream: PipeBox<S, I>,
    transform: F,
    current: Option<O>,
    state: PipeState,
}

impl<S, I, O, F> TransformPipe<S, I, O, F>
where
    S: PipeItem,
    I: PipeItem,
    O: PipeItem,
    F: Transform<I, O>,
{
    pub fn with_transform(upstream: PipeBox<S, I>, transform: F) -> Self {
        Self {
            upstream,
            transform,
            current: None,
            state: PipeState::NotStarted,
        }
    }

    fn exhaust(&mut self) -> bool {
        self.current = None;
        self.state = PipeState::Exhausted;
        false
    }
}

impl<S, I, O, F> Pipe for TransformPipe<S, I, O, F>
where
    S: PipeItem,
    I: PipeItem,
    O: PipeItem,
    F: Transform<I, O>,
{
    type Start = S;
    type End = O;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.current = None;
        self.state = PipeState::NotStarted;
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        if !self.upstream.advance() {
            return self.exhaust();
        }
        match self.upstream.current() {
            Some(item) => {
                self.current = Some(self.transform.apply(item));
                self.state = PipeState::Advancing;
                true
            }
            None => self.exhaust(),
        }
    }

    fn current(&self) -> Option<&O> {
        self.current.as_ref()
    }

    fn path(&self) -> Path {
        let mut path = self.upstream.path();
        if let Some(current) = &self.current {
            path.push(current.clone().into());
        }
        path
    }

    fn reset(&mut self) {
        self.upstream.reset();
        self.current = None;
        self.state = PipeState::NotStarted;
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

/// Emits its input unchanged
pub struct Identity;

impl<T: Clone + Send> Transform<T, T> for Identity {
    fn apply(&mut self, item: &T) -> T {
        item.clone()
    }
}

/// Arbitrary caller-supplied function
pub struct Select<I, O>(Box<dyn FnMut(&I) -> O + Send>);

impl<I, O> Transform<I, O> for Select<I, O> {
    fn apply(&mut self, item: &I) -> O {
        (self.0)(item)
    }
}

pub struct IdOf;

impl<T: HasProperties + Send + Sync> Transform<Arc<T>, ElementId> for IdOf {
    fn apply(&mut self, item: &Arc<T>) -> ElementId {
        item.id().clone()
    }
}

pub struct LabelOf;

impl<T: HasProperties + Send + Sync> Transform<Arc<T>, Label> for LabelOf {
    fn apply(&mut self, item: &Arc<T>) -> Label {
        item.label().clone()
    }
}

pub struct RevIdOf;

impl<T: HasProperties + Send + Sync> Transform<Arc<T>, RevisionId> for RevIdOf {
    fn apply(&mut self, item: &Arc<T>) -> RevisionId {
        item.rev_id()
    }
}

/// Reads one property key; missing keys read as `Null`
pub struct PropertyOf {
    key: String,
}

impl<T: HasProperties + Send + Sync> Transform<Arc<T>, PropertyValue> for PropertyOf {
    fn apply(&mut self, item: &Arc<T>) -> PropertyValue {
        item.property(&self.key)
    }
}

pub type IdentityPipe<S, T> = TransformPipe<S, T, T, Identity>;
pub type SelectPipe<S, I, O> = TransformPipe<S, I, O, Select<I, O>>;
pub type IdPipe<S, T> = TransformPipe<S, Arc<T>, ElementId, IdOf>;
pub type LabelPipe<S, T> = TransformPipe<S, Arc<T>, Label, LabelOf>;
pub type RevIdPipe<S, T> = TransformPipe<S, Arc<T>, RevisionId, RevIdOf>;
pub type PropertyPipe<S, T> = TransformPipe<S, Arc<T>, PropertyValue, PropertyOf>;

impl<S: PipeItem, T: PipeItem> IdentityPipe<S, T> {
    pub fn new(upstream: PipeBox<S, T>) -> Self {
        Self::with_transform(upstream, Identity)
    }
}

impl<S: PipeItem, I: PipeItem, O: PipeItem> SelectPipe<S, I, O> {
    pub fn new(upstream: PipeBox<S, I>, f: impl FnMut(&I) -> O + Send + 'static) -> Self {
        Self::with_transform(upstream, Select(Box::new(f)))
    }
}

impl<S, T> IdPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn new(upstream: PipeBox<S, Arc<T>>) -> Self {
        Self::with_transform(upstream, IdOf)
    }
}

impl<S, T> LabelPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn new(upstream: PipeBox<S, Arc<T>>) -> Self {
        Self::with_transform(upstream, LabelOf)
    }
}

impl<S, T> RevIdPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn new(upstream: PipeBox<S, Arc<T>>) -> Self {
        Self::with_transform(upstream, RevIdOf)
    }
}

impl<S, T> PropertyPipe<S, T>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn new(upstream: PipeBox<S, Arc<T>>, key: impl Into<String>) -> Self {
        Self::with_transform(upstream, PropertyOf { key: key.into() })
    }
}
