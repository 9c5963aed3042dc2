//! Pluggable strategies for ids the caller leaves out
//!
//! The graph keeps asking its creator until it yields an id not yet taken by
//! an element of the requested kind, so a creator only has to be fresh with
//! respect to its own history.

use super::types::{ElementId, ElementKind};
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces candidate ids for new elements
pub trait IdCreator: Send + Sync {
    fn next_id(&self, kind: ElementKind) -> ElementId;
}

/// Caller-supplied delegates
impl<F> IdCreator for F
where
    F: Fn(ElementKind) -> ElementId + Send + Sync,
{
    fn next_id(&self, kind: ElementKind) -> ElementId {
        self(kind)
    }
}

/// Numeric ids counting up from 1, independently per element kind
#[derive(Debug)]
pub struct SequentialIdCreator {
    counters: [AtomicU64; 4],
}

impl SequentialIdCreator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            counters: [
                AtomicU64::new(first),
                AtomicU64::new(first),
                AtomicU64::new(first),
                AtomicU64::new(first),
            ],
        }
    }

    fn slot(kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => 0,
            ElementKind::Edge => 1,
            ElementKind::MultiEdge => 2,
            ElementKind::HyperEdge => 3,
        }
    }
}

impl Default for SequentialIdCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCreator for SequentialIdCreator {
    fn next_id(&self, kind: ElementKind) -> ElementId {
        let next = self.counters[Self::slot(kind)].fetch_add(1, Ordering::Relaxed);
        ElementId::Numeric(next)
    }
}

/// Random GUID text ids
#[derive(Debug, Default)]
pub struct GuidIdCreator;

impl IdCreator for GuidIdCreator {
    fn next_id(&self, _kind: ElementKind) -> ElementId {
        ElementId::guid()
    }
}
