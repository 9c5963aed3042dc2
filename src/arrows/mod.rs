//! Push-based message composition
//!
//! Arrows are the push counterpart of pipes: a producer hands each message to
//! its subscribers in subscription order, and every arrow is both a receiver
//! for its input and an emitter for its output. Side-effect arrows reuse the
//! pipes' sinks, so both styles can feed the same accumulator.
//!
//! Delivery is synchronous on the producer's thread. Messages from one
//! producer arrive in order; no ordering holds across concurrent producers.

pub mod arrow;
pub mod combine;
pub mod sensor;

pub use arrow::{ChannelReceiver, FilterArrow, MapArrow, SideEffectArrow};
pub use combine::{CombineArrow, LeftPort, RightPort};
pub use sensor::{ActiveSensor, PassiveSensor};

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by arrows and sensors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArrowError {
    #[error("Sensor is already running")]
    AlreadyRunning,

    #[error("Active sensors need a Tokio runtime")]
    NoRuntime,
}

pub type ArrowResult<T> = Result<T, ArrowError>;

/// Consumes messages pushed to it
pub trait Receiver<T>: Send + Sync {
    fn receive(&self, message: T);
}

/// Fan-out to an ordered list of subscribers
pub struct Emitter<T> {
    subscribers: RwLock<Vec<Arc<dyn Receiver<T>>>>,
}

impl<T: Clone> Emitter<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver<T>>) {
        self.subscribers.write().push(receiver);
    }

    /// Drop every subscription of `receiver`
    pub fn unsubscribe(&self, receiver: &Arc<dyn Receiver<T>>) {
        self.subscribers.write().retain(|r| !Arc::ptr_eq(r, receiver));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Push `message` to each subscriber in subscription order
    ///
    /// Subscribers are snapshotted first, so a receiver may subscribe or
    /// unsubscribe while handling a message.
    pub fn emit(&self, message: T) {
        let subscribers = self.subscribers.read().clone();
        let Some((last, rest)) = subscribers.split_last() else {
            return;
        };
        for receiver in rest {
            receiver.receive(message.clone());
        }
        last.receive(message);
    }
}

impl<T: Clone> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

/// A receiver of `I` that emits `O`
pub trait Arrow<I, O: Clone>: Receiver<I> {
    fn emitter(&self) -> &Emitter<O>;

    fn subscribe(&self, receiver: Arc<dyn Receiver<O>>) {
        self.emitter().subscribe(receiver);
    }
}
