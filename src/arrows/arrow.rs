//! Single-input arrows and the channel bridge

use super::{Arrow, Emitter, Receiver};
use crate::pipes::SideEffect;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Emits `f(message)` for every message
pub struct MapArrow<I, O> {
    f: Box<dyn Fn(I) -> O + Send + Sync>,
    emitter: Emitter<O>,
}

impl<I, O: Clone> MapArrow<I, O> {
    pub fn new(f: impl Fn(I) -> O + Send + Sync + 'static) -> Self {
        Self {
            f: Box::new(f),
            emitter: Emitter::new(),
        }
    }
}

impl<I, O: Clone> Receiver<I> for MapArrow<I, O> {
    fn receive(&self, message: I) {
        self.emitter.emit((self.f)(message));
    }
}

impl<I, O: Clone> Arrow<I, O> for MapArrow<I, O> {
    fn emitter(&self) -> &Emitter<O> {
        &self.emitter
    }
}

/// Forwards the messages accepted by a predicate
pub struct FilterArrow<T> {
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
    emitter: Emitter<T>,
}

impl<T: Clone> FilterArrow<T> {
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            emitter: Emitter::new(),
        }
    }
}

impl<T: Clone> Receiver<T> for FilterArrow<T> {
    fn receive(&self, message: T) {
        if (self.predicate)(&message) {
            self.emitter.emit(message);
        } else {
            trace!("Filter arrow dropped a message");
        }
    }
}

impl<T: Clone> Arrow<T, T> for FilterArrow<T> {
    fn emitter(&self) -> &Emitter<T> {
        &self.emitter
    }
}

/// Feeds a sink, then forwards the message unchanged
///
/// Takes the same sinks as the side-effect pipes.
pub struct SideEffectArrow<T, K> {
    sink: K,
    emitter: Emitter<T>,
}

impl<T: Clone, K: SideEffect<T>> SideEffectArrow<T, K> {
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            emitter: Emitter::new(),
        }
    }

    pub fn side_effect(&self) -> &K {
        &self.sink
    }
}

impl<T, K> Receiver<T> for SideEffectArrow<T, K>
where
    T: Clone + Send + Sync,
    K: SideEffect<T> + Sync,
{
    fn receive(&self, message: T) {
        self.sink.accept(&message);
        self.emitter.emit(message);
    }
}

impl<T, K> Arrow<T, T> for SideEffectArrow<T, K>
where
    T: Clone + Send + Sync,
    K: SideEffect<T> + Sync,
{
    fn emitter(&self) -> &Emitter<T> {
        &self.emitter
    }
}

/// Forwards messages into a Tokio channel for async consumers
pub struct ChannelReceiver<T> {
    sender: UnboundedSender<T>,
}

impl<T: Send + 'static> ChannelReceiver<T> {
    pub fn new(sender: UnboundedSender<T>) -> Self {
        Self { sender }
    }

    /// A receiver together with the consuming end of its channel
    pub fn channel() -> (Arc<Self>, UnboundedReceiver<T>) {
        let (tx, rx) = unbounded_channel();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl<T: Send + 'static> Receiver<T> for ChannelReceiver<T> {
    fn receive(&self, message: T) {
        // A closed channel just means nobody is listening any more
        let _ = self.sender.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipes::{Aggregate, Counter};

    #[test]
    fn test_map_filter_chain() {
        let double = Arc::new(MapArrow::new(|n: i64| n * 2));
        let big = Arc::new(FilterArrow::new(|n: &i64| *n > 4));
        let collected: Aggregate<i64> = Aggregate::new();

        big.subscribe(Arc::new(SideEffectArrow::<i64, _>::new(collected.clone())));
        double.subscribe(big.clone());

        for n in 1..=4 {
            double.receive(n);
        }
        assert_eq!(collected.items(), vec![6, 8]);
    }

    #[test]
    fn test_side_effect_arrow_shares_sink_with_pipes() {
        let counter = Counter::new();
        let arrow: SideEffectArrow<&'static str, Counter> = SideEffectArrow::new(counter.clone());
        for word in ["a", "b", "c"] {
            arrow.receive(word);
        }
        assert_eq!(counter.count(), 3);
        assert_eq!(arrow.side_effect().count(), 3);
    }

    #[tokio::test]
    async fn test_channel_receiver() {
        let (receiver, mut rx) = ChannelReceiver::<usize>::channel();
        let arrow = MapArrow::new(|s: &'static str| s.len());
        arrow.subscribe(receiver);

        arrow.receive("marko");
        arrow.receive("josh");

        assert_eq!(rx.recv().await, Some(5));
        assert_eq!(rx.recv().await, Some(4));
    }
}
