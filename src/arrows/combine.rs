//! Two-input arrow pairing messages in arrival order

use super::{Arrow, Emitter, Receiver};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

struct Pending<A, B> {
    left: VecDeque<A>,
    right: VecDeque<B>,
}

/// Emits `(a, b)` once a message is waiting on each side
///
/// The n-th left message is paired with the n-th right message. Unpaired
/// messages stay queued until their partner arrives.
pub struct CombineArrow<A, B> {
    pending: Mutex<Pending<A, B>>,
    emitter: Emitter<(A, B)>,
}

impl<A, B> CombineArrow<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Pending {
                left: VecDeque::new(),
                right: VecDeque::new(),
            }),
            emitter: Emitter::new(),
        })
    }

    pub fn left_port(self: &Arc<Self>) -> Arc<LeftPort<A, B>> {
        Arc::new(LeftPort(Arc::clone(self)))
    }

    pub fn right_port(self: &Arc<Self>) -> Arc<RightPort<A, B>> {
        Arc::new(RightPort(Arc::clone(self)))
    }

    pub fn receive_left(&self, message: A) {
        let pair = {
            let mut pending = self.pending.lock();
            match pending.right.pop_front() {
                Some(b) => Some((message, b)),
                None => {
                    pending.left.push_back(message);
                    None
                }
            }
        };
        self.deliver(pair);
    }

    pub fn receive_right(&self, message: B) {
        let pair = {
            let mut pending = self.pending.lock();
            match pending.left.pop_front() {
                Some(a) => Some((a, message)),
                None => {
                    pending.right.push_back(message);
                    None
                }
            }
        };
        self.deliver(pair);
    }

    /// Number of queued (left, right) messages still waiting for a partner
    pub fn pending(&self) -> (usize, usize) {
        let pending = self.pending.lock();
        (pending.left.len(), pending.right.len())
    }

    pub fn emitter(&self) -> &Emitter<(A, B)> {
        &self.emitter
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver<(A, B)>>) {
        self.emitter.subscribe(receiver);
    }

    // Subscribers run outside the queue lock so they may feed this arrow again
    fn deliver(&self, pair: Option<(A, B)>) {
        match pair {
            Some(pair) => self.emitter.emit(pair),
            None => trace!("Combine arrow queued an unpaired message"),
        }
    }
}

/// Left input of a [`CombineArrow`]
pub struct LeftPort<A, B>(Arc<CombineArrow<A, B>>);

/// Right input of a [`CombineArrow`]
pub struct RightPort<A, B>(Arc<CombineArrow<A, B>>);

impl<A, B> Receiver<A> for LeftPort<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn receive(&self, message: A) {
        self.0.receive_left(message);
    }
}

impl<A, B> Arrow<A, (A, B)> for LeftPort<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn emitter(&self) -> &Emitter<(A, B)> {
        &self.0.emitter
    }
}

impl<A, B> Receiver<B> for RightPort<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn receive(&self, message: B) {
        self.0.receive_right(message);
    }
}

impl<A, B> Arrow<B, (A, B)> for RightPort<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn emitter(&self) -> &Emitter<(A, B)> {
        &self.0.emitter
    }
}
