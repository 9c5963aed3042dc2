//! The first pipe of every chain

use super::{Path, Pipe, PipeItem, PipeState, Starts};
use tracing::debug;

/// Emits the values of a bound source sequence
///
/// Every chain begins with a `StartPipe`; `set_starts` anywhere downstream
/// ends up here.
pub struct StartPipe<T> {
    source: Option<Starts<T>>,
    current: Option<T>,
    state: PipeState,
}

impl<T: PipeItem> StartPipe<T> {
    /// A start pipe with nothing bound yet; it is exhausted immediately
    pub fn new() -> Self {
        Self {
            source: None,
            current: None,
            state: PipeState::NotStarted,
        }
    }

    /// A start pipe bound to `starts`
    pub fn over<I>(starts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Some(Box::new(starts.into_iter())),
            current: None,
            state: PipeState::NotStarted,
        }
    }
}

impl<T: PipeItem> Default for StartPipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PipeItem> Pipe for StartPipe<T> {
    type Start = T;
    type End = T;

    fn set_starts(&mut self, starts: Starts<T>) {
        debug!("Rebinding pipe source");
        self.source = Some(starts);
        self.current = None;
        self.state = PipeState::NotStarted;
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        match self.source.as_mut().and_then(|s| s.next()) {
            Some(item) => {
                self.current = Some(item);
                self.state = PipeState::Advancing;
                true
            }
            None => {
                self.current = None;
                self.source = None;
                self.state = PipeState::Exhausted;
                false
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn path(&self) -> Path {
        self.current.iter().cloned().map(Into::into).collect()
    }

    fn reset(&mut self) {
        self.current = None;
        self.state = PipeState::NotStarted;
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_pipe_emits_source() {
        let mut pipe = StartPipe::over(vec!["a", "b"]);
        assert_eq!(pipe.state(), PipeState::NotStarted);
        assert_eq!(pipe.next_item(), Some("a"));
        assert_eq!(pipe.state(), PipeState::Advancing);
        assert_eq!(pipe.next_item(), Some("b"));
        assert!(!pipe.advance());
        assert!(pipe.current().is_none());
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut pipe = StartPipe::over(vec![1i64]);
        assert!(pipe.advance());
        assert!(!pipe.advance());
        for _ in 0..5 {
            assert!(!pipe.advance());
        }
        assert_eq!(pipe.state(), PipeState::Exhausted);
    }

    #[test]
    fn test_unbound_pipe_is_empty() {
        let mut pipe: StartPipe<i64> = StartPipe::new();
        assert!(!pipe.advance());
    }

    #[test]
    fn test_set_starts_rebinds() {
        let mut pipe = StartPipe::over(vec![1i64]);
        while pipe.advance() {}

        pipe.set_starts(Box::new(vec![7i64, 8].into_iter()));
        assert_eq!(pipe.state(), PipeState::NotStarted);
        assert_eq!(pipe.next_item(), Some(7));
        assert_eq!(pipe.path().len(), 1);
    }
}
