//! Observable state holder.
//!
//! A [`StateCell`] always has a current value. Observers obtained through
//! [`StateCell::subscribe`] first yield that value, then every later
//! transition exactly once and in order.

use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

/// Current value plus a broadcast of every change.
#[derive(Debug)]
pub struct StateCell<T> {
    current: Mutex<T>,
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> StateCell<T> {
    /// `capacity` is how many transitions an observer may fall behind
    /// before it skips ahead.
    pub fn new(initial: T, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            current: Mutex::new(initial),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.lock().clone()
    }

    /// Replace the value and notify observers.
    pub fn set(&self, value: T) {
        let mut current = self.lock();
        *current = value.clone();
        // no receivers is fine: late subscribers read `current`
        let _ = self.tx.send(value);
    }

    /// Replace the value only if `accept(old, new)` holds.
    ///
    /// Check and publish happen under one lock, so two writers cannot
    /// interleave between them.
    pub fn set_if(&self, value: T, accept: impl FnOnce(&T, &T) -> bool) -> bool {
        let mut current = self.lock();
        if !accept(&current, &value) {
            return false;
        }
        *current = value.clone();
        let _ = self.tx.send(value);
        true
    }

    /// A stream starting at the current value.
    pub fn subscribe(&self) -> StateStream<T> {
        let current = self.lock();
        let rx = self.tx.subscribe();
        StateStream {
            first: Some(current.clone()),
            rest: BroadcastStream::new(rx),
        }
    }
}

// ── StateStream ──────────────────────────────────────────────────

/// Live view of a [`StateCell`].
///
/// Ends when the owning cell is dropped.
pub struct StateStream<T> {
    first: Option<T>,
    rest: BroadcastStream<T>,
}

impl<T: Clone + Send + 'static> Stream for StateStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if let Some(first) = self.first.take() {
            return Poll::Ready(Some(first));
        }
        loop {
            match Pin::new(&mut self.rest).poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => return Poll::Ready(Some(value)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(n)))) => {
                    warn!("state observer lagged, skipped {n} transitions");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<T> Unpin for StateStream<T> {}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn late_subscriber_sees_latest_value() {
        let cell = StateCell::new(0u32, 8);
        cell.set(1);
        cell.set(2);

        let mut stream = cell.subscribe();
        assert_eq!(stream.next().await, Some(2));
    }

    #[tokio::test]
    async fn every_observer_sees_every_transition_in_order() {
        let cell = StateCell::new("a", 8);
        let mut first = cell.subscribe();
        let mut second = cell.subscribe();
        cell.set("b");
        cell.set("c");
        drop(cell);

        assert_eq!(first.by_ref().collect::<Vec<_>>().await, vec!["a", "b", "c"]);
        assert_eq!(second.collect::<Vec<_>>().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn lagging_observer_skips_ahead() {
        let cell = StateCell::new(0u32, 2);
        let stream = cell.subscribe();
        for i in 1..=5 {
            cell.set(i);
        }
        drop(cell);

        let seen: Vec<u32> = stream.collect().await;
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&5));
        assert!(seen.len() < 6);
    }

    #[test]
    fn set_if_refuses() {
        let cell = StateCell::new(1u32, 4);
        assert!(!cell.set_if(5, |old, new| new < old));
        assert_eq!(cell.get(), 1);
        assert!(cell.set_if(0, |old, new| new < old));
        assert_eq!(cell.get(), 0);
    }
}
