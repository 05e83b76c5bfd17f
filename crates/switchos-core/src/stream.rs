// ── Reactive state stream ──
//
// Subscription type for consumers that prefer awaiting changes over
// registering an observer callback.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::state::CoordinatorState;

/// A subscription to a coordinator's state.
///
/// Yields once per completed refresh cycle. A slow reader skips
/// intermediate states and only ever sees the newest one.
pub struct StateStream {
    current: Arc<CoordinatorState>,
    receiver: watch::Receiver<Arc<CoordinatorState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<CoordinatorState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// State captured at creation time, or at the last `changed()`.
    pub fn current(&self) -> &Arc<CoordinatorState> {
        &self.current
    }

    /// Latest state (may have changed since creation).
    pub fn latest(&self) -> Arc<CoordinatorState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next refresh cycle to complete.
    /// Returns `None` once the coordinator has been torn down.
    pub async fn changed(&mut self) -> Option<Arc<CoordinatorState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = state.clone();
        Some(state)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current state first.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StateWatchStream {
    inner: WatchStream<Arc<CoordinatorState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<CoordinatorState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
