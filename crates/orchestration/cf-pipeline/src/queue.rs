//! A receiver shared by a pool of workers.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Many-consumer wrapper around a bounded [`mpsc::Receiver`].
///
/// Each item goes to exactly one worker. `recv` is cancel safe, so it can be
/// raced against a cancellation token inside `tokio::select!`.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedReceiver<T> {
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Receive the next item, or `None` once every sender is gone and the
    /// queue is drained.
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}
