use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    set: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

/// Cooperative cancellation flag that can also be waited on.
///
/// [`StopSignal::wait`] is how the render loop idles between frames: it returns as
/// soon as the signal is triggered instead of sleeping out the full timeout.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            inner: Arc::new(Inner {
                set: AtomicBool::new(false),
                wake_tx,
                wake_rx,
            }),
        }
    }

    pub fn trigger(&self) {
        if !self.inner.set.swap(true, Ordering::AcqRel) {
            let _ = self.inner.wake_tx.try_send(());
        }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::Acquire)
    }

    /// Waits until the signal is triggered or `timeout` passed. Returns whether it is set.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_set() {
            return true;
        }
        match self.inner.wake_rx.recv_timeout(timeout) {
            Ok(()) => {
                // pass the wake-up on to other waiters
                let _ = self.inner.wake_tx.try_send(());
                true
            }
            Err(RecvTimeoutError::Timeout) => self.is_set(),
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
