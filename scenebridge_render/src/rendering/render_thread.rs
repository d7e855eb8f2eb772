use crate::cache::ResourceCaches;
use crate::handoff::SnapshotHandoff;
use crate::rendering::{RenderLoop, StopSignal};
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use scenebridge_utils::BridgeConfig;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A [`RenderLoop`] running on its own named thread.
#[derive(Debug)]
pub struct RenderThread {
    stop: StopSignal,
    stopped_rx: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    stop_wait: Duration,
}

impl RenderThread {
    pub fn spawn(
        config: BridgeConfig,
        caches: Arc<ResourceCaches>,
        handoff: Arc<SnapshotHandoff>,
    ) -> std::io::Result<Self> {
        let stop = StopSignal::new();
        let (stopped_tx, stopped_rx) = bounded(1);
        let stop_wait = config.stop_wait;

        let loop_stop = stop.clone();
        let thread = std::thread::Builder::new()
            .name("render".to_string())
            .spawn(move || {
                profiling::register_thread!("render");

                let mut render_loop = RenderLoop::new(config, caches, handoff);
                render_loop.run(&loop_stop);
                drop(render_loop);

                let _ = stopped_tx.send(());
                debug!("Render thread exited");
            })?;

        Ok(Self {
            stop,
            stopped_rx,
            thread: Some(thread),
            stop_wait,
        })
    }

    pub fn signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signals the loop to stop and waits up to `stop_wait` for it to confirm.
    ///
    /// Returns `false` if the loop didn't confirm in time. The thread is detached then.
    pub fn stop(&mut self) -> bool {
        let Some(thread) = self.thread.take() else {
            return true;
        };
        self.stop.trigger();

        match self.stopped_rx.recv_timeout(self.stop_wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    error!("Render thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Render thread did not stop within {:?}, detaching it",
                    self.stop_wait
                );
                false
            }
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}
