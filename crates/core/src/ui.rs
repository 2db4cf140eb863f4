use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::{CoreError, Result};

/// A dedicated thread driving a single-threaded runtime.
///
/// Tasks spawned on [`UiThread::handle`] never run concurrently with each
/// other, which makes it the execution context for anything that feeds the
/// renderer. Dropping the `UiThread` stops the runtime and every task on it.
pub struct UiThread {
    handle: Handle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn start(name: &str) -> Result<Self> {
        let (handle_tx, handle_rx) = mpsc::sync_channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_time().build() {
                    Ok(runtime) => runtime,
                    Err(error) => {
                        let _ = handle_tx.send(Err(error.to_string()));
                        return;
                    }
                };
                let _ = handle_tx.send(Ok(runtime.handle().clone()));

                runtime.block_on(async move {
                    let _ = shutdown_rx.await;
                });
            })
            .map_err(|e| CoreError::UiThread(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|e| CoreError::UiThread(e.to_string()))?
            .map_err(CoreError::UiThread)?;
        info!(name, "ui thread started");

        Ok(Self {
            handle,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let Some(thread) = self.thread.take() else {
            return;
        };
        // joining from the ui thread itself would deadlock
        if thread.thread().id() == thread::current().id() {
            return;
        }
        if thread.join().is_err() {
            warn!("ui thread panicked");
        }
    }
}
