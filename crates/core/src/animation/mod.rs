//! Smooth marker movement between successive GPS fixes.
//!
//! Producers push raw fixes with [`PositionAnimationQueue::enqueue`] from any
//! thread. Fixes that moved less than the significance threshold are dropped,
//! the rest are queued and visited in arrival order by a single draining task
//! that runs on the UI runtime and feeds interpolated positions to a
//! [`PositionSink`].

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::error::{CoreError, Result};
use crate::position::GeoPosition;

pub use config::{AnimationConfig, BacklogPolicy};
pub use sink::{PositionSink, watch_sink};

pub mod config;
pub mod sink;

/// Outcome of a single [`PositionAnimationQueue::enqueue`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Enqueued {
    /// Too close to the reference point; nothing changed.
    Dropped { distance_meters: f64 },
    /// Appended behind targets that are still being animated.
    Queued { distance_meters: f64 },
    /// Appended to an idle queue; a new draining task was started.
    StartedDrain { distance_meters: f64 },
}

impl Enqueued {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Enqueued::Dropped { .. })
    }

    pub fn distance_meters(&self) -> f64 {
        match *self {
            Enqueued::Dropped { distance_meters }
            | Enqueued::Queued { distance_meters }
            | Enqueued::StartedDrain { distance_meters } => distance_meters,
        }
    }
}

struct QueueState {
    // Segment anchor. Only the draining task moves it, and only onto a target.
    current: GeoPosition,
    rendered: GeoPosition,
    pending: VecDeque<GeoPosition>,
    animating: bool,
    cancelled: bool,
    // Set once a draining task was dropped without finishing, i.e. the UI
    // runtime went away under it.
    ui_lost: bool,
    drain: Option<AbortHandle>,
    drain_epoch: u64,
    // Thread currently inside the sink, if any.
    delivering: Option<ThreadId>,
}

struct Shared {
    state: Mutex<QueueState>,
    delivered: Condvar,
    sink: Box<dyn PositionSink>,
    config: AnimationConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a frame to the sink unless the queue was cancelled. Returns
    /// whether it was delivered.
    fn emit(&self, position: GeoPosition) -> bool {
        {
            let mut state = self.lock();
            if state.cancelled {
                return false;
            }
            state.rendered = position;
            state.delivering = Some(thread::current().id());
        }

        self.sink.on_position(position);

        self.lock().delivering = None;
        self.delivered.notify_all();
        true
    }
}

/// Owned by the draining future. Dropping it before the queue ran dry means
/// the task was torn down with its runtime, so the queue can never drain
/// again.
struct DrainGuard {
    shared: Arc<Shared>,
    finished: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if state.delivering.is_some() {
            state.delivering = None;
            self.shared.delivered.notify_all();
        }
        if self.finished || state.cancelled {
            return;
        }

        state.animating = false;
        state.drain = None;
        state.ui_lost = true;
        warn!(
            pending = state.pending.len(),
            "draining task dropped before finishing, ui runtime is gone"
        );
    }
}

/// Animation queue bound to a single marker.
///
/// Dropping the queue aborts any animation in flight.
pub struct PositionAnimationQueue {
    shared: Arc<Shared>,
    ui: Handle,
}

impl PositionAnimationQueue {
    pub fn new<S: PositionSink>(
        start: GeoPosition,
        sink: S,
        config: AnimationConfig,
        ui: Handle,
    ) -> Result<Self> {
        Self::with_sink(start, Box::new(sink), config, ui)
    }

    pub fn with_sink(
        start: GeoPosition,
        sink: Box<dyn PositionSink>,
        config: AnimationConfig,
        ui: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let state = QueueState {
            current: start,
            rendered: start,
            pending: VecDeque::new(),
            animating: false,
            cancelled: false,
            ui_lost: false,
            drain: None,
            drain_epoch: 0,
            delivering: None,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                delivered: Condvar::new(),
                sink,
                config,
            }),
            ui,
        })
    }

    /// Offer a new fix.
    ///
    /// The fix is accepted only if it lies more than `threshold_meters` from
    /// the last pending target, or from the current anchor when nothing is
    /// pending. Accepting into an idle queue starts the draining task; the
    /// check and the start happen under one lock so two producers can never
    /// both start one.
    ///
    /// Fails with [`CoreError::UiThread`] once the UI runtime has shut down.
    pub fn enqueue(&self, position: GeoPosition, threshold_meters: f64) -> Result<Enqueued> {
        if !threshold_meters.is_finite() || threshold_meters < 0.0 {
            return Err(CoreError::InvalidThreshold(threshold_meters));
        }

        let mut state = self.shared.lock();
        if state.cancelled {
            return Err(CoreError::Cancelled);
        }
        if state.ui_lost {
            return Err(ui_lost());
        }

        let reference = state.pending.back().copied().unwrap_or(state.current);
        let distance_meters = reference.distance_to(&position);

        if distance_meters <= threshold_meters {
            trace!(%position, distance_meters, "dropping insignificant fix");
            return Ok(Enqueued::Dropped { distance_meters });
        }

        if self.shared.config.backlog == BacklogPolicy::KeepLatest && !state.pending.is_empty() {
            debug!(skipped = state.pending.len(), "coalescing pending targets");
            state.pending.clear();
        }
        state.pending.push_back(position);

        if state.animating {
            debug!(%position, pending = state.pending.len(), "queued fix");
            return Ok(Enqueued::Queued { distance_meters });
        }

        state.animating = true;
        state.drain_epoch += 1;
        let epoch = state.drain_epoch;
        // A runtime that already shut down drops the future inside `spawn`,
        // and the guard it owns needs the lock.
        drop(state);

        let task = self.ui.spawn(drain(Arc::clone(&self.shared)));

        let mut state = self.shared.lock();
        if state.ui_lost {
            return Err(ui_lost());
        }
        if state.cancelled {
            drop(state);
            task.abort();
        } else if state.animating && state.drain_epoch == epoch {
            state.drain = Some(task.abort_handle());
        }
        debug!(%position, distance_meters, "starting drain");

        Ok(Enqueued::StartedDrain { distance_meters })
    }

    /// Position the marker last reached exactly.
    pub fn current_position(&self) -> GeoPosition {
        self.shared.lock().current
    }

    /// Last position handed to the sink, including intermediate frames.
    pub fn rendered_position(&self) -> GeoPosition {
        self.shared.lock().rendered
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn is_animating(&self) -> bool {
        self.shared.lock().animating
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.shared.config
    }

    /// Abandon all remaining work. Once this returns the sink receives
    /// nothing further, and later calls to `enqueue` fail with
    /// [`CoreError::Cancelled`].
    ///
    /// A frame already inside the sink on another thread is waited for.
    /// Calling this from within the sink does not wait.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        if !state.cancelled {
            state.cancelled = true;
            state.animating = false;
            state.pending.clear();
            debug!("animation queue cancelled");
        }

        let me = thread::current().id();
        while state.delivering.is_some_and(|id| id != me) {
            state = self
                .shared
                .delivered
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let task = state.drain.take();
        drop(state);
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for PositionAnimationQueue {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn ui_lost() -> CoreError {
    CoreError::UiThread("ui runtime shut down".to_owned())
}

async fn drain(shared: Arc<Shared>) {
    let mut guard = DrainGuard {
        shared,
        finished: false,
    };

    loop {
        let (from, target) = {
            let mut state = guard.shared.lock();
            if state.cancelled {
                return;
            }
            match state.pending.pop_front() {
                Some(target) => (state.current, target),
                None => {
                    state.animating = false;
                    state.drain = None;
                    guard.finished = true;
                    trace!("queue drained");
                    return;
                }
            }
        };

        if !animate_segment(&guard.shared, from, target).await {
            return;
        }

        let mut state = guard.shared.lock();
        if state.cancelled {
            return;
        }
        state.current = target;
    }
}

/// Returns false if the queue was cancelled part way.
async fn animate_segment(shared: &Shared, from: GeoPosition, to: GeoPosition) -> bool {
    let duration = shared.config.duration;
    let step = shared.config.frame_interval;
    let start = Instant::now();
    let deadline = start + duration;

    loop {
        time::sleep_until((Instant::now() + step).min(deadline)).await;

        let elapsed = start.elapsed();
        if elapsed >= duration {
            break;
        }

        let fraction = elapsed.as_secs_f64() / duration.as_secs_f64();
        if !shared.emit(from.lerp(&to, fraction)) {
            return false;
        }
    }

    // Snap so float error never leaves the marker short of the fix.
    shared.emit(to)
}
