use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shuttle_core::GeoPosition;
use shuttle_core::animation::{AnimationConfig, BacklogPolicy, PositionAnimationQueue};
use shuttle_core::bearing::HeadingTracker;
use shuttle_core::fleet::DEFAULT_SIGNIFICANCE_THRESHOLD_METERS;

use crate::error::MarkerError;
use crate::runtime::ui_handle;

#[derive(uniffi::Record, Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl TryFrom<LatLng> for GeoPosition {
    type Error = MarkerError;

    fn try_from(value: LatLng) -> Result<Self, MarkerError> {
        Ok(GeoPosition::new(value.latitude, value.longitude)?)
    }
}

impl From<GeoPosition> for LatLng {
    fn from(position: GeoPosition) -> Self {
        Self {
            latitude: position.latitude(),
            longitude: position.longitude(),
        }
    }
}

#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BacklogMode {
    Fifo,
    KeepLatest,
}

impl From<BacklogMode> for BacklogPolicy {
    fn from(mode: BacklogMode) -> Self {
        match mode {
            BacklogMode::Fifo => BacklogPolicy::Fifo,
            BacklogMode::KeepLatest => BacklogPolicy::KeepLatest,
        }
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct MarkerOptions {
    pub duration_ms: u64,
    pub frame_interval_ms: u64,
    pub threshold_meters: f64,
    pub backlog: BacklogMode,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        let animation = AnimationConfig::default();

        Self {
            duration_ms: animation.duration.as_millis() as u64,
            frame_interval_ms: animation.frame_interval.as_millis() as u64,
            threshold_meters: DEFAULT_SIGNIFICANCE_THRESHOLD_METERS,
            backlog: BacklogMode::Fifo,
        }
    }
}

impl MarkerOptions {
    pub(crate) fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            duration: Duration::from_millis(self.duration_ms),
            frame_interval: Duration::from_millis(self.frame_interval_ms),
            backlog: self.backlog.into(),
        }
    }
}

#[uniffi::export]
pub fn default_marker_options() -> MarkerOptions {
    MarkerOptions::default()
}

/// Implemented on the Kotlin/Swift side; typically posts to the main looper
/// and updates the map marker state.
#[uniffi::export(with_foreign)]
pub trait MarkerListener: Send + Sync {
    fn on_position(&self, position: LatLng);
}

/// Animated marker for a single bus.
#[derive(uniffi::Object)]
pub struct MarkerAnimator {
    queue: PositionAnimationQueue,
    heading: Mutex<HeadingTracker>,
    threshold_meters: f64,
}

impl MarkerAnimator {
    fn heading(&self) -> MutexGuard<'_, HeadingTracker> {
        self.heading.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl MarkerAnimator {
    #[uniffi::constructor]
    pub fn new(
        start: LatLng,
        options: MarkerOptions,
        listener: Arc<dyn MarkerListener>,
    ) -> Result<Arc<Self>, MarkerError> {
        let threshold_meters = options.threshold_meters;
        if !threshold_meters.is_finite() || threshold_meters < 0.0 {
            return Err(MarkerError::InvalidInput(format!(
                "invalid significance threshold: {threshold_meters} m"
            )));
        }

        let start: GeoPosition = start.try_into()?;
        let mut heading = HeadingTracker::new(threshold_meters);
        heading.update(start);

        let sink = move |position: GeoPosition| listener.on_position(position.into());
        let queue =
            PositionAnimationQueue::new(start, sink, options.animation_config(), ui_handle()?)?;

        Ok(Arc::new(Self {
            queue,
            heading: Mutex::new(heading),
            threshold_meters,
        }))
    }

    /// Offer a live-location fix. Returns whether it was significant enough
    /// to be animated to.
    pub fn enqueue(&self, position: LatLng) -> Result<bool, MarkerError> {
        let position: GeoPosition = position.try_into()?;
        let outcome = self.queue.enqueue(position, self.threshold_meters)?;
        if outcome.is_accepted() {
            self.heading().update(position);
        }

        Ok(outcome.is_accepted())
    }

    /// Direction of travel for rotating the bus icon, in degrees clockwise
    /// from north. `None` until the bus has moved.
    pub fn heading_degrees(&self) -> Option<f64> {
        self.heading().heading()
    }

    pub fn current_position(&self) -> LatLng {
        self.queue.current_position().into()
    }

    pub fn rendered_position(&self) -> LatLng {
        self.queue.rendered_position().into()
    }

    pub fn pending_count(&self) -> u32 {
        u32::try_from(self.queue.pending_len()).unwrap_or(u32::MAX)
    }

    pub fn is_animating(&self) -> bool {
        self.queue.is_animating()
    }

    /// Call when the marker leaves the map.
    pub fn cancel(&self) {
        self.queue.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<LatLng>>);

    impl MarkerListener for Recorder {
        fn on_position(&self, position: LatLng) {
            self.0.lock().unwrap().push(position);
        }
    }

    fn fast_options() -> MarkerOptions {
        MarkerOptions {
            duration_ms: 40,
            frame_interval_ms: 5,
            ..Default::default()
        }
    }

    fn wait_idle(animator: &MarkerAnimator) {
        for _ in 0..500 {
            if !animator.is_animating() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("animation never finished");
    }

    #[test]
    fn test_default_options() {
        let options = default_marker_options();

        assert_eq!(options.duration_ms, 600);
        assert_eq!(options.frame_interval_ms, 16);
        assert_eq!(options.threshold_meters, 5.0);
        assert_eq!(options.backlog, BacklogMode::Fifo);
    }

    #[test]
    fn test_animator_reports_to_listener() {
        let recorder = Arc::new(Recorder::default());
        let start = LatLng {
            latitude: 23.8103,
            longitude: 90.4125,
        };
        let target = LatLng {
            latitude: 23.8200,
            longitude: 90.4125,
        };
        let animator = MarkerAnimator::new(start, fast_options(), recorder.clone()).unwrap();

        assert!(!animator.enqueue(start).unwrap());
        assert!(animator.enqueue(target).unwrap());
        wait_idle(&animator);

        assert_eq!(animator.current_position(), target);
        assert_eq!(animator.pending_count(), 0);
        assert_eq!(recorder.0.lock().unwrap().last(), Some(&target));
    }

    #[test]
    fn test_heading_follows_accepted_fixes() {
        let recorder = Arc::new(Recorder::default());
        let start = LatLng {
            latitude: 23.8103,
            longitude: 90.4125,
        };
        let animator = MarkerAnimator::new(start, fast_options(), recorder).unwrap();
        assert_eq!(animator.heading_degrees(), None);

        // ~1 m east, below the threshold
        let jitter = LatLng {
            latitude: 23.8103,
            longitude: 90.41251,
        };
        assert!(!animator.enqueue(jitter).unwrap());
        assert_eq!(animator.heading_degrees(), None);

        let east = LatLng {
            latitude: 23.8103,
            longitude: 90.4200,
        };
        assert!(animator.enqueue(east).unwrap());
        let degrees = animator.heading_degrees().unwrap();
        assert!((degrees - 90.0).abs() < 0.01, "heading was {degrees}");

        let north = LatLng {
            latitude: 23.8200,
            longitude: 90.4200,
        };
        assert!(animator.enqueue(north).unwrap());
        let degrees = animator.heading_degrees().unwrap();
        assert!(degrees < 0.01 || degrees > 359.99, "heading was {degrees}");
        wait_idle(&animator);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let recorder = Arc::new(Recorder::default());
        let start = LatLng {
            latitude: 23.8103,
            longitude: 90.4125,
        };

        let bad_start = LatLng {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert!(matches!(
            MarkerAnimator::new(bad_start, fast_options(), recorder.clone()),
            Err(MarkerError::InvalidInput(_))
        ));

        let bad_threshold = MarkerOptions {
            threshold_meters: -1.0,
            ..fast_options()
        };
        assert!(MarkerAnimator::new(start, bad_threshold, recorder.clone()).is_err());

        let animator = MarkerAnimator::new(start, fast_options(), recorder).unwrap();
        let off_planet = LatLng {
            latitude: 120.0,
            longitude: 0.0,
        };
        assert!(matches!(
            animator.enqueue(off_planet),
            Err(MarkerError::InvalidInput(_))
        ));
        assert_eq!(animator.pending_count(), 0);
    }

    #[test]
    fn test_cancelled_animator_refuses_fixes() {
        let recorder = Arc::new(Recorder::default());
        let start = LatLng {
            latitude: 23.8103,
            longitude: 90.4125,
        };
        let animator = MarkerAnimator::new(start, fast_options(), recorder).unwrap();

        animator.cancel();
        let target = LatLng {
            latitude: 23.8200,
            longitude: 90.4125,
        };
        assert!(matches!(
            animator.enqueue(target),
            Err(MarkerError::Unavailable(_))
        ));
    }
}
