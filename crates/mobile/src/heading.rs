use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::dvec3;
use shuttle_core::GeoPosition;
use shuttle_core::bearing::bearing;
use shuttle_core::orientation::{DEFAULT_SMOOTHING, OrientationFilter};

use crate::error::MarkerError;
use crate::marker::LatLng;

/// Compass bearing in degrees from `from` to `to`, or `None` if they coincide.
#[uniffi::export]
pub fn bearing_between(from: LatLng, to: LatLng) -> Result<Option<f64>, MarkerError> {
    let from: GeoPosition = from.try_into()?;
    let to: GeoPosition = to.try_into()?;

    Ok(bearing(&from, &to))
}

#[uniffi::export]
pub fn default_heading_smoothing() -> f64 {
    DEFAULT_SMOOTHING
}

/// Fuses raw accelerometer and magnetometer events into a device heading for
/// the "you are here" marker.
#[derive(uniffi::Object)]
pub struct HeadingSensor {
    filter: Mutex<OrientationFilter>,
}

impl HeadingSensor {
    fn filter(&self) -> MutexGuard<'_, OrientationFilter> {
        self.filter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl HeadingSensor {
    #[uniffi::constructor]
    pub fn new(smoothing: f64) -> Result<Arc<Self>, MarkerError> {
        Ok(Arc::new(Self {
            filter: Mutex::new(OrientationFilter::new(smoothing)?),
        }))
    }

    pub fn push_accelerometer(&self, x: f64, y: f64, z: f64) {
        self.filter().push_accelerometer(dvec3(x, y, z));
    }

    pub fn push_magnetometer(&self, x: f64, y: f64, z: f64) {
        self.filter().push_magnetometer(dvec3(x, y, z));
    }

    /// Degrees clockwise from magnetic north, once both sensors reported.
    pub fn azimuth_degrees(&self) -> Option<f64> {
        self.filter().azimuth_degrees()
    }

    pub fn reset(&self) {
        self.filter().reset();
    }
}
