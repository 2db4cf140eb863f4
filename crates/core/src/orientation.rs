//! Device heading from accelerometer + magnetometer fusion.
//!
//! Vectors are in the device frame (x to the right of the screen, y towards
//! its top, z out of the screen). The rotation matrix maps device coordinates
//! into the world frame with rows East, North, Up.

use glam::{DMat3, DVec3};

use crate::bearing::normalize_degrees;
use crate::error::{CoreError, Result};

/// Below this the magnetic field is treated as (anti)parallel to gravity.
const MIN_HORIZONTAL_FIELD: f64 = 0.1;
const MIN_GRAVITY: f64 = 1e-3;

pub const DEFAULT_SMOOTHING: f64 = 0.97;

/// World-from-device rotation, or `None` when the device is in free fall or
/// the readings don't pin down a horizontal direction.
pub fn rotation_matrix(gravity: DVec3, geomagnetic: DVec3) -> Option<DMat3> {
    if gravity.length() < MIN_GRAVITY {
        return None;
    }

    let east = geomagnetic.cross(gravity);
    if east.length() < MIN_HORIZONTAL_FIELD {
        return None;
    }

    let east = east.normalize();
    let up = gravity.normalize();
    let north = up.cross(east);

    Some(DMat3::from_cols(east, north, up).transpose())
}

/// Euler angles in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    /// Rotation around -z; 0 when the top of the device faces magnetic north.
    pub azimuth: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub fn from_rotation(rotation: &DMat3) -> Self {
        let east = rotation.row(0);
        let north = rotation.row(1);
        let up = rotation.row(2);

        Self {
            azimuth: east.y.atan2(north.y),
            pitch: (-up.y).clamp(-1.0, 1.0).asin(),
            roll: (-up.x).atan2(up.z),
        }
    }

    pub fn azimuth_degrees(&self) -> f64 {
        normalize_degrees(self.azimuth.to_degrees())
    }
}

/// Low-pass filtered sensor fusion.
///
/// `smoothing` is the weight kept from history on each sample; 0 disables
/// filtering.
#[derive(Clone, Debug)]
pub struct OrientationFilter {
    smoothing: f64,
    gravity: Option<DVec3>,
    geomagnetic: Option<DVec3>,
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            gravity: None,
            geomagnetic: None,
        }
    }
}

impl OrientationFilter {
    pub fn new(smoothing: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&smoothing) {
            return Err(CoreError::InvalidConfig(format!(
                "orientation smoothing must be in [0, 1), got {smoothing}"
            )));
        }

        Ok(Self {
            smoothing,
            ..Default::default()
        })
    }

    pub fn push_accelerometer(&mut self, sample: DVec3) {
        if sample.is_finite() {
            self.gravity = Some(low_pass(self.gravity, sample, self.smoothing));
        }
    }

    pub fn push_magnetometer(&mut self, sample: DVec3) {
        if sample.is_finite() {
            self.geomagnetic = Some(low_pass(self.geomagnetic, sample, self.smoothing));
        }
    }

    pub fn orientation(&self) -> Option<Orientation> {
        let rotation = rotation_matrix(self.gravity?, self.geomagnetic?)?;
        Some(Orientation::from_rotation(&rotation))
    }

    /// Heading in degrees within `[0, 360)` once both sensors have reported.
    pub fn azimuth_degrees(&self) -> Option<f64> {
        self.orientation().map(|o| o.azimuth_degrees())
    }

    pub fn reset(&mut self) {
        self.gravity = None;
        self.geomagnetic = None;
    }
}

fn low_pass(previous: Option<DVec3>, sample: DVec3, smoothing: f64) -> DVec3 {
    match previous {
        Some(previous) => previous * smoothing + sample * (1.0 - smoothing),
        None => sample,
    }
}
