//! WGS84 coordinate value type shared by the animation queue, bearing and
//! fleet modules.

use std::fmt;

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A latitude/longitude pair in degrees.
///
/// Always finite and within the WGS84 ranges; construction goes through
/// [`GeoPosition::new`] so nothing downstream has to re-check for NaN.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPosition {
    latitude: f64,
    longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let in_range = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !in_range {
            return Err(CoreError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Linear interpolation in degree space.
    ///
    /// Not geodesically exact, which is fine at city scale. `fraction` is
    /// clamped to `[0, 1]` and `1` yields `other` bit for bit.
    pub fn lerp(&self, other: &GeoPosition, fraction: f64) -> GeoPosition {
        if fraction >= 1.0 {
            return *other;
        }
        let fraction = fraction.max(0.0);

        GeoPosition {
            latitude: self.latitude + (other.latitude - self.latitude) * fraction,
            longitude: self.longitude + (other.longitude - self.longitude) * fraction,
        }
    }
}

impl TryFrom<RawPosition> for GeoPosition {
    type Error = CoreError;

    fn try_from(raw: RawPosition) -> Result<Self> {
        GeoPosition::new(raw.latitude, raw.longitude)
    }
}

impl TryFrom<Point> for GeoPosition {
    type Error = CoreError;

    fn try_from(point: Point) -> Result<Self> {
        GeoPosition::new(point.y(), point.x())
    }
}

impl From<GeoPosition> for Point {
    fn from(position: GeoPosition) -> Self {
        position.to_point()
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn dhaka() -> GeoPosition {
        GeoPosition::new(23.8103, 90.4125).unwrap()
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        assert!(GeoPosition::new(f64::NAN, 90.0).is_err());
        assert!(GeoPosition::new(23.0, f64::INFINITY).is_err());
        assert!(GeoPosition::new(91.0, 0.0).is_err());
        assert!(GeoPosition::new(0.0, -180.5).is_err());
        assert!(GeoPosition::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_distance_along_meridian() {
        let start = dhaka();
        let north = GeoPosition::new(23.8200, 90.4125).unwrap();

        let distance = start.distance_to(&north);
        assert!((distance - 1078.0).abs() < 5.0, "got {distance}");
        assert_eq!(start.distance_to(&start), 0.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        let start = dhaka();
        let end = GeoPosition::new(23.8200, 90.4300).unwrap();

        assert_eq!(start.lerp(&end, 0.0), start);
        assert_eq!(start.lerp(&end, 1.0), end);
        assert_eq!(start.lerp(&end, 1.5), end);
        assert_eq!(start.lerp(&end, -0.5), start);

        let mid = start.lerp(&end, 0.5);
        assert_relative_eq!(mid.latitude(), 23.81515, epsilon = 1e-9);
        assert_relative_eq!(mid.longitude(), 90.42125, epsilon = 1e-9);
    }

    #[test]
    fn test_point_conversion() {
        let position = dhaka();
        let point: Point = position.into();

        assert_eq!(point.x(), 90.4125);
        assert_eq!(point.y(), 23.8103);
        assert_eq!(GeoPosition::try_from(point).unwrap(), position);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPosition =
            serde_json::from_str(r#"{"latitude": 23.8103, "longitude": 90.4125}"#).unwrap();
        assert_eq!(ok, dhaka());

        let bad = serde_json::from_str::<GeoPosition>(r#"{"latitude": 123.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }
}
