//! Compass headings for rotating bus icons toward their direction of travel.

use geo::{Bearing, Haversine};

use crate::position::GeoPosition;

/// Initial great-circle bearing from `from` to `to`, in degrees clockwise from
/// north within `[0, 360)`. `None` when the two positions coincide.
pub fn bearing(from: &GeoPosition, to: &GeoPosition) -> Option<f64> {
    if from == to {
        return None;
    }

    let degrees = Haversine.bearing(from.to_point(), to.to_point());
    Some(normalize_degrees(degrees))
}

pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]` degrees.
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_degrees(to - from);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Keeps a marker heading that only changes once the subject has actually
/// moved, so a parked bus doesn't spin on GPS jitter.
#[derive(Clone, Debug)]
pub struct HeadingTracker {
    min_distance_meters: f64,
    anchor: Option<GeoPosition>,
    heading: Option<f64>,
}

impl HeadingTracker {
    pub fn new(min_distance_meters: f64) -> Self {
        Self {
            min_distance_meters: min_distance_meters.max(0.0),
            anchor: None,
            heading: None,
        }
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    /// Feed a new fix and return the (possibly unchanged) heading.
    pub fn update(&mut self, position: GeoPosition) -> Option<f64> {
        let Some(anchor) = self.anchor else {
            self.anchor = Some(position);
            return self.heading;
        };

        if anchor.distance_to(&position) > self.min_distance_meters {
            if let Some(degrees) = bearing(&anchor, &position) {
                self.heading = Some(degrees);
            }
            self.anchor = Some(position);
        }

        self.heading
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn position(latitude: f64, longitude: f64) -> GeoPosition {
        GeoPosition::new(latitude, longitude).unwrap()
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = position(23.8103, 90.4125);

        let north = bearing(&origin, &position(23.8200, 90.4125)).unwrap();
        let east = bearing(&origin, &position(23.8103, 90.4200)).unwrap();
        let south = bearing(&origin, &position(23.8000, 90.4125)).unwrap();
        let west = bearing(&origin, &position(23.8103, 90.4000)).unwrap();

        assert!(north < 1e-6 || north > 360.0 - 1e-6, "north was {north}");
        assert_abs_diff_eq!(east, 90.0, epsilon = 0.01);
        assert_abs_diff_eq!(south, 180.0, epsilon = 1e-6);
        assert_abs_diff_eq!(west, 270.0, epsilon = 0.01);
    }

    #[test]
    fn test_coincident_points_have_no_bearing() {
        let origin = position(23.8103, 90.4125);
        assert_eq!(bearing(&origin, &origin), None);
    }

    #[test]
    fn test_angle_delta_takes_short_way() {
        assert_abs_diff_eq!(angle_delta(350.0, 10.0), 20.0);
        assert_abs_diff_eq!(angle_delta(10.0, 350.0), -20.0);
        assert_abs_diff_eq!(angle_delta(0.0, 180.0), 180.0);
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0);
    }

    #[test]
    fn test_heading_tracker_ignores_jitter() {
        let mut tracker = HeadingTracker::new(5.0);

        assert_eq!(tracker.update(position(23.8103, 90.4125)), None);
        // ~1 m east: too small to establish a heading
        assert_eq!(tracker.update(position(23.8103, 90.41251)), None);

        let heading = tracker.update(position(23.8200, 90.4125)).unwrap();
        assert!(heading < 1.0 || heading > 359.0, "heading was {heading}");

        // jitter around the new anchor keeps the old heading
        assert_eq!(tracker.update(position(23.82001, 90.41251)), Some(heading));
    }
}
