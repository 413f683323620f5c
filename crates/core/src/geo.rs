//! Plain geographic value types. All coordinates are in degrees.

use crate::util::range::NumRange;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Valid latitude values, in degrees
pub const LATITUDE_RANGE: NumRange<f64> = NumRange::new(-90.0, 90.0);
/// Valid longitude values, in degrees
pub const LONGITUDE_RANGE: NumRange<f64> = NumRange::new(-180.0, 180.0);

/// A single point on the globe. Construction is unchecked, so a point can hold
/// out-of-range values. Anything that needs a valid point (e.g.
/// [HexGrid::coord_to_cell](crate::HexGrid::coord_to_cell)) checks
/// [GeoPoint::is_valid] itself.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "({}, {})", latitude, longitude)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// (0, 0). Returned as a sentinel by geometry queries on invalid cells.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Are both components in their valid ranges?
    pub fn is_valid(&self) -> bool {
        LATITUDE_RANGE.contains(self.latitude)
            && LONGITUDE_RANGE.contains(self.longitude)
    }

    /// Are both components finite? Weaker than [Self::is_valid], used for
    /// polygon vertices where we only care that math on them won't blow up.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// An axis-aligned lat/lng rectangle. Bounds are closed on all sides. Boxes
/// that cross the antimeridian aren't supported, `west` is always expected to
/// be <= `east`.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "[{}, {}] x [{}, {}]", south, north, west, east)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Compute the envelope of a set of points. Returns `None` if there are no
    /// points, or any of them has a non-finite component.
    pub fn from_points<'a>(
        points: impl IntoIterator<Item = &'a GeoPoint>,
    ) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for point in points {
            if !point.is_finite() {
                return None;
            }
            let (lat, lng) = (point.latitude, point.longitude);
            bounds = Some(match bounds {
                None => Self::new(lat, lng, lat, lng),
                Some(b) => Self::new(
                    b.south.min(lat),
                    b.west.min(lng),
                    b.north.max(lat),
                    b.east.max(lng),
                ),
            });
        }
        bounds
    }

    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.west)
    }

    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.east)
    }

    /// A box is valid if both corners are valid points, and it isn't inverted.
    /// Zero-width boxes (e.g. the envelope of a single point) are valid.
    pub fn is_valid(&self) -> bool {
        self.south_west().is_valid()
            && self.north_east().is_valid()
            && self.south <= self.north
            && self.west <= self.east
    }

    /// Does this box overlap the other one? Boxes that only touch along an
    /// edge or corner count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }

    /// Is the point inside this box (edges included)?
    pub fn contains(&self, point: &GeoPoint) -> bool {
        NumRange::new(self.south, self.north).contains(point.latitude)
            && NumRange::new(self.west, self.east).contains(point.longitude)
    }

    /// Grow the box on every side by `ratio` times its span along that axis.
    /// E.g. a ratio of 0.1 on a box 1° tall adds 0.1° above and 0.1° below.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = (self.north - self.south).abs() * ratio;
        let lng_buffer = (self.east - self.west).abs() * ratio;
        Self::new(
            self.south - lat_buffer,
            self.west - lng_buffer,
            self.north + lat_buffer,
            self.east + lng_buffer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_point_validity() {
        assert!(GeoPoint::new(40.7589, -73.9851).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_from_points() {
        let points = [
            GeoPoint::new(40.0, -74.0),
            GeoPoint::new(41.0, -73.5),
            GeoPoint::new(40.5, -74.2),
        ];
        assert_eq!(
            GeoBounds::from_points(&points),
            Some(GeoBounds::new(40.0, -74.2, 41.0, -73.5))
        );
        assert_eq!(GeoBounds::from_points(&[] as &[GeoPoint]), None);
        assert_eq!(
            GeoBounds::from_points(&[
                GeoPoint::new(40.0, -74.0),
                GeoPoint::new(f64::INFINITY, -74.0)
            ]),
            None
        );
    }

    #[test]
    fn test_intersects() {
        let view = GeoBounds::new(40.0, -74.0, 41.0, -73.0);
        assert!(view.intersects(&GeoBounds::new(40.5, -73.5, 40.6, -73.4)));
        assert!(view.intersects(&GeoBounds::new(39.0, -75.0, 42.0, -72.0)));
        // Touching on an edge counts
        assert!(view.intersects(&GeoBounds::new(41.0, -73.5, 41.5, -73.4)));
        assert!(!view.intersects(&GeoBounds::new(41.1, -73.5, 41.5, -73.4)));
        assert!(!view.intersects(&GeoBounds::new(40.5, -72.9, 40.6, -72.0)));
    }

    #[test]
    fn test_pad() {
        let padded = GeoBounds::new(40.0, -74.0, 41.0, -72.0).pad(0.1);
        assert_approx_eq!(padded.south, 39.9);
        assert_approx_eq!(padded.north, 41.1);
        assert_approx_eq!(padded.west, -74.2);
        assert_approx_eq!(padded.east, -71.8);
    }

    #[test]
    fn test_bounds_validity() {
        assert!(GeoBounds::new(40.0, -74.0, 41.0, -73.0).is_valid());
        assert!(GeoBounds::new(40.0, -74.0, 40.0, -74.0).is_valid());
        assert!(!GeoBounds::new(41.0, -74.0, 40.0, -73.0).is_valid());
        assert!(!GeoBounds::new(91.0, 181.0, 92.0, 182.0).is_valid());
    }
}
