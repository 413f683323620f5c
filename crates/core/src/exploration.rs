//! Pure functions translating raw telemetry (speed, visit counts) into
//! exploration semantics.
//!
//! ## Precision
//!
//! Distance and area here are **linear approximations**: visits × average cell
//! diameter, and unique cells × average cell area. They are not integrated
//! along the actual GPS path, so they'll over- or under-shoot depending on how
//! the user moved through each cell. That's an accepted trade-off, these
//! numbers are only used for display.

use crate::{
    geo::{GeoBounds, GeoPoint},
    util::unit::{Meter, Meter2},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Average cell "diameter" used to turn a visit count into a distance. This is
/// the calibration the exploration service has always used for resolution 9,
/// keep it in sync with the backend or stats will disagree.
pub const AVERAGE_CELL_DIAMETER: Meter = Meter(9.3);
/// Average cell area used to turn a unique cell count into an explored area.
/// Same calibration caveat as [AVERAGE_CELL_DIAMETER].
pub const AVERAGE_CELL_AREA: Meter2 = Meter2(259.0);

/// Upper bound of walking speed, in mph (inclusive)
pub const WALKING_MAX_SPEED: f64 = 3.0;
/// Upper bound of biking speed, in mph (inclusive)
pub const BIKING_MAX_SPEED: f64 = 15.0;

/// The region the service is initially deployed in (New York City). Samples
/// outside it are still valid, this is only used to flag them.
pub const DEPLOYMENT_REGION: GeoBounds =
    GeoBounds::new(40.4774, -74.2591, 40.9176, -73.7004);

/// How a user was moving when they explored a cell
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExplorationMethod {
    Walking,
    Biking,
    Driving,
}

/// Classify a movement speed (in mph). Each threshold is inclusive on the
/// slower classification, i.e. exactly 3 mph is walking and exactly 15 mph
/// is biking. Negative or NaN speeds (bad GPS fixes) count as walking.
pub fn classify_method(speed_mph: f64) -> ExplorationMethod {
    if speed_mph > BIKING_MAX_SPEED {
        ExplorationMethod::Driving
    } else if speed_mph > WALKING_MAX_SPEED {
        ExplorationMethod::Biking
    } else {
        ExplorationMethod::Walking
    }
}

/// Estimate distance travelled from a total visit count
pub fn estimate_distance(visit_count: u64) -> Meter {
    AVERAGE_CELL_DIAMETER * visit_count as f64
}

/// Estimate explored area from a count of unique cells
pub fn estimate_area(unique_cell_count: u64) -> Meter2 {
    AVERAGE_CELL_AREA * unique_cell_count as f64
}

/// Is this point inside [DEPLOYMENT_REGION]?
pub fn is_within_region(point: &GeoPoint) -> bool {
    DEPLOYMENT_REGION.contains(point)
}

/// Aggregate exploration stats for one user
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplorationStats {
    pub total_visits: u64,
    pub unique_cells: u64,
    pub estimated_distance: Meter,
    pub total_area: Meter2,
}

impl ExplorationStats {
    /// Derive all the estimates from the two raw counts
    pub fn from_counts(total_visits: u64, unique_cells: u64) -> Self {
        Self {
            total_visits,
            unique_cells,
            estimated_distance: estimate_distance(total_visits),
            total_area: estimate_area(unique_cells),
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.estimated_distance.to_km()
    }

    pub fn distance_miles(&self) -> f64 {
        self.estimated_distance.to_miles()
    }

    pub fn area_km2(&self) -> f64 {
        self.total_area.to_km2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_test::{assert_tokens, Token};
    use std::str::FromStr;

    #[test]
    fn test_classify_method() {
        use ExplorationMethod::*;
        for (speed, expected) in [
            (0.0, Walking),
            (2.0, Walking),
            (3.0, Walking),
            (5.0, Biking),
            (10.0, Biking),
            (15.0, Biking),
            (15.1, Driving),
            (20.0, Driving),
            (50.0, Driving),
            (-1.0, Walking),
            (f64::NAN, Walking),
        ] {
            assert_eq!(classify_method(speed), expected, "speed {}", speed);
        }
    }

    #[test]
    fn test_estimates() {
        assert_eq!(estimate_distance(0), Meter(0.0));
        assert_eq!(estimate_distance(1), AVERAGE_CELL_DIAMETER);
        assert_approx_eq!(estimate_distance(10).0, 93.0);
        assert_eq!(estimate_area(0), Meter2(0.0));
        assert_eq!(estimate_area(1), AVERAGE_CELL_AREA);
        assert_approx_eq!(estimate_area(10).0, 2590.0);
    }

    #[test]
    fn test_stats() {
        let stats = ExplorationStats::from_counts(1000, 100);
        assert_approx_eq!(stats.distance_km(), 9.3);
        assert_approx_eq!(stats.distance_miles(), 9300.0 * 0.000621371);
        assert_approx_eq!(stats.area_km2(), 0.0259);
    }

    #[test]
    fn test_region() {
        assert!(is_within_region(&GeoPoint::new(40.7589, -73.9851)));
        assert!(is_within_region(&GeoPoint::new(40.8296, -73.9262)));
        // LA and Chicago
        assert!(!is_within_region(&GeoPoint::new(34.0522, -118.2437)));
        assert!(!is_within_region(&GeoPoint::new(41.8781, -87.6298)));
    }

    #[test]
    fn test_method_string_forms() {
        assert_tokens(
            &ExplorationMethod::Biking,
            &[Token::UnitVariant {
                name: "ExplorationMethod",
                variant: "biking",
            }],
        );
        assert_eq!(
            ExplorationMethod::from_str("driving").unwrap(),
            ExplorationMethod::Driving
        );
        assert_eq!(ExplorationMethod::Walking.to_string(), "walking");
        assert!(ExplorationMethod::from_str("flying").is_err());
    }
}
