use derive_more::{
    Add, AddAssign, Display, Div, DivAssign, From, Into, Mul, MulAssign, Sub,
    SubAssign, Sum,
};
use serde::{Deserialize, Serialize};

/// Meters per kilometer
const METERS_PER_KM: f64 = 1000.0;
/// Miles per meter
const MILES_PER_METER: f64 = 0.000621371;
/// Square meters per square kilometer
const SQ_METERS_PER_SQ_KM: f64 = 1_000_000.0;

/// Unit used for estimated travel distance
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    PartialOrd,
    From,
    Into,
    Add,
    Sub,
    Mul,
    Div,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Sum,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{} m", "self.0")]
pub struct Meter(pub f64);

impl Meter {
    /// Convert to kilometers
    pub fn to_km(self) -> f64 {
        self.0 / METERS_PER_KM
    }

    /// Convert to statute miles
    pub fn to_miles(self) -> f64 {
        self.0 * MILES_PER_METER
    }
}

/// Unit used for explored area
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    PartialOrd,
    From,
    Into,
    Add,
    Sub,
    Mul,
    Div,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Sum,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{} m²", "self.0")]
pub struct Meter2(pub f64);

impl Meter2 {
    /// Convert to square kilometers
    pub fn to_km2(self) -> f64 {
        self.0 / SQ_METERS_PER_SQ_KM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_conversions() {
        assert_approx_eq!(Meter(1500.0).to_km(), 1.5);
        assert_approx_eq!(Meter(1000.0).to_miles(), 0.621371);
        assert_approx_eq!(Meter2(2_590_000.0).to_km2(), 2.59);
        assert_eq!(Meter(9.3) * 2.0, Meter(18.6));
    }
}
