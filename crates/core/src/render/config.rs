use crate::render::unit::Color4;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Configuration specific to drawing the fog overlay. These options have no
/// bearing on which cells are explored, only on how the overlay looks and
/// animates.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RenderConfig {
    /// How long the map has to sit still after a pan/zoom ends before the
    /// holes start fading back in, in milliseconds. Another movement within
    /// this window cancels the fade entirely.
    pub settle_delay_ms: u64,

    /// Length of the fade-in of the holes once the map settles, in
    /// milliseconds. Opacity follows an ease-out cubic curve over this
    /// duration.
    #[validate(range(min = 1))]
    pub fade_duration_ms: u64,

    /// Fraction of the viewport span to add on every side when querying for
    /// visible cells, so cells straddling the edge of the screen still get
    /// drawn. 0.1 means 10% of the width/height is added to each side.
    #[validate(range(min = 0.0, max = 1.0))]
    pub view_padding: f64,

    /// Fog color while the map is moving. No holes are drawn during movement,
    /// so this is slightly lighter to signal that the view is in flux.
    #[validate]
    pub moving_fog: Color4,

    /// Fog color once the map has settled
    #[validate]
    pub settled_fog: Color4,
}

impl RenderConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 200,
            fade_duration_ms: 800,
            view_padding: 0.1,
            moving_fog: Color4::new_int(120, 120, 120, 0.9),
            settled_fog: Color4::new_int(100, 100, 100, 0.85),
        }
    }
}
