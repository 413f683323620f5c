use crate::{hex::HexGrid, lod::LodConfig, render::config::RenderConfig};
use anyhow::Context;
use h3o::Resolution;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Every deploy-time knob for the fog, in one place. The defaults match what
/// the exploration service records cells at, so they should rarely need to
/// change.
///
/// All fields have defaults, so a config file only needs to list the fields
/// it wants to override.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FogConfig {
    /// Grid resolution that explored cells are recorded at. This **must**
    /// match the resolution the backend uses, otherwise cell IDs in
    /// snapshots won't line up with cells computed locally.
    #[validate(range(min = 0, max = 15))]
    pub resolution: u8,

    /// Number of sample divisions (per axis) for bounding box queries. Higher
    /// values miss fewer cell slivers but cost quadratically more.
    #[validate(range(min = 1, max = 1000))]
    pub bbox_samples: u32,

    /// Number of sample divisions (per axis) for viewport queries
    #[validate(range(min = 1, max = 1000))]
    pub viewport_samples: u32,

    /// Config for level-of-detail decisions
    #[validate]
    pub lod: LodConfig,

    /// Config for drawing and animating the overlay
    #[validate]
    pub render: RenderConfig,
}

impl FogConfig {
    /// Build a grid adapter from this config. Returns an error if the config
    /// is invalid.
    pub fn grid(&self) -> anyhow::Result<HexGrid> {
        self.validate()?;
        let resolution = Resolution::try_from(self.resolution)
            .with_context(|| format!("invalid resolution {}", self.resolution))?;
        Ok(HexGrid::new(
            resolution,
            self.bbox_samples,
            self.viewport_samples,
        ))
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            resolution: u8::from(HexGrid::DEFAULT_RESOLUTION),
            bbox_samples: HexGrid::DEFAULT_BBOX_SAMPLES,
            viewport_samples: HexGrid::DEFAULT_VIEWPORT_SAMPLES,
            lod: LodConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let grid = FogConfig::default().grid().unwrap();
        assert_eq!(grid.resolution(), Resolution::Nine);
    }

    #[test]
    fn test_grid_invalid_resolution() {
        let config = FogConfig {
            resolution: 16,
            ..FogConfig::default()
        };
        assert!(config.grid().is_err());
    }
}
