//! Level-of-detail policy. When a view has more explored cells in it than we
//! can comfortably punch out every frame, cells are thinned out by clustering
//! them into a coarse degree grid and keeping one per cluster.

use crate::{snapshot::ExploredCellRecord, util::degree_bucket};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// How much detail a given zoom level gets. More detail means more cells are
/// allowed on screen before simplification kicks in.
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
pub enum DetailLevel {
    Low,
    Medium,
    High,
}

/// Tuning knobs for level-of-detail decisions
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_zoom_order"))]
pub struct LodConfig {
    /// Lowest zoom that gets [DetailLevel::Medium]. Anything below this is
    /// [DetailLevel::Low].
    #[validate(range(min = 0, max = 24))]
    pub medium_min_zoom: u8,
    /// Lowest zoom that gets [DetailLevel::High]
    #[validate(range(min = 0, max = 24))]
    pub high_min_zoom: u8,

    /// Max number of cells drawn unsimplified at [DetailLevel::Low]
    pub low_threshold: usize,
    /// Max number of cells drawn unsimplified at [DetailLevel::Medium]
    pub medium_threshold: usize,
    /// Max number of cells drawn unsimplified at [DetailLevel::High]
    pub high_threshold: usize,

    /// Cluster size (in degrees) used when simplifying below
    /// `medium_min_zoom`. 0.01° is about 1.1km of latitude.
    #[validate(range(min = 0.0001, max = 1.0))]
    pub coarse_bucket_degrees: f64,
    /// Cluster size (in degrees) used when simplifying at or above
    /// `medium_min_zoom`
    #[validate(range(min = 0.0001, max = 1.0))]
    pub fine_bucket_degrees: f64,

    /// Below this zoom, individual cells are too small to see, so the fog is
    /// drawn as a solid layer with no holes at all
    #[validate(range(min = 0, max = 24))]
    pub min_render_zoom: u8,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            medium_min_zoom: 12,
            high_min_zoom: 16,
            low_threshold: 50,
            medium_threshold: 200,
            high_threshold: 500,
            coarse_bucket_degrees: 0.01,
            fine_bucket_degrees: 0.005,
            min_render_zoom: 12,
        }
    }
}

fn validate_zoom_order(config: &LodConfig) -> Result<(), ValidationError> {
    if config.medium_min_zoom <= config.high_min_zoom {
        Ok(())
    } else {
        Err(ValidationError::new("medium_min_zoom_above_high_min_zoom"))
    }
}

/// Decides how much to draw at a given zoom. Create one with
/// [LodPolicy::new], which validates the config up front.
#[derive(Clone, Debug, Default)]
pub struct LodPolicy {
    config: LodConfig,
}

impl LodPolicy {
    /// Create a new policy. Returns an error if the config is invalid.
    pub fn new(config: LodConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    pub fn detail_level(&self, zoom: u8) -> DetailLevel {
        if zoom >= self.config.high_min_zoom {
            DetailLevel::High
        } else if zoom >= self.config.medium_min_zoom {
            DetailLevel::Medium
        } else {
            DetailLevel::Low
        }
    }

    /// Max number of cells that can be drawn at this zoom before
    /// simplification is needed
    pub fn threshold(&self, zoom: u8) -> usize {
        match self.detail_level(zoom) {
            DetailLevel::High => self.config.high_threshold,
            DetailLevel::Medium => self.config.medium_threshold,
            DetailLevel::Low => self.config.low_threshold,
        }
    }

    /// Too many cells for this zoom level?
    pub fn should_simplify(&self, zoom: u8, cell_count: usize) -> bool {
        cell_count > self.threshold(zoom)
    }

    /// Is the zoom so far out that no holes should be drawn at all?
    pub fn below_render_threshold(&self, zoom: u8) -> bool {
        zoom < self.config.min_render_zoom
    }

    /// Thin out a list of cells for drawing. If the list is within the
    /// threshold for this zoom, it's returned unchanged. Otherwise, cells are
    /// clustered by their first boundary vertex into a degree grid, and only
    /// the first cell in each cluster is kept. Input order is preserved.
    ///
    /// The output isn't guaranteed to be under the threshold, it's just a
    /// best effort reduction. Cells with no boundary can't be clustered, so
    /// they're dropped during simplification.
    pub fn simplify<'a>(
        &self,
        cells: Vec<&'a ExploredCellRecord>,
        zoom: u8,
    ) -> Vec<&'a ExploredCellRecord> {
        if !self.should_simplify(zoom, cells.len()) {
            return cells;
        }

        let bucket_degrees = if zoom < self.config.medium_min_zoom {
            self.config.coarse_bucket_degrees
        } else {
            self.config.fine_bucket_degrees
        };

        let mut seen: FnvHashSet<(i64, i64)> = FnvHashSet::default();
        cells
            .into_iter()
            .filter(|record| match record.boundary.first() {
                Some(vertex) => seen.insert((
                    degree_bucket(vertex.latitude(), bucket_degrees),
                    degree_bucket(vertex.longitude(), bucket_degrees),
                )),
                None => false,
            })
            .collect()
    }
}
