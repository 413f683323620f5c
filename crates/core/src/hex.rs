//! Thin adapter over the [h3o] hierarchical hexagonal grid.
//!
//! The rest of the crate only ever talks about cells through [CellId], an
//! opaque string token, and [HexGrid], which wraps the handful of grid queries
//! we need. All hex math (cell boundaries, adjacency, distance) is delegated to
//! h3o; nothing here reimplements it.
//!
//! ## Failure Policy
//!
//! Only [HexGrid::coord_to_cell] can fail. Every query that takes a cell
//! degrades to an empty/zero/sentinel result for an invalid cell instead of
//! returning an error, so hot render paths can stay branch-free and one bad
//! record can't take down the overlay.

use crate::{
    error::HexFogError,
    geo::{GeoBounds, GeoPoint},
};
use derive_more::{Display, From, Into};
use fnv::FnvBuildHasher;
use h3o::{CellIndex, LatLng, Resolution};
use indexmap::IndexSet;
use log::trace;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An ordered set of cell IDs. Ordering is insertion order, so iteration is
/// deterministic for any given input.
pub type CellIdSet = IndexSet<CellId, FnvBuildHasher>;

/// Identifier for one cell of the hex grid. This is the lowercase hex form of
/// an H3 index, e.g. `892a100d2c3ffff`. The string is stored as-is, so a
/// `CellId` can hold an invalid token (e.g. one deserialized from a corrupt
/// snapshot). Use [HexGrid::is_valid_cell] or [CellId::to_index] to check.
#[derive(
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse this token into an h3o index. Fails if the token isn't a valid
    /// cell index.
    pub fn to_index(&self) -> Result<CellIndex, HexFogError> {
        CellIndex::from_str(&self.0)
            .map_err(|_| HexFogError::InvalidCell(self.0.clone()))
    }
}

impl From<CellIndex> for CellId {
    fn from(index: CellIndex) -> Self {
        Self(index.to_string())
    }
}

impl From<&str> for CellId {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Convert an h3o coordinate into our own point type
fn to_geo_point(lat_lng: LatLng) -> GeoPoint {
    GeoPoint::new(lat_lng.lat(), lat_lng.lng())
}

/// Entry point for all grid queries. Holds the fixed "fine" resolution used
/// for exploration, and the sampling densities used for bounding box
/// enumeration.
#[derive(Copy, Clone, Debug)]
pub struct HexGrid {
    resolution: Resolution,
    bbox_samples: u32,
    viewport_samples: u32,
}

impl HexGrid {
    /// Resolution that explored cells are recorded at. Res 9 cells are roughly
    /// 0.1 km² each.
    pub const DEFAULT_RESOLUTION: Resolution = Resolution::Nine;
    /// Sample density (per axis) for general bounding box queries
    pub const DEFAULT_BBOX_SAMPLES: u32 = 20;
    /// Sample density (per axis) for viewport queries, which need to be a bit
    /// finer since viewports tend to be wide relative to a cell
    pub const DEFAULT_VIEWPORT_SAMPLES: u32 = 50;

    pub fn new(
        resolution: Resolution,
        bbox_samples: u32,
        viewport_samples: u32,
    ) -> Self {
        Self {
            resolution,
            // Zero samples would mean a zero step, clamp to one division
            bbox_samples: bbox_samples.max(1),
            viewport_samples: viewport_samples.max(1),
        }
    }

    /// The fixed resolution this grid is configured for
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Convert a coordinate to the cell that contains it, at the given
    /// resolution. Fails if either component is out of range. Same input
    /// always yields the same cell.
    pub fn coord_to_cell(
        &self,
        point: GeoPoint,
        resolution: Resolution,
    ) -> Result<CellId, HexFogError> {
        let invalid = || HexFogError::InvalidCoordinate {
            latitude: point.latitude(),
            longitude: point.longitude(),
        };
        // h3o only rejects non-finite values, so range check ourselves
        if !point.is_valid() {
            return Err(invalid());
        }
        let lat_lng = LatLng::new(point.latitude(), point.longitude())
            .map_err(|_| invalid())?;
        Ok(lat_lng.to_cell(resolution).into())
    }

    /// [Self::coord_to_cell] at this grid's configured resolution
    pub fn cell_at(&self, point: GeoPoint) -> Result<CellId, HexFogError> {
        self.coord_to_cell(point, self.resolution)
    }

    /// Get the vertices of a cell's boundary polygon, in consistent
    /// (counter-clockwise) winding. The ring is open: the last vertex
    /// implicitly connects back to the first. Returns an empty list for an
    /// invalid cell, which callers should treat as "unrenderable".
    pub fn cell_to_boundary(&self, cell: &CellId) -> Vec<GeoPoint> {
        match cell.to_index() {
            Ok(index) => {
                index.boundary().iter().copied().map(to_geo_point).collect()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Get the center point of a cell. Returns [GeoPoint::ORIGIN] for an
    /// invalid cell.
    pub fn cell_to_center(&self, cell: &CellId) -> GeoPoint {
        match cell.to_index() {
            Ok(index) => to_geo_point(LatLng::from(index)),
            Err(_) => GeoPoint::ORIGIN,
        }
    }

    /// Get all cells exactly `distance` grid steps away from the given cell.
    /// Distance 0 is the cell itself. Empty for an invalid cell.
    pub fn ring_at(&self, cell: &CellId, distance: u32) -> CellIdSet {
        let index = match cell.to_index() {
            Ok(index) => index,
            Err(_) => return CellIdSet::default(),
        };
        if distance == 0 {
            return std::iter::once(cell.clone()).collect();
        }

        // ring(k) = disk(k) - disk(k-1)
        let inner: IndexSet<CellIndex, FnvBuildHasher> =
            index.grid_disk(distance - 1);
        index
            .grid_disk::<Vec<_>>(distance)
            .into_iter()
            .filter(|neighbor| !inner.contains(neighbor))
            .map(CellId::from)
            .collect()
    }

    /// Get all cells within `distance` grid steps of the given cell, including
    /// the cell itself. Empty for an invalid cell.
    pub fn disk_within(&self, cell: &CellId, distance: u32) -> CellIdSet {
        match cell.to_index() {
            Ok(index) => index
                .grid_disk::<Vec<_>>(distance)
                .into_iter()
                .map(CellId::from)
                .collect(),
            Err(_) => CellIdSet::default(),
        }
    }

    /// Number of grid steps between two cells. Returns 0 if either cell is
    /// invalid, or if the grid can't compute a local distance between them
    /// (e.g. across a pentagon, or too far apart).
    pub fn grid_distance(&self, a: &CellId, b: &CellId) -> u32 {
        let (a, b) = match (a.to_index(), b.to_index()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return 0,
        };
        match a.grid_distance(b) {
            Ok(distance) => u32::try_from(distance).unwrap_or(0),
            Err(err) => {
                trace!("No grid distance between {} and {}: {}", a, b, err);
                0
            }
        }
    }

    /// Is this token a valid cell index?
    pub fn is_valid_cell(&self, token: &str) -> bool {
        CellIndex::from_str(token).is_ok()
    }

    /// Approximate the set of cells covering a lat/lng box. This samples an
    /// evenly spaced grid of points across the box (edges included) and
    /// collects the cell containing each one. It's an approximation: thin
    /// slivers of cells poking into the box between sample points can be
    /// missed. In exchange, the cost is bounded by the sample count rather
    /// than the box size.
    ///
    /// Returns an empty set if the box is degenerate (min >= max on either
    /// axis) or any coordinate is out of range.
    pub fn cells_in_bounding_box(
        &self,
        min_lat: f64,
        max_lat: f64,
        min_lng: f64,
        max_lng: f64,
        resolution: Resolution,
    ) -> CellIdSet {
        self.sample_box(
            GeoBounds::new(min_lat, min_lng, max_lat, max_lng),
            resolution,
            self.bbox_samples,
        )
    }

    /// Approximate the set of cells visible in a viewport, at this grid's
    /// resolution. Same as [Self::cells_in_bounding_box], but with a denser
    /// sampling grid.
    pub fn viewport_cells(&self, bounds: &GeoBounds) -> CellIdSet {
        self.sample_box(*bounds, self.resolution, self.viewport_samples)
    }

    fn sample_box(
        &self,
        bounds: GeoBounds,
        resolution: Resolution,
        samples: u32,
    ) -> CellIdSet {
        let mut cells = CellIdSet::default();
        // Degenerate boxes are rejected here, on top of the range checks
        if !bounds.is_valid()
            || bounds.south >= bounds.north
            || bounds.west >= bounds.east
        {
            return cells;
        }

        let lat_step = (bounds.north - bounds.south) / samples as f64;
        let lng_step = (bounds.east - bounds.west) / samples as f64;
        // Step by integer index rather than accumulating floats, so the far
        // edges always get sampled
        for i in 0..=samples {
            let lat = bounds.south + lat_step * i as f64;
            for j in 0..=samples {
                let lng = bounds.west + lng_step * j as f64;
                // Every sample is inside a valid box, but skip rather than
                // fail if rounding ever pushes one out of range
                if let Ok(cell) =
                    self.coord_to_cell(GeoPoint::new(lat, lng), resolution)
                {
                    cells.insert(cell);
                }
            }
        }
        cells
    }
}

impl Default for HexGrid {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_RESOLUTION,
            Self::DEFAULT_BBOX_SAMPLES,
            Self::DEFAULT_VIEWPORT_SAMPLES,
        )
    }
}
