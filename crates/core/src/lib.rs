//! hexfog turns a trail of GPS samples into a fog-of-war map overlay. Visited
//! locations are bucketed into cells of the H3 hexagonal grid, and each
//! explored cell is rendered as a hole in a fog layer covering the map.
//!
//! ```no_run
//! use hexfog::{
//!     FogConfig, FogRenderer, GeoPoint, MercatorView, PixelSize, Snapshot,
//!     SpatialIndex, SvgHost,
//! };
//! use std::time::Instant;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = FogConfig::default();
//! let grid = config.grid()?;
//! let snapshot = Snapshot::from_json(&std::fs::read_to_string("explored.json")?)?;
//! let index = SpatialIndex::new(snapshot.records, &grid);
//!
//! let map = MercatorView::new(
//!     GeoPoint::new(40.7589, -73.9851),
//!     16,
//!     PixelSize::new(800, 600),
//! );
//! let mut renderer =
//!     FogRenderer::attach(&mut SvgHost, &map, index, grid, &config)?;
//! let report = renderer.frame(&map, Instant::now());
//! // From here, forward map movement events and display refresh ticks to the
//! // renderer
//! # Ok(())
//! # }
//! ```
//!
//! See [FogConfig] for details on how rendering can be customized.

mod config;
mod error;
mod exploration;
mod geo;
mod hex;
mod index;
mod lod;
mod render;
mod snapshot;
mod util;

pub use crate::{
    config::FogConfig,
    error::HexFogError,
    exploration::{
        classify_method, estimate_area, estimate_distance, is_within_region,
        ExplorationMethod, ExplorationStats, AVERAGE_CELL_AREA,
        AVERAGE_CELL_DIAMETER, BIKING_MAX_SPEED, DEPLOYMENT_REGION,
        WALKING_MAX_SPEED,
    },
    geo::{GeoBounds, GeoPoint, LATITUDE_RANGE, LONGITUDE_RANGE},
    hex::{CellId, CellIdSet, HexGrid},
    index::SpatialIndex,
    lod::{DetailLevel, LodConfig, LodPolicy},
    render::{
        config::RenderConfig,
        mercator::MercatorView,
        unit::{Color4, PixelSize, Point2},
        FogInput, FogRenderer, FogState, FogSurface, FrameKind, FrameReport,
        MapView, SurfaceHost,
    },
    snapshot::{ExploredCellRecord, Snapshot},
    util::{
        ease_out_cubic,
        range::NumRange,
        unit::{Meter, Meter2},
    },
};
// Re-exported so callers don't need a direct h3o dependency to pick a
// resolution
pub use h3o::Resolution;

#[cfg(feature = "svg")]
pub use crate::render::svg::{SvgHost, SvgSurface};
