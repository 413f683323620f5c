//! The fog overlay. A [FogRenderer] owns one drawing surface sitting on top of
//! the map, covers it with fog, and punches a hole for every explored cell in
//! view.
//!
//! The renderer doesn't own a clock or an event loop. The host feeds it map
//! events and display refresh ticks through [FogRenderer::step], along with
//! the current time, and the renderer draws in response. That keeps every
//! transition deterministic, so tests can drive it with synthetic time.
//!
//! ## States
//!
//! ```text
//!         frame          move start        settle delay      fade done
//!  Idle ────────► Settled ─────────► Moving ───────────► Fading ───────► Settled
//!                                      ▲                    │
//!                                      └────move start──────┘
//! ```
//!
//! While moving, the fog is drawn solid (no holes), since re-querying and
//! re-projecting every cell on every movement frame is too expensive. Once
//! the map settles, holes fade back in.

pub mod config;
pub mod mercator;
#[cfg(feature = "svg")]
pub mod svg;
pub mod unit;

use crate::{
    config::FogConfig,
    error::HexFogError,
    geo::{GeoBounds, GeoPoint},
    hex::{CellId, HexGrid},
    index::SpatialIndex,
    lod::LodPolicy,
    render::{
        config::RenderConfig,
        unit::{Color4, PixelSize, Point2},
    },
    snapshot::Snapshot,
    util::{ease_out_cubic, range::NumRange},
};
use log::{debug, trace, warn};
use std::time::Instant;
use strum::Display;
use validator::Validate;

/// Read-only view of the map the fog is drawn over
pub trait MapView {
    /// Lat/lng box currently visible
    fn bounds(&self) -> GeoBounds;

    /// Current zoom level. Higher is closer.
    fn zoom(&self) -> u8;

    /// Size of the map container, in pixels
    fn size(&self) -> PixelSize;

    /// Where the overlay surface should sit relative to its pane, so that it
    /// lines up with the map container
    fn pane_offset(&self) -> Point2;

    /// Convert a coordinate to a pixel position relative to the top-left of
    /// the map container
    fn project(&self, point: GeoPoint) -> Point2;
}

/// A 2D drawing surface that the fog is painted onto. All pixel coordinates
/// are relative to the top-left of the surface.
pub trait FogSurface {
    /// Set the pixel size of the surface. This may clear its contents.
    fn resize(&mut self, size: PixelSize) -> Result<(), HexFogError>;

    /// Move the surface within its pane
    fn set_position(&mut self, offset: Point2);

    /// Clear the surface, then fill all of it with the given color
    fn fill(&mut self, color: Color4) -> Result<(), HexFogError>;

    /// Erase each polygon from the surface, as if painting with a
    /// destination-out composite at the given alpha. An alpha of 1 makes the
    /// polygons fully transparent, 0 leaves the surface untouched.
    fn erase_polygons(
        &mut self,
        polygons: &[Vec<Point2>],
        alpha: f64,
    ) -> Result<(), HexFogError>;

    /// Remove the surface from its host. Nothing will be drawn to it after
    /// this.
    fn detach(&mut self);
}

/// Something that can provide a surface for the fog, e.g. a map's overlay
/// pane
pub trait SurfaceHost {
    type Surface: FogSurface;

    fn create_surface(&mut self) -> Result<Self::Surface, HexFogError>;
}

/// Visible state of the overlay
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum FogState {
    /// Attached, but nothing drawn yet
    Idle,
    /// Holes fully drawn, map is still
    Settled,
    /// Map is panning/zooming, solid fog
    Moving,
    /// Map stopped moving, holes are fading in
    Fading,
}

/// An event the renderer reacts to
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FogInput {
    /// The map started panning or zooming
    MoveStart,
    /// The map stopped panning or zooming
    MoveEnd,
    /// The display is ready for a new frame
    Frame,
}

/// What got drawn on a frame
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FrameKind {
    /// Uniform fog, no holes
    Solid,
    /// Fog with holes erased at the given alpha
    Holes { progress: f64 },
}

/// Summary of a single painted frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub kind: FrameKind,
    /// Every cell that had a hole punched for it, in draw order. Always
    /// empty for [FrameKind::Solid].
    pub cells: Vec<CellId>,
}

impl FrameReport {
    fn solid() -> Self {
        Self {
            kind: FrameKind::Solid,
            cells: Vec::new(),
        }
    }
}

/// An in-progress fade
#[derive(Copy, Clone, Debug)]
struct FadeAnimation {
    start: Instant,
}

/// All the mutable state of a renderer, aside from the surface itself
#[derive(Clone, Debug)]
struct RenderState {
    state: FogState,
    /// When the current settle timer fires, if one is armed
    settle_deadline: Option<Instant>,
    fade: Option<FadeAnimation>,
    /// Is a frame pending? Requests coalesce, so there's never more than one
    frame_requested: bool,
    /// Zoom at the last time the map settled
    last_zoom: Option<u8>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            state: FogState::Idle,
            settle_deadline: None,
            fade: None,
            // Initial draw
            frame_requested: true,
            last_zoom: None,
        }
    }
}

/// Draws the exploration fog over a map. Create one with
/// [FogRenderer::attach], then forward map events and display refresh ticks
/// to [FogRenderer::step].
///
/// Dropping the renderer releases it, which detaches its surface.
#[derive(Debug)]
pub struct FogRenderer<S: FogSurface> {
    /// `None` once released
    surface: Option<S>,
    index: SpatialIndex,
    grid: HexGrid,
    lod: LodPolicy,
    config: RenderConfig,
    state: RenderState,
}

impl<S: FogSurface> FogRenderer<S> {
    /// Create a surface from the host and size it to the map. Returns an
    /// error if the config is invalid or the surface can't be set up. If the
    /// surface gets created but setup fails after that, it's detached before
    /// returning.
    ///
    /// Nothing is drawn until the first [FogInput::Frame].
    pub fn attach<H: SurfaceHost<Surface = S>>(
        host: &mut H,
        map: &impl MapView,
        index: SpatialIndex,
        grid: HexGrid,
        config: &FogConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let lod = LodPolicy::new(config.lod)?;

        let mut surface = host.create_surface()?;
        if let Err(err) = surface.resize(map.size()) {
            surface.detach();
            return Err(err.into());
        }
        surface.set_position(map.pane_offset());
        debug!(
            "Attached fog overlay at {} with {} explored cells",
            map.size(),
            index.len()
        );

        Ok(Self {
            surface: Some(surface),
            index,
            grid,
            lod,
            config: config.render,
            state: RenderState::default(),
        })
    }

    /// Stop rendering and detach the surface. All pending work (settle timer,
    /// fade, requested frame) is dropped, and every input after this is a
    /// no-op. Calling this more than once is fine.
    pub fn release(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            self.state = RenderState {
                frame_requested: false,
                ..RenderState::default()
            };
            surface.detach();
            debug!("Released fog overlay");
        }
    }

    pub fn is_released(&self) -> bool {
        self.surface.is_none()
    }

    pub fn state(&self) -> FogState {
        self.state.state
    }

    /// Zoom level the map was at when it last settled
    pub fn last_zoom(&self) -> Option<u8> {
        self.state.last_zoom
    }

    /// The surface being drawn to. `None` once released.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Ask for a repaint on the next frame, e.g. after the map container is
    /// resized
    pub fn request_frame(&mut self) {
        if !self.is_released() {
            self.state.frame_requested = true;
        }
    }

    /// Swap in a freshly built index. The old one is dropped, and the next
    /// frame is repainted from the new one.
    pub fn replace_index(&mut self, index: SpatialIndex) {
        if self.is_released() {
            return;
        }
        debug!(
            "Replacing index ({} cells) with new index ({} cells)",
            self.index.len(),
            index.len()
        );
        self.index = index;
        self.state.frame_requested = true;
    }

    /// Build an index from a new snapshot and swap it in. See
    /// [Self::replace_index].
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        if !self.is_released() {
            let index = SpatialIndex::new(snapshot.records, &self.grid);
            self.replace_index(index);
        }
    }

    pub fn move_start(
        &mut self,
        map: &impl MapView,
        now: Instant,
    ) -> Option<FrameReport> {
        self.step(FogInput::MoveStart, map, now)
    }

    pub fn move_end(
        &mut self,
        map: &impl MapView,
        now: Instant,
    ) -> Option<FrameReport> {
        self.step(FogInput::MoveEnd, map, now)
    }

    pub fn frame(
        &mut self,
        map: &impl MapView,
        now: Instant,
    ) -> Option<FrameReport> {
        self.step(FogInput::Frame, map, now)
    }

    /// Apply one input. Returns a report if something was painted. Only
    /// [FogInput::Frame] ever paints, other inputs just update state.
    pub fn step(
        &mut self,
        input: FogInput,
        map: &impl MapView,
        now: Instant,
    ) -> Option<FrameReport> {
        if self.is_released() {
            return None;
        }

        match input {
            FogInput::MoveStart => {
                // Cancel everything in flight, we'll start over once the map
                // settles again
                self.state.fade = None;
                self.state.settle_deadline = None;
                self.state.state = FogState::Moving;
                self.state.frame_requested = true;
                None
            }
            FogInput::MoveEnd => {
                self.state.settle_deadline =
                    Some(now + self.config.settle_delay());
                None
            }
            FogInput::Frame => self.on_frame(map, now),
        }
    }

    fn on_frame(
        &mut self,
        map: &impl MapView,
        now: Instant,
    ) -> Option<FrameReport> {
        if let Some(deadline) = self.state.settle_deadline {
            if now >= deadline {
                self.state.settle_deadline = None;
                self.state.state = FogState::Fading;
                self.state.fade = Some(FadeAnimation { start: now });
                self.state.last_zoom = Some(map.zoom());
                trace!("Map settled at zoom {}, fading in", map.zoom());
            }
        }

        if self.state.state != FogState::Fading && !self.state.frame_requested
        {
            return None;
        }
        self.state.frame_requested = false;

        // None means no holes
        let progress = match self.state.state {
            FogState::Moving => None,
            FogState::Idle | FogState::Settled => {
                self.state.state = FogState::Settled;
                Some(1.0)
            }
            FogState::Fading => {
                let elapsed = self
                    .state
                    .fade
                    .map(|fade| now.saturating_duration_since(fade.start))
                    .unwrap_or_default();
                let t = NumRange::new(
                    0.0,
                    self.config.fade_duration().as_secs_f64(),
                )
                .normalize(elapsed.as_secs_f64());
                if t >= 1.0 {
                    self.state.state = FogState::Settled;
                    self.state.fade = None;
                }
                Some(ease_out_cubic(t))
            }
        };

        self.paint(map, progress)
    }

    /// Draw a full frame. Returns `None` if the surface couldn't be drawn to
    /// at all, in which case the frame is skipped.
    fn paint(
        &mut self,
        map: &impl MapView,
        progress: Option<f64>,
    ) -> Option<FrameReport> {
        let Self {
            surface,
            index,
            lod,
            config,
            state,
            ..
        } = self;
        let surface = surface.as_mut()?;

        let fog_color = if state.state == FogState::Moving {
            config.moving_fog
        } else {
            config.settled_fog
        };
        let prepared = surface.resize(map.size()).and_then(|()| {
            surface.set_position(map.pane_offset());
            surface.fill(fog_color)
        });
        if let Err(err) = prepared {
            warn!("Skipping fog frame: {}", err);
            return None;
        }

        let zoom = map.zoom();
        let progress = match progress {
            Some(progress) if !lod.below_render_threshold(zoom) => progress,
            _ => return Some(FrameReport::solid()),
        };

        let view_bounds = map.bounds().pad(config.view_padding);
        let visible = index.query_bounds(&view_bounds);
        let visible_count = visible.len();
        let records = lod.simplify(visible, zoom);

        let mut polygons = Vec::with_capacity(records.len());
        let mut cells = Vec::with_capacity(records.len());
        for record in records {
            let polygon: Vec<Point2> = record
                .boundary
                .iter()
                .map(|point| map.project(*point))
                .filter(Point2::is_finite)
                .collect();
            if polygon.len() < 3 {
                trace!("Skipping degenerate polygon for {}", record.cell_id);
                continue;
            }
            polygons.push(polygon);
            cells.push(record.cell_id.clone());
        }
        trace!(
            "Drawing {} holes ({} visible) at zoom {}, progress {:.3}",
            cells.len(),
            visible_count,
            zoom,
            progress
        );

        if let Err(err) = surface.erase_polygons(&polygons, progress) {
            warn!("Error drawing fog holes, falling back to solid fog: {}", err);
            // Best effort, the erase may have left the surface half drawn
            if let Err(err) = surface.fill(fog_color) {
                warn!("Error redrawing solid fog: {}", err);
            }
            return Some(FrameReport::solid());
        }

        Some(FrameReport {
            kind: FrameKind::Holes { progress },
            cells,
        })
    }
}

impl<S: FogSurface> Drop for FogRenderer<S> {
    fn drop(&mut self) {
        self.release();
    }
}
