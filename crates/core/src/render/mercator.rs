use crate::{
    geo::{GeoBounds, GeoPoint, LATITUDE_RANGE, LONGITUDE_RANGE},
    render::{
        unit::{PixelSize, Point2},
        MapView,
    },
    util::range::NumRange,
};
use std::f64::consts::PI;

/// Web Mercator can't represent the poles, latitudes are clamped to this
/// before projecting
pub const MAX_LATITUDE: f64 = 85.05112878;
/// Size of one map tile, in pixels. At zoom `z` the whole world is
/// `TILE_SIZE * 2^z` pixels across.
pub const TILE_SIZE: f64 = 256.0;

/// A rectangular Web Mercator map viewport, i.e. what a slippy map shows.
/// This is a minimal stand-in for a real interactive map, so the fog can be
/// rendered headless.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MercatorView {
    center: GeoPoint,
    zoom: u8,
    size: PixelSize,
    pane_offset: Point2,
}

impl MercatorView {
    pub fn new(center: GeoPoint, zoom: u8, size: PixelSize) -> Self {
        Self {
            center,
            zoom,
            size,
            pane_offset: Point2::ZERO,
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    /// Move the view to a new center. Like dragging a real map, this shifts
    /// the pane offset by the distance panned.
    pub fn pan_to(&mut self, center: GeoPoint) {
        let delta = self.world_pixel(center) - self.world_pixel(self.center);
        self.pane_offset += delta;
        self.center = center;
    }

    /// Change zoom, keeping the same center. A zoom resets the pane.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
        self.pane_offset = Point2::ZERO;
    }

    pub fn resize(&mut self, size: PixelSize) {
        self.size = size;
    }

    /// Width (and height) of the whole world at the current zoom, in pixels
    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powi(self.zoom.into())
    }

    /// Absolute pixel position of a point at the current zoom, where (0, 0)
    /// is the north-west corner of the world
    fn world_pixel(&self, point: GeoPoint) -> Point2 {
        let n = self.world_size();
        let lat = NumRange::new(-MAX_LATITUDE, MAX_LATITUDE)
            .clamp(point.latitude())
            .to_radians();
        Point2::new(
            (point.longitude() + 180.0) / 360.0 * n,
            (1.0 - lat.tan().asinh() / PI) / 2.0 * n,
        )
    }

    /// Inverse of [Self::world_pixel]
    fn world_point(&self, pixel: Point2) -> GeoPoint {
        let n = self.world_size();
        let lat = (PI * (1.0 - 2.0 * pixel.y / n)).sinh().atan().to_degrees();
        let lng = pixel.x / n * 360.0 - 180.0;
        // Rounding can push the poles a hair past 90°
        GeoPoint::new(LATITUDE_RANGE.clamp(lat), lng)
    }

    /// Convert a container pixel back to a coordinate
    pub fn unproject(&self, pixel: Point2) -> GeoPoint {
        let origin = self.world_pixel(self.center) - self.size.center();
        self.world_point(origin + pixel)
    }
}

impl MapView for MercatorView {
    fn bounds(&self) -> GeoBounds {
        let north_west = self.unproject(Point2::ZERO);
        let south_east = self.unproject(Point2::new(
            self.size.width as f64,
            self.size.height as f64,
        ));
        // A zoomed out view can show the world more than once, but bounds
        // can't wrap
        GeoBounds::new(
            south_east.latitude(),
            LONGITUDE_RANGE.clamp(north_west.longitude()),
            north_west.latitude(),
            LONGITUDE_RANGE.clamp(south_east.longitude()),
        )
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn pane_offset(&self) -> Point2 {
        self.pane_offset
    }

    fn project(&self, point: GeoPoint) -> Point2 {
        self.world_pixel(point) - self.world_pixel(self.center)
            + self.size.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const TIMES_SQUARE: GeoPoint = GeoPoint::new(40.7589, -73.9851);

    #[test]
    fn test_center_projects_to_middle() {
        let view =
            MercatorView::new(TIMES_SQUARE, 16, PixelSize::new(800, 600));
        let center = view.project(TIMES_SQUARE);
        assert_approx_eq!(center.x, 400.0);
        assert_approx_eq!(center.y, 300.0);
    }

    #[test]
    fn test_round_trip() {
        let view =
            MercatorView::new(TIMES_SQUARE, 14, PixelSize::new(1024, 768));
        let point = GeoPoint::new(40.7812, -73.9665);
        let back = view.unproject(view.project(point));
        assert_approx_eq!(back.latitude(), point.latitude());
        assert_approx_eq!(back.longitude(), point.longitude());
    }

    #[test]
    fn test_bounds() {
        let view =
            MercatorView::new(TIMES_SQUARE, 16, PixelSize::new(800, 600));
        let bounds = view.bounds();
        assert!(bounds.is_valid());
        assert!(bounds.contains(&TIMES_SQUARE));
        // 800px at zoom 16 is ~0.0172° of longitude
        assert_approx_eq!(
            bounds.east - bounds.west,
            800.0 / 256.0 / 65536.0 * 360.0
        );

        // Whole world, clamped so the box stays valid
        let world =
            MercatorView::new(GeoPoint::ORIGIN, 0, PixelSize::new(2000, 2000));
        let bounds = world.bounds();
        assert!(bounds.is_valid());
        assert_eq!(bounds.west, -180.0);
        assert_eq!(bounds.east, 180.0);
    }

    #[test]
    fn test_pan_and_zoom() {
        let mut view =
            MercatorView::new(TIMES_SQUARE, 16, PixelSize::new(800, 600));
        let target = GeoPoint::new(40.7812, -73.9665);
        let expected_offset = view.project(target) - view.project(TIMES_SQUARE);
        view.pan_to(target);
        assert_eq!(view.center(), target);
        assert_approx_eq!(view.pane_offset().x, expected_offset.x);
        assert_approx_eq!(view.pane_offset().y, expected_offset.y);

        view.set_zoom(12);
        assert_eq!(view.zoom(), 12);
        assert_eq!(view.pane_offset(), Point2::ZERO);
    }
}
