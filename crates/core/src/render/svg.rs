use crate::{
    error::HexFogError,
    render::{
        unit::{Color4, PixelSize, Point2},
        FogSurface, SurfaceHost,
    },
};
use svg::{
    node::element::{Definitions, Mask, Polygon, Rectangle},
    Document,
};

const MASK_ID: &str = "fog-holes";

/// A fog surface that records what's drawn on it, and can be exported as an
/// SVG. Holes are expressed as a mask over a single fog rectangle: the mask
/// is white (fully visible) everywhere except the hole polygons, which are
/// black at an opacity matching the erase alpha.
#[derive(Clone, Debug, Default)]
pub struct SvgSurface {
    size: PixelSize,
    position: Point2,
    fill: Option<Color4>,
    holes: Vec<(Vec<Point2>, f64)>,
    detached: bool,
}

impl SvgSurface {
    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn position(&self) -> Point2 {
        self.position
    }

    /// Number of holes erased since the last fill
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    fn check_attached(&self) -> Result<(), HexFogError> {
        if self.detached {
            Err(HexFogError::SurfaceUnavailable(
                "SVG surface is detached".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Export the current contents as an SVG document. An unfilled surface
    /// produces an empty document of the right size.
    pub fn to_document(&self) -> Document {
        let (width, height) = (self.size.width, self.size.height);
        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height));

        let color = match self.fill {
            Some(color) => color,
            None => return document,
        };

        let mut mask = Mask::new().set("id", MASK_ID).add(
            Rectangle::new()
                .set("width", width)
                .set("height", height)
                .set("fill", "white"),
        );
        for (points, alpha) in &self.holes {
            mask = mask.add(
                Polygon::new()
                    .set(
                        "points",
                        points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>(),
                    )
                    .set("fill", "black")
                    .set("fill-opacity", *alpha),
            );
        }

        document = document.add(Definitions::new().add(mask)).add(
            Rectangle::new()
                .set("width", width)
                .set("height", height)
                .set("fill", color.to_html())
                .set("fill-opacity", color.opacity())
                .set("mask", format!("url(#{})", MASK_ID)),
        );
        document
    }
}

impl FogSurface for SvgSurface {
    fn resize(&mut self, size: PixelSize) -> Result<(), HexFogError> {
        self.check_attached()?;
        if size != self.size {
            // Same as a canvas, resizing wipes the contents
            self.size = size;
            self.fill = None;
            self.holes.clear();
        }
        Ok(())
    }

    fn set_position(&mut self, offset: Point2) {
        self.position = offset;
    }

    fn fill(&mut self, color: Color4) -> Result<(), HexFogError> {
        self.check_attached()?;
        self.fill = Some(color);
        self.holes.clear();
        Ok(())
    }

    fn erase_polygons(
        &mut self,
        polygons: &[Vec<Point2>],
        alpha: f64,
    ) -> Result<(), HexFogError> {
        self.check_attached()?;
        self.holes
            .extend(polygons.iter().map(|polygon| (polygon.clone(), alpha)));
        Ok(())
    }

    fn detach(&mut self) {
        self.detached = true;
    }
}

/// Hands out [SvgSurface]s, for rendering without a real map
#[derive(Copy, Clone, Debug, Default)]
pub struct SvgHost;

impl SurfaceHost for SvgHost {
    type Surface = SvgSurface;

    fn create_surface(&mut self) -> Result<SvgSurface, HexFogError> {
        Ok(SvgSurface::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Point2> {
        vec![
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 10.0),
            Point2::new(15.0, 20.0),
        ]
    }

    #[test]
    fn test_document() {
        let mut surface = SvgHost.create_surface().unwrap();
        surface.resize(PixelSize::new(100, 50)).unwrap();
        surface.fill(Color4::new_int(100, 100, 100, 0.85)).unwrap();
        surface.erase_polygons(&[triangle()], 0.5).unwrap();
        assert_eq!(surface.hole_count(), 1);

        let svg = surface.to_document().to_string();
        assert!(svg.contains("<mask id=\"fog-holes\">"), "{}", svg);
        assert!(svg.contains("fill=\"#646464\""), "{}", svg);
        assert!(svg.contains("fill-opacity=\"0.5\""), "{}", svg);
        assert!(svg.contains("mask=\"url(#fog-holes)\""), "{}", svg);
    }

    #[test]
    fn test_fill_clears_holes() {
        let mut surface = SvgSurface::default();
        surface.resize(PixelSize::new(100, 50)).unwrap();
        surface.fill(Color4::new_int(0, 0, 0, 1.0)).unwrap();
        surface.erase_polygons(&[triangle(), triangle()], 1.0).unwrap();
        assert_eq!(surface.hole_count(), 2);
        surface.fill(Color4::new_int(0, 0, 0, 1.0)).unwrap();
        assert_eq!(surface.hole_count(), 0);
    }

    #[test]
    fn test_detached() {
        let mut surface = SvgSurface::default();
        surface.detach();
        assert!(surface.is_detached());
        assert!(matches!(
            surface.fill(Color4::new_int(0, 0, 0, 1.0)),
            Err(HexFogError::SurfaceUnavailable(_))
        ));
        assert!(surface.erase_polygons(&[triangle()], 1.0).is_err());
    }

    #[test]
    fn test_empty_document() {
        let svg = SvgSurface::default().to_document().to_string();
        assert!(!svg.contains("<rect"), "{}", svg);
    }
}
