use crate::util::range::NumRange;
use derive_more::{
    Add, AddAssign, Display, Div, DivAssign, From, Into, Mul, MulAssign, Neg,
    Sub, SubAssign, Sum,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A 2D point in pixel space. For points produced by
/// [MapView::project](crate::MapView::project), the origin is the top-left
/// corner of the map container, with y increasing downward.
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
    Neg,
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
#[display(fmt = "({}, {})", "self.x", "self.y")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Size of a drawing surface, in whole pixels
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}x{}", width, height)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The point in the middle of the surface
    pub fn center(&self) -> Point2 {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// An RGBA color. Values are stored as floats between 0 and 1 (inclusive).
/// This uses f32 because the extra precision from f64 is pointless.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Color4 {
    #[validate(range(min = 0.0, max = 1.0))]
    pub red: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub green: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub blue: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub alpha: f32,
}

impl Color4 {
    /// The valid range of values for each component in RGBA
    const COMPONENT_RANGE: NumRange<f32> = NumRange::new(0.0, 1.0);

    /// Create a new color from integer RGB components in the [0,255] range,
    /// and an alpha in [0,1]. Out of range alpha gets clamped.
    pub fn new_int(red: u8, green: u8, blue: u8, alpha: f32) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: Self::COMPONENT_RANGE.clamp(alpha),
        }
    }

    /// Convert the RGB components to a set of 3 bytes: `(red, green, blue)`
    pub fn to_ints(self) -> (u8, u8, u8) {
        (
            (self.red * 255.0).round() as u8,
            (self.green * 255.0).round() as u8,
            (self.blue * 255.0).round() as u8,
        )
    }

    /// Convert the RGB components to an HTML color code: `#rrggbb`. Alpha is
    /// dropped, see [Self::opacity].
    pub fn to_html(self) -> String {
        let (r, g, b) = self.to_ints();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Convert to a CSS color function: `rgba(r, g, b, a)`
    pub fn to_css(self) -> String {
        let (r, g, b) = self.to_ints();
        format!("rgba({}, {}, {}, {})", r, g, b, self.alpha)
    }

    pub fn opacity(self) -> f32 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_color_conversions() {
        let color = Color4::new_int(120, 120, 120, 0.9);
        assert_eq!(color.to_ints(), (120, 120, 120));
        assert_eq!(color.to_html(), "#787878");
        assert_eq!(color.to_css(), "rgba(120, 120, 120, 0.9)");
        assert_approx_eq!(color.opacity(), 0.9);
        assert_eq!(Color4::new_int(0, 0, 0, 7.0).alpha, 1.0);
    }

    #[test]
    fn test_point_arithmetic() {
        let point = Point2::new(3.0, 4.0) - Point2::new(1.0, 1.0);
        assert_eq!(point, Point2::new(2.0, 3.0));
        assert_eq!(point * 2.0, Point2::new(4.0, 6.0));
        assert!(!Point2::new(f64::NAN, 0.0).is_finite());
        assert_eq!(PixelSize::new(800, 600).center(), Point2::new(400.0, 300.0));
    }
}
