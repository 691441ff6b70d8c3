//! View transform for converting between canvas and pattern coordinates.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Determinants at or below this magnitude are treated as non-invertible.
const DET_EPSILON: f64 = 1e-12;

/// Error returned when inverting a matrix whose determinant is ~0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("degenerate transform: determinant is ~0")]
pub struct DegenerateTransform;

/// Error returned when fitting content into a canvas with zero or
/// non-finite extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot fit content to canvas: zero or non-finite extent")]
pub struct EmptyExtent;

/// An immutable 2D affine transform over six scalars.
///
/// The layout is the usual column convention: a point `(x, y)` maps to
/// `(a·x + c·y + e, b·x + d·y + f)`. All operations return new values;
/// chained operations post-multiply, so `t.scale(2.0)` scales in the
/// coordinate space `t` maps from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Create a transform from its six coefficients.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Matrix product `self · other`.
    ///
    /// Mapping a point through the result is the same as mapping it through
    /// `other` first and `self` second.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Scale uniformly about the origin of the mapped-from space.
    pub fn scale(&self, factor: f64) -> Self {
        self.then(&Self::new(factor, 0.0, 0.0, factor, 0.0, 0.0))
    }

    /// Scale uniformly about an arbitrary point of the mapped-from space.
    ///
    /// The given origin stays fixed under the resulting transform, which is
    /// what keeps a zoom anchor visually pinned while the scale changes.
    pub fn scale_about(&self, factor: f64, origin: Point) -> Self {
        self.translate(origin.to_vec2())
            .scale(factor)
            .translate(-origin.to_vec2())
    }

    /// Translate in the mapped-from space.
    pub fn translate(&self, v: Vec2) -> Self {
        self.then(&Self::new(1.0, 0.0, 0.0, 1.0, v.x, v.y))
    }

    /// Apply the transform to a point.
    pub fn map_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > DET_EPSILON
    }

    /// Compute the inverse transform.
    ///
    /// `t.invert()?.map_point(p)` maps a canvas pixel coordinate back into
    /// content coordinates. Fails rather than substituting identity when the
    /// matrix is singular.
    pub fn invert(&self) -> Result<Self, DegenerateTransform> {
        if !self.is_invertible() {
            return Err(DegenerateTransform);
        }
        let det = self.determinant();
        Ok(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Compute the reset transform that fits content into a canvas.
    ///
    /// The content box is scaled uniformly (letterboxed, aspect preserved)
    /// and centered in the canvas. Zero or non-finite extents are rejected
    /// rather than producing a degenerate matrix.
    pub fn fit(canvas: Size, content: Size) -> Result<Self, EmptyExtent> {
        if !canvas.is_finite()
            || !content.is_finite()
            || canvas.width <= 0.0
            || canvas.height <= 0.0
            || content.width <= 0.0
            || content.height <= 0.0
        {
            return Err(EmptyExtent);
        }
        let scale = (canvas.width / content.width).min(canvas.height / content.height);
        let tx = (canvas.width - content.width * scale) / 2.0;
        let ty = (canvas.height - content.height * scale) / 2.0;
        Ok(Self::IDENTITY.translate(Vec2::new(tx, ty)).scale(scale))
    }

    /// Convert into a [`kurbo::Affine`] for the render layer.
    pub fn to_affine(&self) -> kurbo::Affine {
        kurbo::Affine::new([self.a, self.b, self.c, self.d, self.e, self.f])
    }
}

impl From<kurbo::Affine> for ViewTransform {
    fn from(affine: kurbo::Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self { a, b, c, d, e, f }
    }
}

impl From<ViewTransform> for kurbo::Affine {
    fn from(t: ViewTransform) -> Self {
        t.to_affine()
    }
}
