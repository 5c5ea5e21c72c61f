use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing overlay geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("Non-finite coordinate at vertex {0}")]
    NonFinite(usize),

    #[error("Polygon has a degenerate extent ({width} x {height})")]
    Degenerate { width: f64, height: f64 },
}

/// A point in normalized image coordinates.
///
/// (0, 0) is the top-left corner of the full image and (1, 1) the
/// bottom-right, independent of the current zoom or pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for NormalizedPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned box in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// The full image extent.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn from_corners(min: NormalizedPoint, max: NormalizedPoint) -> Self {
        Self::new(min.x, min.y, span(min.x, max.x), span(min.y, max.y))
    }

    /// Axis-aligned extent of a point set, reducing x and y independently.
    pub fn from_points(points: &[NormalizedPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(extent(points))
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    pub fn min(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.max_x(), self.max_y())
    }

    pub fn center(&self) -> NormalizedPoint {
        NormalizedPoint::new(
            self.min_x + self.width / 2.0,
            self.min_y + self.height / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when either side has zero (or negative) length.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains_point(&self, p: &NormalizedPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x() && p.y >= self.min_y && p.y <= self.max_y()
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x()
            && self.max_x() >= other.min_x
            && self.min_y <= other.max_y()
            && self.max_y() >= other.min_y
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::from_corners(
            NormalizedPoint::new(self.min_x.min(other.min_x), self.min_y.min(other.min_y)),
            NormalizedPoint::new(self.max_x().max(other.max_x()), self.max_y().max(other.max_y())),
        )
    }
}

fn extent(points: &[NormalizedPoint]) -> BoundingBox {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingBox::new(min_x, min_y, span(min_x, max_x), span(min_y, max_y))
}

/// `hi - lo`, rounded up just enough that `lo + span` is never below `hi`.
///
/// `max_x()`/`max_y()` recompute the far edge as a sum, which would
/// otherwise round below the extreme vertex it was derived from.
fn span(lo: f64, hi: f64) -> f64 {
    let mut w = hi - lo;
    while w >= 0.0 && w.is_finite() && lo + w < hi {
        w = f64::from_bits(w.to_bits() + 1);
    }
    w
}

/// A closed polygon in normalized image coordinates.
///
/// The last vertex connects back to the first. Construction guarantees at
/// least three finite vertices and a bounding box with non-zero width and
/// height, so everything downstream can divide by the extent safely.
/// Coordinates outside `[0, 1]` are accepted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NormalizedPoint>", into = "Vec<NormalizedPoint>")]
pub struct Polygon {
    points: Vec<NormalizedPoint>,
}

impl Polygon {
    pub fn new(points: Vec<NormalizedPoint>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite(i));
        }
        let bbox = extent(&points);
        if bbox.is_degenerate() {
            return Err(GeometryError::Degenerate {
                width: bbox.width,
                height: bbox.height,
            });
        }
        Ok(Self { points })
    }

    /// Build a polygon from `(x, y)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, GeometryError> {
        Self::new(pairs.iter().copied().map(NormalizedPoint::from).collect())
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn bbox(&self) -> BoundingBox {
        extent(&self.points)
    }
}

impl TryFrom<Vec<NormalizedPoint>> for Polygon {
    type Error = GeometryError;

    fn try_from(points: Vec<NormalizedPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Polygon> for Vec<NormalizedPoint> {
    fn from(polygon: Polygon) -> Self {
        polygon.points
    }
}
