//! Polygon rasterization into fixed-size overlay surfaces.
//!
//! A polygon is scaled from its own bounding box into a surface of constant
//! pixel dimensions, each axis independently. The viewer later stretches the
//! surface back over the bounding box, so non-square boxes come out
//! anisotropically scaled in the raster and undistorted on screen.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use dualzoom_core::{BoundingBox, NormalizedPoint, Polygon, Rgba, Style};

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },

    #[error("Polygon produced an empty path")]
    EmptyPath,

    #[error("PNG encoding failed: {0}")]
    Png(String),
}

/// Pixel dimensions of an overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const DEFAULT_EDGE: u32 = 300;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::square(Self::DEFAULT_EDGE)
    }
}

/// A rendered RGBA raster.
#[derive(Clone, PartialEq)]
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width(), self.height())
    }

    /// Straight-alpha RGBA at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RasterError::Png(e.to_string()))
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Map a normalized point into surface pixels relative to `bbox`.
///
/// `px = (x - min_x) / width * surface_width`, likewise for y.
pub fn map_to_surface(point: &NormalizedPoint, bbox: &BoundingBox, size: SurfaceSize) -> (f32, f32) {
    let px = (point.x - bbox.min_x) / bbox.width * f64::from(size.width);
    let py = (point.y - bbox.min_y) / bbox.height * f64::from(size.height);
    (px as f32, py as f32)
}

/// Rasterize `polygon` into a fresh surface: fill first, then the outline.
pub fn rasterize(polygon: &Polygon, style: &Style, size: SurfaceSize) -> Result<RasterSurface, RasterError> {
    let mut pixmap = Pixmap::new(size.width, size.height).ok_or(RasterError::Allocation {
        width: size.width,
        height: size.height,
    })?;

    let bbox = polygon.bbox();
    let mut pb = PathBuilder::new();
    for (i, point) in polygon.points().iter().enumerate() {
        let (x, y) = map_to_surface(point, &bbox, size);
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    let path = pb.finish().ok_or(RasterError::EmptyPath)?;

    pixmap.fill_path(
        &path,
        &paint_for(&style.fill),
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    if style.stroke_width > 0.0 {
        let stroke = Stroke {
            width: style.stroke_width,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &path,
            &paint_for(&style.stroke),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    Ok(RasterSurface { pixmap })
}

fn paint_for(color: &Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color.to_rgba8();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}
