use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dualzoom_core::{BoundingBox, OverlayId, Polygon, Style};

use crate::raster::{rasterize, RasterError, RasterSurface, SurfaceSize};

/// A rendered surface plus the region of the image it is stretched over.
#[derive(Debug, Clone)]
pub struct OverlayRegion {
    pub id: OverlayId,
    pub surface: RasterSurface,
    /// Anchor in normalized image coordinates.
    pub region: BoundingBox,
}

impl OverlayRegion {
    pub fn new(surface: RasterSurface, region: BoundingBox) -> Self {
        Self {
            id: Uuid::new_v4(),
            surface,
            region,
        }
    }

    pub fn placement(&self) -> OverlayPlacement {
        OverlayPlacement {
            id: self.id,
            region: self.region,
            surface: self.surface.size(),
        }
    }
}

/// JSON-serializable description of where an overlay surface goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub id: OverlayId,
    pub region: BoundingBox,
    pub surface: SurfaceSize,
}

/// Anything that composites overlay regions on top of an image.
///
/// Implemented by viewer handles; each call adds a new overlay and never
/// replaces an existing one.
pub trait OverlaySink {
    fn add_overlay(&mut self, overlay: OverlayRegion);
}

impl OverlaySink for Vec<OverlayRegion> {
    fn add_overlay(&mut self, overlay: OverlayRegion) {
        self.push(overlay);
    }
}

/// Rasterizes polygons and registers them on an [`OverlaySink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer {
    size: SurfaceSize,
}

impl OverlayRenderer {
    pub fn new(size: SurfaceSize) -> Self {
        Self { size }
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    /// Render `polygon` with `style` and hand the result to `sink`.
    ///
    /// Returns the id of the newly registered overlay.
    pub fn render<S: OverlaySink + ?Sized>(
        &self,
        sink: &mut S,
        polygon: &Polygon,
        style: &Style,
    ) -> Result<OverlayId, RasterError> {
        let region = polygon.bbox();
        let surface = rasterize(polygon, style, self.size)?;
        let overlay = OverlayRegion::new(surface, region);
        let id = overlay.id;
        log::debug!(
            "Registering overlay {} at ({:.3}, {:.3}) {:.3}x{:.3}",
            id,
            region.min_x,
            region.min_y,
            region.width,
            region.height
        );
        sink.add_overlay(overlay);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_registers_independent_overlays() {
        let renderer = OverlayRenderer::default();
        let diamond =
            Polygon::from_pairs(&[(0.25, 0.4), (0.35, 0.5), (0.25, 0.6), (0.15, 0.5)]).unwrap();
        let triangle = Polygon::from_pairs(&[(0.6, 0.3), (0.75, 0.55), (0.45, 0.55)]).unwrap();

        let mut sink: Vec<OverlayRegion> = Vec::new();
        let a = renderer.render(&mut sink, &diamond, &Style::default()).unwrap();
        let b = renderer
            .render(&mut sink, &triangle, &Style::tinted(0, 0, 255, 0.3))
            .unwrap();

        assert_eq!(sink.len(), 2);
        assert_ne!(a, b);
        assert_eq!(sink[0].id, a);
        assert_eq!(sink[1].id, b);
        assert_eq!(sink[0].region, diamond.bbox());
        assert_eq!(sink[1].region, triangle.bbox());
        assert_ne!(sink[0].surface.data(), sink[1].surface.data());
    }

    #[test]
    fn test_same_polygon_twice_adds_twice() {
        let renderer = OverlayRenderer::new(SurfaceSize::square(64));
        let triangle = Polygon::from_pairs(&[(0.6, 0.3), (0.75, 0.55), (0.45, 0.55)]).unwrap();
        let mut sink: Vec<OverlayRegion> = Vec::new();
        renderer.render(&mut sink, &triangle, &Style::default()).unwrap();
        renderer.render(&mut sink, &triangle, &Style::default()).unwrap();
        assert_eq!(sink.len(), 2);
        assert_ne!(sink[0].id, sink[1].id);
        assert_eq!(sink[0].surface, sink[1].surface);
    }

    #[test]
    fn test_surface_size_is_independent_of_aspect() {
        let renderer = OverlayRenderer::default();
        let wide = Polygon::from_pairs(&[(0.0, 0.0), (0.8, 0.05), (0.4, 0.1)]).unwrap();
        let mut sink: Vec<OverlayRegion> = Vec::new();
        renderer.render(&mut sink, &wide, &Style::default()).unwrap();
        assert_eq!(sink[0].surface.size(), SurfaceSize::square(300));
    }

    #[test]
    fn test_placement_json() {
        let renderer = OverlayRenderer::default();
        let triangle = Polygon::from_pairs(&[(0.6, 0.3), (0.75, 0.55), (0.45, 0.55)]).unwrap();
        let mut sink: Vec<OverlayRegion> = Vec::new();
        renderer.render(&mut sink, &triangle, &Style::default()).unwrap();
        let json = serde_json::to_value(sink[0].placement()).unwrap();
        assert_eq!(json["surface"]["width"], 300);
        assert!((json["region"]["min_x"].as_f64().unwrap() - 0.45).abs() < 1e-12);
    }
}
