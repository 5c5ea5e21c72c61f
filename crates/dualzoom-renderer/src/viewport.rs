use serde::{Deserialize, Serialize};

use dualzoom_core::{BoundingBox, NormalizedPoint};

/// Represents the current pan/zoom state of a viewer panel.
///
/// Positions are in normalized image coordinates. Because both axes of that
/// space span `[0, 1]`, the image aspect ratio is needed to keep pixels square
/// on screen: one unit of y covers `aspect` times as many pixels as one unit of x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Center X in normalized image coordinates.
    pub center_x: f64,
    /// Center Y in normalized image coordinates.
    pub center_y: f64,
    /// Zoom level (screen pixels per image width).
    pub zoom: f64,
    /// Image height divided by image width.
    pub aspect: f64,
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
}

/// A rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    const MIN_ZOOM: f64 = 1e-3;
    const MAX_ZOOM: f64 = 1e7;

    /// A viewport showing the whole image, centered.
    pub fn new(canvas_width: f64, canvas_height: f64, aspect: f64) -> Self {
        let mut vp = Self {
            center_x: 0.5,
            center_y: 0.5,
            zoom: 1.0,
            aspect,
            canvas_width,
            canvas_height,
        };
        vp.home();
        vp
    }

    /// Pan the viewport by a delta in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center_x -= dx / self.zoom;
        self.center_y -= dy / (self.zoom * self.aspect);
    }

    /// Zoom in/out centered on a screen position.
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, factor: f64) {
        let before = self.screen_to_image(screen_x, screen_y);

        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);

        // Keep the image point under the cursor fixed
        let after = self.screen_to_image(screen_x, screen_y);
        self.center_x -= after.x - before.x;
        self.center_y -= after.y - before.y;
    }

    /// Zoom so that `region` fills the canvas, centered.
    pub fn fit(&mut self, region: &BoundingBox) {
        if region.is_degenerate() {
            return;
        }
        let center = region.center();
        self.center_x = center.x;
        self.center_y = center.y;

        let zoom_x = self.canvas_width / region.width;
        let zoom_y = self.canvas_height / (region.height * self.aspect);
        self.zoom = zoom_x.min(zoom_y);
    }

    /// Show the full image.
    pub fn home(&mut self) {
        self.fit(&BoundingBox::unit());
    }

    pub fn screen_to_image(&self, screen_x: f64, screen_y: f64) -> NormalizedPoint {
        NormalizedPoint::new(
            (screen_x - self.canvas_width / 2.0) / self.zoom + self.center_x,
            (screen_y - self.canvas_height / 2.0) / (self.zoom * self.aspect) + self.center_y,
        )
    }

    pub fn image_to_screen(&self, point: &NormalizedPoint) -> (f64, f64) {
        (
            (point.x - self.center_x) * self.zoom + self.canvas_width / 2.0,
            (point.y - self.center_y) * self.zoom * self.aspect + self.canvas_height / 2.0,
        )
    }

    /// Screen rectangle an overlay anchored at `region` is stretched into.
    pub fn project(&self, region: &BoundingBox) -> ScreenRect {
        let (x, y) = self.image_to_screen(&region.min());
        ScreenRect {
            x,
            y,
            width: region.width * self.zoom,
            height: region.height * self.zoom * self.aspect,
        }
    }

    /// The visible part of image space.
    pub fn visible_bounds(&self) -> BoundingBox {
        let min = self.screen_to_image(0.0, 0.0);
        let max = self.screen_to_image(self.canvas_width, self.canvas_height);
        BoundingBox::from_corners(min, max)
    }

    /// Deep Zoom level to draw for an image `image_width` pixels wide whose
    /// pyramid tops out at `max_level`.
    ///
    /// Picks the smallest level whose resolution still covers the on-screen
    /// width, so tiles are never upscaled.
    pub fn pyramid_level(&self, image_width: u32, max_level: u32) -> u32 {
        if image_width == 0 || self.zoom >= f64::from(image_width) {
            return max_level;
        }
        let ratio = f64::from(image_width) / self.zoom;
        let drop = ratio.log2().floor().max(0.0) as u32;
        max_level.saturating_sub(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_home_fits_square_image() {
        let vp = Viewport::new(800.0, 600.0, 1.0);
        assert!(approx(vp.zoom, 600.0));
        let b = vp.visible_bounds();
        assert!(approx(b.min_y, 0.0));
        assert!(approx(b.height, 1.0));
        assert!(b.width > 1.0);
    }

    #[test]
    fn test_roundtrip_screen_image() {
        let mut vp = Viewport::new(1000.0, 500.0, 0.75);
        vp.zoom_at(300.0, 200.0, 2.5);
        vp.pan(40.0, -15.0);
        let p = NormalizedPoint::new(0.3, 0.6);
        let (sx, sy) = vp.image_to_screen(&p);
        let q = vp.screen_to_image(sx, sy);
        assert!(approx(p.x, q.x));
        assert!(approx(p.y, q.y));
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut vp = Viewport::new(800.0, 800.0, 1.0);
        let before = vp.screen_to_image(200.0, 600.0);
        vp.zoom_at(200.0, 600.0, 4.0);
        let after = vp.screen_to_image(200.0, 600.0);
        assert!(approx(before.x, after.x));
        assert!(approx(before.y, after.y));
        assert!(approx(vp.zoom, 3200.0));
    }

    #[test]
    fn test_project_overlay_region() {
        let vp = Viewport::new(1000.0, 1000.0, 1.0);
        let diamond = BoundingBox::new(0.15, 0.4, 0.2, 0.2);
        let r = vp.project(&diamond);
        assert!(approx(r.x, 150.0));
        assert!(approx(r.y, 400.0));
        assert!(approx(r.width, 200.0));
        assert!(approx(r.height, 200.0));
    }

    #[test]
    fn test_project_respects_aspect() {
        // 2:1 landscape image; a square region in normalized space is wide on screen.
        let vp = Viewport::new(1000.0, 500.0, 0.5);
        assert!(approx(vp.zoom, 1000.0));
        let r = vp.project(&BoundingBox::new(0.0, 0.0, 0.5, 0.5));
        assert!(approx(r.width, 500.0));
        assert!(approx(r.height, 250.0));
    }

    #[test]
    fn test_pyramid_level_selection() {
        let mut vp = Viewport::new(512.0, 512.0, 1.0);
        // 4096 px image, max level 12: showing 512 px across drops 3 levels.
        assert_eq!(vp.pyramid_level(4096, 12), 9);
        vp.zoom_at(256.0, 256.0, 8.0);
        assert_eq!(vp.pyramid_level(4096, 12), 12);
        vp.zoom_at(256.0, 256.0, 4.0);
        assert_eq!(vp.pyramid_level(4096, 12), 12);
    }
}
