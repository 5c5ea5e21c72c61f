//! A viewer engine that runs without a browser.
//!
//! It fetches the tile source the way a deep-zoom viewer would (the DZI
//! descriptor for pyramids, the whole file for single images), keeps the
//! overlays it is handed in a spatial index and tracks a pan/zoom
//! viewport so overlay placement can be inspected on screen.

use serde::Serialize;

use dualzoom_core::{NormalizedPoint, OverlayId, OverlayIndex};
use dualzoom_io::{DziDescriptor, TileFetcher, TileSource};
use dualzoom_renderer::{OverlayRegion, OverlaySink, ScreenRect, Viewport};

use crate::config::ViewerConfig;
use crate::engine::{OpenOutcome, ViewerEngine, ViewerError, ViewerHandle};

/// What the viewer learned about the opened image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Highest pyramid level; `None` for single images.
    pub max_level: Option<u32>,
}

impl ImageInfo {
    /// Height over width, as the viewport expects it.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            1.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        }
    }
}

/// An overlay as currently laid out on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibleOverlay {
    pub id: OverlayId,
    pub screen: ScreenRect,
}

#[derive(Debug)]
pub struct HeadlessViewer {
    config: ViewerConfig,
    image: Option<ImageInfo>,
    overlays: Vec<OverlayRegion>,
    index: OverlayIndex,
    viewport: Viewport,
}

impl HeadlessViewer {
    fn new(config: ViewerConfig, canvas: (f64, f64)) -> Self {
        Self {
            config,
            image: None,
            overlays: Vec::new(),
            index: OverlayIndex::new(),
            viewport: Viewport::new(canvas.0, canvas.1, 1.0),
        }
    }

    /// `None` until the image has opened.
    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn overlays(&self) -> &[OverlayRegion] {
        &self.overlays
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&OverlayRegion> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Overlays intersecting the visible part of the image, with their
    /// on-screen rectangles.
    pub fn visible_overlays(&self) -> Vec<VisibleOverlay> {
        let bounds = self.viewport.visible_bounds();
        self.index
            .query_region(&bounds)
            .into_iter()
            .map(|entry| VisibleOverlay {
                id: entry.overlay_id,
                screen: self.viewport.project(&entry.bbox),
            })
            .collect()
    }

    /// Overlays whose anchor region covers the given canvas position.
    pub fn overlays_at(&self, screen_x: f64, screen_y: f64) -> Vec<OverlayId> {
        let point: NormalizedPoint = self.viewport.screen_to_image(screen_x, screen_y);
        self.index
            .query_point(&point)
            .into_iter()
            .map(|entry| entry.overlay_id)
            .collect()
    }

    /// Pyramid level a browser viewer would draw at the current zoom.
    pub fn current_level(&self) -> Option<u32> {
        let image = self.image?;
        image
            .max_level
            .map(|max| self.viewport.pyramid_level(image.width, max))
    }

    fn opened(&mut self, info: ImageInfo) {
        self.image = Some(info);
        self.viewport.aspect = info.aspect();
        self.viewport.home();
    }
}

impl OverlaySink for HeadlessViewer {
    fn add_overlay(&mut self, overlay: OverlayRegion) {
        self.index.insert(overlay.id, overlay.region);
        self.overlays.push(overlay);
    }
}

impl ViewerHandle for HeadlessViewer {
    fn config(&self) -> &ViewerConfig {
        &self.config
    }

    fn overlay_count(&self) -> usize {
        self.overlays.len()
    }
}

pub struct HeadlessEngine<F: TileFetcher> {
    fetcher: F,
    canvas: (f64, f64),
}

impl<F: TileFetcher> HeadlessEngine<F> {
    pub const DEFAULT_CANVAS: (f64, f64) = (800.0, 600.0);

    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            canvas: Self::DEFAULT_CANVAS,
        }
    }

    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas = (width, height);
        self
    }

    fn open(&self, source: &TileSource) -> Result<ImageInfo, String> {
        let bytes = self.fetcher.fetch(source.url()).map_err(|e| e.to_string())?;
        match source {
            TileSource::Manifest(_) => {
                let descriptor = DziDescriptor::parse_bytes(&bytes).map_err(|e| e.to_string())?;
                Ok(ImageInfo {
                    width: descriptor.width,
                    height: descriptor.height,
                    max_level: Some(descriptor.max_level()),
                })
            }
            TileSource::Single(_) => {
                let size = imagesize::blob_size(&bytes).map_err(|e| format!("unreadable image: {}", e))?;
                let width = u32::try_from(size.width).map_err(|_| "image too wide".to_string())?;
                let height = u32::try_from(size.height).map_err(|_| "image too tall".to_string())?;
                Ok(ImageInfo {
                    width,
                    height,
                    max_level: None,
                })
            }
        }
    }
}

impl<F: TileFetcher> ViewerEngine for HeadlessEngine<F> {
    type Handle = HeadlessViewer;

    fn construct(&mut self, config: &ViewerConfig) -> Result<HeadlessViewer, ViewerError> {
        config.validate().map_err(ViewerError::InvalidConfig)?;
        Ok(HeadlessViewer::new(config.clone(), self.canvas))
    }

    fn resolve(&mut self, handle: &mut HeadlessViewer) -> OpenOutcome {
        match self.open(&handle.config.tile_sources) {
            Ok(info) => {
                log::debug!(
                    "#{} opened {}x{} image",
                    handle.config.id,
                    info.width,
                    info.height
                );
                handle.opened(info);
                OpenOutcome::Loaded
            }
            Err(reason) => OpenOutcome::failed(reason),
        }
    }
}
