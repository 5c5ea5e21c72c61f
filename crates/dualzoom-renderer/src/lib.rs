//! # Dualzoom Renderer
//!
//! Turns overlay polygons into fixed-size RGBA surfaces and hands them to a
//! viewer for compositing. Also owns the viewport math a viewer uses to keep
//! those surfaces anchored to image coordinates while the user pans and zooms.

pub mod raster;
pub mod overlay;
pub mod viewport;

pub use raster::{rasterize, RasterError, RasterSurface, SurfaceSize};
pub use overlay::{OverlayPlacement, OverlayRegion, OverlayRenderer, OverlaySink};
pub use viewport::{ScreenRect, Viewport};
