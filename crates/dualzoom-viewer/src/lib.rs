//! # Dualzoom viewer
//!
//! Bootstraps the side-by-side viewer page: one panel over a Deep Zoom
//! pyramid, one over a single full-resolution image. Each panel is
//! constructed from its [`ViewerConfig`], waits for exactly one
//! [`OpenOutcome`] and then either reports success and draws its polygon
//! overlays or reports failure and draws nothing.

pub mod status;
pub mod config;
pub mod panel;
pub mod engine;
pub mod bootstrap;
pub mod headless;

pub use status::{StatusClass, StatusIndicator};
pub use config::{AppConfig, ConfigError, NavigatorPosition, ViewerConfig};
pub use panel::{default_overlays, default_panels, OverlaySpec, PanelSpec, StatusMessages};
pub use engine::{OpenOutcome, ViewerEngine, ViewerError, ViewerHandle};
pub use bootstrap::{Bootstrapper, Panel, PanelId, PanelReport, PanelState};
pub use headless::{HeadlessEngine, HeadlessViewer, ImageInfo, VisibleOverlay};
