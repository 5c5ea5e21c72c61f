use thiserror::Error;

use dualzoom_renderer::OverlaySink;

use crate::config::ViewerConfig;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid viewer configuration: {0}")]
    InvalidConfig(String),

    #[error("Viewer engine error: {0}")]
    Engine(String),
}

/// Terminal result of opening a viewer's image. Each handle yields one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Loaded,
    Failed { reason: String },
}

impl OpenOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        OpenOutcome::Failed { reason: reason.into() }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, OpenOutcome::Loaded)
    }
}

/// A constructed viewer instance.
///
/// Overlays are only registered after the handle's image opened.
pub trait ViewerHandle: OverlaySink {
    fn config(&self) -> &ViewerConfig;

    fn overlay_count(&self) -> usize;
}

/// The deep-zoom viewer capability: construct a viewer, then learn
/// whether its image opened.
pub trait ViewerEngine {
    type Handle: ViewerHandle;

    fn construct(&mut self, config: &ViewerConfig) -> Result<Self::Handle, ViewerError>;

    /// Drive `handle` until its image either opens or fails to.
    fn resolve(&mut self, handle: &mut Self::Handle) -> OpenOutcome;
}
