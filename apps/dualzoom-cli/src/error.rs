use thiserror::Error;

use dualzoom_core::GeometryError;
use dualzoom_io::{DziError, PublishError};
use dualzoom_renderer::RasterError;
use dualzoom_viewer::ConfigError;

/// Everything a `dualzoom` subcommand can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid polygon: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Overlay rendering failed: {0}")]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Dzi(#[from] DziError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage at {url} is not live: {detail}")]
    Unhealthy { url: String, detail: String },

    #[error("{failed} of {total} panel(s) failed to load")]
    PanelsFailed { failed: usize, total: usize },
}
