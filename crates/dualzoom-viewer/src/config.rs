use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dualzoom_io::{StorageConfig, TileSource};
use dualzoom_renderer::SurfaceSize;

use crate::panel::{default_panels, PanelSpec};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Corner of the viewer the navigator minimap is docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigatorPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Options a viewer instance is constructed with.
///
/// Serializes to the camelCase option object the browser viewer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    /// DOM id of the element the viewer mounts into.
    pub id: String,
    /// Base URL of the viewer's button icons.
    pub prefix_url: String,
    pub tile_sources: TileSource,
    pub show_navigator: bool,
    pub navigator_position: NavigatorPosition,
    pub show_home_control: bool,
    pub show_zoom_control: bool,
    pub show_full_page_control: bool,
    /// Ids of custom button elements. `null` keeps the built-in controls.
    #[serde(default)]
    pub zoom_in_button: Option<String>,
    #[serde(default)]
    pub zoom_out_button: Option<String>,
    #[serde(default)]
    pub home_button: Option<String>,
    #[serde(default)]
    pub full_page_button: Option<String>,
    #[serde(default)]
    pub next_button: Option<String>,
    #[serde(default)]
    pub previous_button: Option<String>,
}

impl ViewerConfig {
    pub const DEFAULT_PREFIX_URL: &'static str =
        "https://cdn.jsdelivr.net/npm/openseadragon@4.1.0/build/openseadragon/images/";

    pub fn new(id: &str, tile_sources: TileSource) -> Self {
        Self {
            id: id.to_string(),
            prefix_url: Self::DEFAULT_PREFIX_URL.to_string(),
            tile_sources,
            show_navigator: true,
            navigator_position: NavigatorPosition::TopRight,
            show_home_control: true,
            show_zoom_control: true,
            show_full_page_control: true,
            zoom_in_button: None,
            zoom_out_button: None,
            home_button: None,
            full_page_button: None,
            next_button: None,
            previous_button: None,
        }
    }

    pub fn with_navigator(mut self, position: Option<NavigatorPosition>) -> Self {
        match position {
            Some(p) => {
                self.show_navigator = true;
                self.navigator_position = p;
            }
            None => self.show_navigator = false,
        }
        self
    }

    /// Structural checks a viewer performs before it starts loading.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() || self.id.chars().any(char::is_whitespace) {
            return Err(format!("viewer element id '{}' is not a valid DOM id", self.id));
        }
        let url = self.tile_sources.url();
        let absolute = url.starts_with("http://") || url.starts_with("https://");
        if !(absolute || url.starts_with('/')) {
            return Err(format!("tile source '{}' is not an http(s) or root-relative URL", url));
        }
        Ok(())
    }
}

/// Page-level configuration: where images live and what the panels show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    /// Overlay raster size shared by every panel.
    #[serde(default)]
    pub surface: SurfaceSize,
    pub panels: Vec<PanelSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        Self {
            panels: default_panels(&storage),
            surface: SurfaceSize::default(),
            storage,
        }
    }
}

impl AppConfig {
    /// Default panels pointed at a different storage location.
    pub fn for_storage(storage: StorageConfig) -> Self {
        Self {
            panels: default_panels(&storage),
            surface: SurfaceSize::default(),
            storage,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!(
            "Loaded config {} ({} panels, storage {}/{})",
            path.display(),
            config.panels.len(),
            config.storage.endpoint,
            config.storage.bucket
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Point at another storage location.
    ///
    /// Panel sources inside the old bucket move with it; sources stored
    /// anywhere else are left alone and logged.
    pub fn retarget_storage(&mut self, storage: StorageConfig) {
        if self.storage.object_url("") == storage.object_url("") {
            self.storage = storage;
            return;
        }
        for panel in &mut self.panels {
            let source = &mut panel.viewer.tile_sources;
            match source.rebased(&self.storage, &storage) {
                Some(moved) => {
                    log::debug!("Panel '{}': {} -> {}", panel.name, source.url(), moved.url());
                    *source = moved;
                }
                None => log::warn!(
                    "Panel '{}' still loads {}, which is outside {}/{}",
                    panel.name,
                    source.url(),
                    storage.endpoint,
                    storage.bucket
                ),
            }
        }
        self.storage = storage;
    }

    /// Browser viewer options for every panel, in panel order.
    pub fn viewer_options(&self) -> Vec<&ViewerConfig> {
        self.panels.iter().map(|p| &p.viewer).collect()
    }
}
