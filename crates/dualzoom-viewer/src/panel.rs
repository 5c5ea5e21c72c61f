use serde::{Deserialize, Serialize};

use dualzoom_core::{Polygon, Style};
use dualzoom_io::{StorageConfig, TileSource};

use crate::config::ViewerConfig;

pub const PYRAMID_SOURCE_KEY: &str = "sample1.dzi";
pub const SINGLE_IMAGE_KEY: &str = "sample2.jpg";

/// Status texts a panel shows for each terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessages {
    pub loaded: String,
    pub failed: String,
    /// Shown when the viewer could not even be constructed.
    pub init_failed: String,
}

/// A named polygon drawn on a panel once its image is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub name: String,
    pub polygon: Polygon,
    pub style: Style,
}

/// One viewer panel: its viewer options, status element and overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub name: String,
    pub status_element: String,
    pub viewer: ViewerConfig,
    pub messages: StatusMessages,
    #[serde(default)]
    pub overlays: Vec<OverlaySpec>,
}

const DIAMOND: [(f64, f64); 4] = [(0.25, 0.4), (0.35, 0.5), (0.25, 0.6), (0.15, 0.5)];
const TRIANGLE: [(f64, f64); 3] = [(0.6, 0.3), (0.75, 0.55), (0.45, 0.55)];

/// The red diamond and the blue triangle every panel carries.
pub fn default_overlays() -> Vec<OverlaySpec> {
    let shapes: [(&str, &[(f64, f64)], Style); 2] = [
        ("diamond", &DIAMOND, Style::tinted(255, 0, 0, 0.3)),
        ("triangle", &TRIANGLE, Style::tinted(0, 0, 255, 0.3)),
    ];

    shapes
        .into_iter()
        .filter_map(|(name, points, style)| match Polygon::from_pairs(points) {
            Ok(polygon) => Some(OverlaySpec {
                name: name.to_string(),
                polygon,
                style,
            }),
            Err(e) => {
                log::error!("Built-in overlay '{}' rejected: {}", name, e);
                None
            }
        })
        .collect()
}

pub fn pyramid_panel(storage: &StorageConfig) -> PanelSpec {
    PanelSpec {
        name: "dzi".to_string(),
        status_element: "dzi-status".to_string(),
        viewer: ViewerConfig::new("dzi-viewer", TileSource::manifest(storage, PYRAMID_SOURCE_KEY)),
        messages: StatusMessages {
            loaded: "DZI loaded successfully!".to_string(),
            failed: "Failed to load DZI. Check if image processing completed.".to_string(),
            init_failed: "Error initializing DZI viewer".to_string(),
        },
        overlays: default_overlays(),
    }
}

pub fn single_image_panel(storage: &StorageConfig) -> PanelSpec {
    PanelSpec {
        name: "regular".to_string(),
        status_element: "regular-status".to_string(),
        viewer: ViewerConfig::new("regular-viewer", TileSource::single_image(storage, SINGLE_IMAGE_KEY)),
        messages: StatusMessages {
            loaded: "Regular image loaded successfully!".to_string(),
            failed: "Failed to load regular image from MinIO.".to_string(),
            init_failed: "Error initializing regular image viewer".to_string(),
        },
        overlays: default_overlays(),
    }
}

/// Pyramid panel first, single-image panel second.
pub fn default_panels(storage: &StorageConfig) -> Vec<PanelSpec> {
    vec![pyramid_panel(storage), single_image_panel(storage)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualzoom_core::BoundingBox;

    #[test]
    fn test_default_overlays() {
        let overlays = default_overlays();
        assert_eq!(overlays.len(), 2);

        let diamond = &overlays[0];
        assert_eq!(diamond.name, "diamond");
        let bbox = diamond.polygon.bbox();
        let expected = BoundingBox::new(0.15, 0.4, 0.2, 0.2);
        assert!((bbox.min_x - expected.min_x).abs() < 1e-12);
        assert!((bbox.width - expected.width).abs() < 1e-12);
        assert_eq!((diamond.style.fill.r, diamond.style.fill.b), (255, 0));
        assert_eq!(diamond.style.fill.a, 0.3);

        let triangle = &overlays[1];
        assert_eq!(triangle.polygon.vertex_count(), 3);
        let bbox = triangle.polygon.bbox();
        assert!((bbox.min_x - 0.45).abs() < 1e-12);
        assert!((bbox.height - 0.25).abs() < 1e-12);
        assert_eq!(triangle.style.stroke.to_rgba8(), [0, 0, 255, 255]);
    }

    #[test]
    fn test_default_panels() {
        let panels = default_panels(&StorageConfig::default());
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].viewer.id, "dzi-viewer");
        assert!(panels[0].viewer.tile_sources.is_pyramid());
        assert_eq!(panels[1].viewer.id, "regular-viewer");
        assert_eq!(
            panels[1].viewer.tile_sources.url(),
            "http://localhost:9000/images/sample2.jpg"
        );
        assert_eq!(panels[1].messages.failed, "Failed to load regular image from MinIO.");
    }

    #[test]
    fn test_panel_json_rejects_degenerate_overlay() {
        let mut value = serde_json::to_value(pyramid_panel(&StorageConfig::default())).unwrap();
        value["overlays"][0]["polygon"] = serde_json::json!([
            {"x": 0.1, "y": 0.1}, {"x": 0.2, "y": 0.1}, {"x": 0.3, "y": 0.1}
        ]);
        assert!(serde_json::from_value::<PanelSpec>(value).is_err());
    }
}
