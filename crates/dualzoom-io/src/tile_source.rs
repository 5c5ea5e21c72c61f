use serde::{Deserialize, Serialize};

use crate::storage::StorageConfig;

/// What a viewer panel loads.
///
/// Serializes the way the browser viewer expects its `tileSources` option:
/// a bare string for a Deep Zoom manifest, or `{"type": "image", "url": ...}`
/// for a single full-resolution image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileSource {
    Manifest(String),
    Single(SingleImage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleImage {
    #[serde(rename = "type")]
    pub kind: SingleImageKind,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleImageKind {
    Image,
}

impl TileSource {
    /// A Deep Zoom descriptor stored under `key` in the bucket.
    pub fn manifest(storage: &StorageConfig, key: &str) -> Self {
        TileSource::Manifest(storage.object_url(key))
    }

    /// A single image stored under `key` in the bucket.
    pub fn single_image(storage: &StorageConfig, key: &str) -> Self {
        TileSource::Single(SingleImage {
            kind: SingleImageKind::Image,
            url: storage.object_url(key),
        })
    }

    pub fn url(&self) -> &str {
        match self {
            TileSource::Manifest(url) => url,
            TileSource::Single(image) => &image.url,
        }
    }

    pub fn is_pyramid(&self) -> bool {
        matches!(self, TileSource::Manifest(_))
    }

    /// The same object key under another storage location.
    ///
    /// `None` when the URL is not inside `from`'s bucket.
    pub fn rebased(&self, from: &StorageConfig, to: &StorageConfig) -> Option<TileSource> {
        let prefix = from.object_url("");
        let key = self.url().strip_prefix(prefix.as_str())?;
        Some(match self {
            TileSource::Manifest(_) => TileSource::manifest(to, key),
            TileSource::Single(_) => TileSource::single_image(to, key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shapes() {
        let storage = StorageConfig::default();
        let dzi = TileSource::manifest(&storage, "sample1.dzi");
        let jpg = TileSource::single_image(&storage, "sample2.jpg");

        assert_eq!(
            serde_json::to_value(&dzi).unwrap(),
            json!("http://localhost:9000/images/sample1.dzi")
        );
        assert_eq!(
            serde_json::to_value(&jpg).unwrap(),
            json!({"type": "image", "url": "http://localhost:9000/images/sample2.jpg"})
        );
    }

    #[test]
    fn test_deserialize_both_forms() {
        let dzi: TileSource = serde_json::from_str(r#""http://x/a.dzi""#).unwrap();
        assert!(dzi.is_pyramid());
        let img: TileSource =
            serde_json::from_str(r#"{"type":"image","url":"http://x/b.jpg"}"#).unwrap();
        assert!(!img.is_pyramid());
        assert_eq!(img.url(), "http://x/b.jpg");
    }

    #[test]
    fn test_rebased_keeps_key_and_kind() {
        let old = StorageConfig::default();
        let new = StorageConfig::new("http://minio:9000/", "slides");

        let dzi = TileSource::manifest(&old, "pyramids/sample1.dzi").rebased(&old, &new).unwrap();
        assert_eq!(dzi.url(), "http://minio:9000/slides/pyramids/sample1.dzi");
        assert!(dzi.is_pyramid());

        let jpg = TileSource::single_image(&old, "sample2.jpg").rebased(&old, &new).unwrap();
        assert_eq!(jpg, TileSource::single_image(&new, "sample2.jpg"));

        let elsewhere = TileSource::Manifest("https://cdn.example.org/a.dzi".into());
        assert!(elsewhere.rebased(&old, &new).is_none());
        // A bucket whose name merely starts with the old one is not inside it.
        let sibling = TileSource::Manifest("http://localhost:9000/images2/a.dzi".into());
        assert!(sibling.rebased(&old, &new).is_none());
    }
}
