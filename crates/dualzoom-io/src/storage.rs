use std::fmt;

use serde::{Deserialize, Serialize};

/// Access keys for signed writes. Reads stay anonymous.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl StorageCredentials {
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Location of the object-storage bucket that serves images and tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage service, e.g. `http://localhost:9000`.
    pub endpoint: String,
    /// Bucket (container) name.
    pub bucket: String,
    /// Health-check path relative to the endpoint.
    pub liveness_path: String,
    /// Signing region for uploads.
    pub region: String,
    /// Never written back out, so printed configs carry no secrets.
    #[serde(skip_serializing)]
    pub credentials: Option<StorageCredentials>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket: "images".to_string(),
            liveness_path: "minio/health/live".to_string(),
            region: "us-east-1".to_string(),
            credentials: None,
        }
    }
}

impl StorageConfig {
    pub fn new(endpoint: &str, bucket: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, credentials: StorageCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Public URL of an object in the bucket.
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base(),
            self.bucket.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }

    pub fn liveness_url(&self) -> String {
        format!("{}/{}", self.base(), self.liveness_path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage.object_url("sample1.dzi"),
            "http://localhost:9000/images/sample1.dzi"
        );
        assert_eq!(
            storage.liveness_url(),
            "http://localhost:9000/minio/health/live"
        );
    }

    #[test]
    fn test_slashes_are_normalized() {
        let storage = StorageConfig::new("http://minio:9090/", "/tiles/");
        assert_eq!(
            storage.object_url("/sample1_files/0/0_0.jpg"),
            "http://minio:9090/tiles/sample1_files/0/0_0.jpg"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let storage: StorageConfig = serde_json::from_str(r#"{"bucket":"slides"}"#).unwrap();
        assert_eq!(storage.endpoint, "http://localhost:9000");
        assert_eq!(storage.bucket, "slides");
        assert_eq!(storage.region, "us-east-1");
        assert!(storage.credentials.is_none());
    }

    #[test]
    fn test_credentials_are_read_but_never_written() {
        let storage: StorageConfig = serde_json::from_str(
            r#"{"credentials":{"access_key":"minioadmin","secret_key":"minioadmin123"}}"#,
        )
        .unwrap();
        let credentials = storage.credentials.clone().unwrap();
        assert_eq!(credentials.access_key, "minioadmin");
        assert!(!format!("{:?}", credentials).contains("minioadmin123"));

        let json = serde_json::to_string(&storage).unwrap();
        assert!(!json.contains("credentials"));
        assert!(!json.contains("minioadmin123"));
    }
}
