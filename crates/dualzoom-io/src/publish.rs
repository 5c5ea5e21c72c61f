use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings,
    UriPathNormalizationMode,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use thiserror::Error;
use walkdir::WalkDir;

use crate::fetch::agent_with_timeout;
use crate::storage::{StorageConfig, StorageCredentials};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },
}

/// Destination for published objects.
pub trait ObjectSink {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), PublishError>;
}

/// Uploads objects with `PUT {endpoint}/{bucket}/{key}` requests.
///
/// With credentials configured every request carries an S3 SigV4
/// `Authorization` header; without them the PUT is anonymous and only
/// succeeds against buckets whose policy allows public writes.
pub struct HttpObjectSink {
    storage: StorageConfig,
    agent: ureq::Agent,
}

impl HttpObjectSink {
    pub fn new(storage: StorageConfig, timeout: Duration) -> Self {
        Self {
            storage,
            agent: agent_with_timeout(timeout, true),
        }
    }
}

impl ObjectSink for HttpObjectSink {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), PublishError> {
        let url = self.storage.object_url(key);
        let upload_error = |message: String| PublishError::Upload {
            key: key.to_string(),
            message,
        };

        let mut request = self.agent.put(&url).header("Content-Type", content_type);
        if let Some(credentials) = &self.storage.credentials {
            let headers = sign_put(
                credentials,
                &self.storage.region,
                &url,
                body,
                content_type,
                SystemTime::now(),
            )
            .map_err(upload_error)?;
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }
        request.send(body).map_err(|e| upload_error(e.to_string()))?;
        Ok(())
    }
}

/// SigV4 headers (`authorization`, `x-amz-date`, `x-amz-content-sha256`)
/// for an S3 `PUT` of `body` to `url`.
fn sign_put(
    credentials: &StorageCredentials,
    region: &str,
    url: &str,
    body: &[u8],
    content_type: &str,
    time: SystemTime,
) -> Result<Vec<(String, String)>, String> {
    let identity: Identity = Credentials::new(
        &credentials.access_key,
        &credentials.secret_key,
        None,
        None,
        "dualzoom-config",
    )
    .into();

    // S3 signs the path as sent and wants the payload hash as a header.
    let mut settings = SigningSettings::default();
    settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
    settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;

    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("s3")
        .time(time)
        .settings(settings)
        .build()
        .map_err(|e| format!("invalid signing parameters: {}", e))?
        .into();

    let request = SignableRequest::new(
        "PUT",
        url,
        [("content-type", content_type)].into_iter(),
        SignableBody::Bytes(body),
    )
    .map_err(|e| format!("cannot sign request: {}", e))?;

    let (instructions, _signature) = sign(request, &params)
        .map_err(|e| format!("cannot sign request: {}", e))?
        .into_parts();
    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

/// Summary of a publish run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub objects: usize,
    pub bytes: u64,
}

/// MIME type for the files a pyramid consists of.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "dzi" | "xml" => "application/xml",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Object key for `path` relative to `root`, always `/`-separated.
fn object_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

/// Upload every file under `root` to `sink`, keyed by its relative path.
///
/// Files are visited in sorted order so repeated runs upload identically.
pub fn publish_dir<S: ObjectSink + ?Sized>(sink: &S, root: &Path) -> Result<PublishReport, PublishError> {
    let mut report = PublishReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| PublishError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(key) = object_key(root, path) else {
            continue;
        };
        let body = fs::read(path)?;
        log::info!("Uploading {} ({} bytes)", key, body.len());
        sink.put(&key, &body, content_type(path))?;

        report.objects += 1;
        report.bytes += body.len() as u64;
    }

    log::info!(
        "Published {} objects ({} bytes) from {}",
        report.objects,
        report.bytes,
        root.display()
    );
    Ok(report)
}
