use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Retrieves raw bytes for a tile source, descriptor or image.
pub trait TileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP(S) fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_body: u64,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Full-resolution images can be large; descriptors are tiny.
    pub const DEFAULT_MAX_BODY: u64 = 512 * 1024 * 1024;

    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: agent_with_timeout(timeout, true),
            max_body: Self::DEFAULT_MAX_BODY,
        }
    }

    pub fn with_max_body(mut self, max_body: u64) -> Self {
        self.max_body = max_body;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl TileFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("GET {}", url);
        let mut response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            other => FetchError::Transport {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;

        response
            .body_mut()
            .with_config()
            .limit(self.max_body)
            .read_to_vec()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

/// Agent shared by every HTTP client in this crate.
///
/// With `http_status_as_error` off, non-2xx answers come back as responses
/// instead of `ureq::Error::StatusCode`.
pub(crate) fn agent_with_timeout(timeout: Duration, http_status_as_error: bool) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(http_status_as_error)
        .build();
    config.into()
}
