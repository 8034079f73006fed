//! Remote template fetcher
//!
//! Non-interactive runs (`curl ... | sh` style) download the latest template
//! sources into a temporary directory. Every failure is recorded and the
//! renderer falls back to the embedded copy.

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::error::{GantryError, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Whether templates should be fetched this run
pub fn should_fetch(interactive: bool, offline: bool) -> bool {
    !interactive && !offline
}

/// Downloaded templates
#[derive(Debug)]
pub struct FetchReport {
    dir: TempDir,
    /// File names downloaded
    pub fetched: Vec<String>,
    /// Per-file failures (all `NetworkFetchFailed`)
    pub failures: Vec<GantryError>,
}

impl FetchReport {
    /// Directory holding the downloaded files
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Fetches template sources over HTTP
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    base_url: String,
}

impl RemoteFetcher {
    /// Create a fetcher for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("gantry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GantryError::other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL for a template file
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, file_name)
    }

    /// Fetch a single file
    pub fn fetch(&self, file_name: &str) -> Result<String> {
        let url = self.url_for(file_name);
        let failed = |reason: String| GantryError::NetworkFetchFailed {
            url: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        response.text().map_err(|e| failed(e.to_string()))
    }

    /// Fetch every file into a fresh temporary directory
    #[instrument(skip(self, file_names), fields(base_url = %self.base_url, files = file_names.len()))]
    pub fn fetch_all(&self, file_names: &[&str]) -> Result<FetchReport> {
        let start = Instant::now();
        let dir = TempDir::new()?;
        let mut fetched = Vec::new();
        let mut failures = Vec::new();

        for name in file_names {
            match self.fetch(name) {
                Ok(content) => {
                    std::fs::write(dir.path().join(name), content)?;
                    debug!(file = name, "fetched template");
                    fetched.push(name.to_string());
                }
                Err(e) => {
                    warn!(file = name, error = %e, "template fetch failed, using built-in copy");
                    failures.push(e);
                }
            }
        }

        info!(
            fetched = fetched.len(),
            failed = failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "remote templates fetched"
        );

        Ok(FetchReport {
            dir,
            fetched,
            failures,
        })
    }
}
