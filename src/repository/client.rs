// src/repository/client.rs

//! HTTP client for artifact downloads
//!
//! A thin wrapper around reqwest's blocking client. Downloads stream into a
//! temporary file beside the destination and are renamed into place only
//! once the whole body has been received. Failures are reported once; the
//! caller decides whether to run again.

use crate::error::{Error, Result};
use crate::fsutil;
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// User agent sent with every request
pub(crate) const USER_AGENT: &str = concat!("addonrepo/", env!("CARGO_PKG_VERSION"));

/// Stream an HTTP response into a writer
fn stream_response<W: Write>(
    mut response: reqwest::blocking::Response,
    out: &mut W,
    url: &str,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::FetchFailed(format!("Failed to read response from {url}: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        out.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;
        downloaded += bytes_read as u64;
    }

    Ok(downloaded)
}

/// HTTP client for fetching release artifacts
pub struct RepositoryClient {
    client: Client,
}

impl RepositoryClient {
    /// Create a new client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    /// Create a new client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Download `url` to `dest_path`, replacing any existing file
    ///
    /// Returns the number of bytes written. On any failure `dest_path` is
    /// left as it was before the call.
    pub fn download_file(&self, url: &str, dest_path: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest_path.display());

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::FetchFailed(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::FetchFailed(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let mut temp = fsutil::temp_file_beside(dest_path)?;
        let downloaded = stream_response(response, temp.as_file_mut(), url)?;
        temp.as_file_mut()
            .flush()
            .map_err(|e| Error::IoError(format!("Failed to flush download: {e}")))?;
        fsutil::persist(temp, dest_path)?;

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(downloaded)
    }
}
