use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::unsync::OnceCell;
use reqwest::blocking::Client;

use super::decode::{decode_bytes, decode_source, PcmBuffer};
use crate::error::{ChartError, Result};

const USER_AGENT: &str = concat!("beatchart/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a track's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioSource {
    Path(PathBuf),
    Url(String),
}

impl AudioSource {
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AudioSource::Url(input.to_string())
        } else {
            AudioSource::Path(PathBuf::from(input))
        }
    }

    /// Container hint taken from the path or the last URL segment.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            AudioSource::Path(p) => p.file_name()?.to_str()?.to_string(),
            AudioSource::Url(u) => url_file_name(u)?.to_string(),
        };
        Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Human-readable title: the file stem without extension.
    pub fn title(&self) -> String {
        let name = match self {
            AudioSource::Path(p) => p.file_name().and_then(|n| n.to_str()).map(str::to_string),
            AudioSource::Url(u) => url_file_name(u).map(str::to_string),
        };
        name.as_deref()
            .and_then(|n| Path::new(n).file_stem())
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("untitled")
            .to_string()
    }
}

fn url_file_name(url: &str) -> Option<&str> {
    let rest = url.split(['?', '#']).next()?;
    let rest = rest.split_once("://").map_or(rest, |(_, r)| r);
    // Drop the host; only path segments can name a file
    let (_, path) = rest.split_once('/')?;
    path.rsplit('/').find(|s| !s.is_empty())
}

/// Acquisition handle. The HTTP client is created on the first URL fetch and
/// reused by every later fetch through the same context.
#[derive(Default)]
pub struct AudioContext {
    client: OnceCell<Client>,
}

impl AudioContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client> {
        self.client.get_or_try_init(|| {
            log::debug!("Creating HTTP client");
            Client::builder()
                .user_agent(USER_AGENT)
                .timeout(FETCH_TIMEOUT)
                .build()
                .map_err(ChartError::HttpClient)
        })
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Fetching {}", url);
        let fetch_err = |source| ChartError::Fetch {
            url: url.to_string(),
            source,
        };

        let resp = self.client()?.get(url).send().map_err(fetch_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChartError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let bytes = resp.bytes().map_err(fetch_err)?;
        log::debug!("Fetched {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Acquire and decode a track. Any failure here is terminal for the run.
    pub fn load(&self, source: &AudioSource) -> Result<PcmBuffer> {
        let ext = source.extension();
        match source {
            AudioSource::Url(url) => {
                let bytes = self.fetch(url)?;
                decode_bytes(bytes, ext.as_deref())
            }
            AudioSource::Path(path) => {
                let file = std::fs::File::open(path).map_err(|source| ChartError::Io {
                    path: path.clone(),
                    source,
                })?;
                decode_source(Box::new(file), ext.as_deref())
            }
        }
    }
}
