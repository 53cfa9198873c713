use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

pub const BURGER_DATA_PATH: &str = "data/burger-of-the-day.json";
pub const TVMAZE_DATA_PATH: &str = "data/tvmaze-episodes.json";
pub const CONTEXT_DATA_PATH: &str = "data/burger-of-the-day-context.json";

/// Failure to obtain one document. Cloneable so a single failed build can be
/// reported to every caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to load {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to load {url}: not found")]
    Missing { url: String },

    #[error("Failed to load {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Missing { .. } | Self::Status { status: 404, .. }
        )
    }
}

/// Where the data documents live. Paths are relative to the site root,
/// e.g. [`BURGER_DATA_PATH`].
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    /// Human-readable location of `path`, used in error messages.
    fn describe(&self, path: &str) -> String;
}

pub async fn fetch_json<T: DeserializeOwned>(
    source: &dyn DataSource,
    path: &str,
) -> Result<T, FetchError> {
    let bytes = source.fetch(path).await?;
    serde_json::from_slice(&bytes).map_err(|err| FetchError::Parse {
        url: source.describe(path),
        message: err.to_string(),
    })
}

/// Documents served over HTTP below a base URL (the deployed site root).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: String,
}

impl HttpSource {
    pub fn new(base: &Url) -> anyhow::Result<Self> {
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("data source url must be http/https: {base}");
        }
        let client = reqwest::Client::builder()
            .build()
            .context("build data http client")?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: &Url) -> Self {
        Self {
            client,
            base: base.as_str().trim_end_matches('/').to_owned(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path);
        tracing::debug!(%url, "fetching data document");

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, concat!("botd/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|err| FetchError::Transport {
            url: url.clone(),
            message: format!("read body: {err}"),
        })?;
        Ok(body.to_vec())
    }

    fn describe(&self, path: &str) -> String {
        self.url_for(path)
    }
}

/// Documents read from a local directory laid out like the site root.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, path: &str) -> PathBuf {
        path.trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl DataSource for DirSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let file = self.path_for(path);
        tracing::debug!(path = %file.display(), "reading data document");

        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(FetchError::Missing {
                url: file.display().to_string(),
            }),
            Err(err) => Err(FetchError::Transport {
                url: file.display().to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn describe(&self, path: &str) -> String {
        self.path_for(path).display().to_string()
    }
}
