use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use url::Url;

use crate::loader::BurgerDataLoader;
use crate::source::{DataSource, DirSource, HttpSource};

pub const SOURCE_ENV: &str = "BOTD_SOURCE";
pub const DEFAULT_SOURCE: &str = "public";

/// Site root that holds the `data/` documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Http(Url),
    Dir(PathBuf),
}

impl SourceLocation {
    /// `--source` flag, then `$BOTD_SOURCE`, then `public`.
    pub fn resolve(flag: Option<&str>) -> anyhow::Result<Self> {
        let env = std::env::var(SOURCE_ENV).ok();
        Self::resolve_from(flag, env.as_deref())
    }

    fn resolve_from(flag: Option<&str>, env: Option<&str>) -> anyhow::Result<Self> {
        let raw = [flag, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or(DEFAULT_SOURCE);
        Self::parse(raw)
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).with_context(|| format!("parse source url: {raw}"))?;
            return Ok(Self::Http(url));
        }
        Ok(Self::Dir(PathBuf::from(raw)))
    }

    pub fn data_source(&self) -> anyhow::Result<Arc<dyn DataSource>> {
        Ok(match self {
            Self::Http(url) => Arc::new(HttpSource::new(url)?),
            Self::Dir(path) => Arc::new(DirSource::new(path.clone())),
        })
    }

    pub fn loader(&self) -> anyhow::Result<BurgerDataLoader> {
        Ok(BurgerDataLoader::new(self.data_source()?))
    }
}
