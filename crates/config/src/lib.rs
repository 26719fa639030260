//! Layered configuration.
//!
//! Values are merged from, in increasing priority:
//! 1. built-in defaults,
//! 2. a TOML file (an explicit path, or `config.toml` in the platform config
//!    directory if it exists),
//! 3. `THUMBS_`-prefixed environment variables, with `__` separating nested
//!    keys (`THUMBS_CACHE__TTL_SECS=60`).

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thumbs_index::DownloadName;
use thumbs_render::{Filter, RenderSettings};

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "THUMBS_";
const FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "thumbs")
}

fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("/var/lib/thumbs"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub thumbs: ThumbsConfig,
    pub cache: CacheConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory rendered artifacts are written to.
    pub thumbs: PathBuf,
    /// Named roots the index refers to; `/` holds originals.
    pub originals: BTreeMap<String, PathBuf>,
}
impl Default for StorageConfig {
    fn default() -> Self {
        let data = data_dir();
        Self { thumbs: data.join("thumbs"), originals: BTreeMap::from([("/".to_string(), data.join("originals"))]) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub database: PathBuf,
    /// Answer lookups but never mark files missing.
    pub read_only: bool,
}
impl Default for IndexConfig {
    fn default() -> Self {
        Self { database: data_dir().join("index.db"), read_only: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbsConfig {
    /// Largest dimension that is rendered ahead of time and kept in the
    /// artifact store. Larger size classes are uncached.
    pub precached: u32,
    /// Size classes above this are never rendered; the original is served.
    pub max: u32,
    /// Render uncached size classes on request instead of redirecting them to
    /// the largest precomputed class. Also forces every render to start from
    /// the source file.
    pub render_uncached: bool,
    pub quality: u8,
    pub filter: Filter,
}
impl Default for ThumbsConfig {
    fn default() -> Self {
        Self { precached: 2048, max: 7680, render_uncached: false, quality: 90, filter: Filter::default() }
    }
}
impl ThumbsConfig {
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings { max: self.max, quality: self.quality, filter: self.filter }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 15 * 60, capacity: 10_000 }
    }
}
impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub name: DownloadName,
}

impl Config {
    /// Default location of the configuration file, if the platform has one.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Load and validate configuration.
    ///
    /// An explicit `file` must exist; the default file is only merged when
    /// present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                figment = figment.merge(Toml::file(path));
            },
            None => {
                if let Some(path) = Self::default_file().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "Loading default configuration file");
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.storage.thumbs.is_absolute() {
            exn::bail!(ErrorKind::Invalid("storage.thumbs must be an absolute path"));
        }
        if !self.storage.originals.contains_key("/") {
            exn::bail!(ErrorKind::Invalid("storage.originals must define the \"/\" root"));
        }
        if self.storage.originals.values().any(|p| !p.is_absolute()) {
            exn::bail!(ErrorKind::Invalid("storage.originals paths must be absolute"));
        }
        if self.thumbs.precached == 0 || self.thumbs.max == 0 {
            exn::bail!(ErrorKind::Invalid("thumbs.precached and thumbs.max must be positive"));
        }
        if self.thumbs.precached > self.thumbs.max {
            exn::bail!(ErrorKind::Invalid("thumbs.precached must not exceed thumbs.max"));
        }
        if !(1..=100).contains(&self.thumbs.quality) {
            exn::bail!(ErrorKind::Invalid("thumbs.quality must be between 1 and 100"));
        }
        if self.cache.ttl_secs == 0 {
            exn::bail!(ErrorKind::Invalid("cache.ttl_secs must be positive"));
        }
        if self.cache.capacity == 0 {
            exn::bail!(ErrorKind::Invalid("cache.capacity must be positive"));
        }
        Ok(())
    }
}
