//! Server configuration.
//!
//! Precedence per setting: CLI flag, then environment variable, then
//! default. Environment variables: `VIDEOS_DIR`, `PORT`, `DATA_DIR`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_VIDEOS_DIR: &str = "videos";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Library root; every browse/stream path resolves under this.
    pub root: PathBuf,
    /// Parent directory for generated artifacts.
    pub data_dir: PathBuf,
    /// Directory of static frontend assets.
    pub static_dir: PathBuf,
}

impl Config {
    /// Resolve configuration from CLI overrides, the environment, and
    /// defaults.
    ///
    /// The default library root (`videos/` under the working directory) is
    /// created if absent. An explicitly configured root that does not exist
    /// is an error instead, since silently creating it would hide a typo.
    pub fn resolve(
        root: Option<PathBuf>,
        port: Option<u16>,
        host: Option<String>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match port {
            Some(p) => p,
            None => match env::var("PORT") {
                Ok(raw) => raw
                    .parse::<u16>()
                    .with_context(|| format!("invalid PORT value: {raw:?}"))?,
                Err(_) => DEFAULT_PORT,
            },
        };

        let (root, explicit) = match root {
            Some(r) => (r, true),
            None => match env::var("VIDEOS_DIR") {
                Ok(dir) => (PathBuf::from(dir), true),
                Err(_) => (PathBuf::from(DEFAULT_VIDEOS_DIR), false),
            },
        };
        let root = absolutize(&root)?;
        if !root.is_dir() {
            if explicit {
                bail!("videos directory does not exist: {}", root.display());
            }
            std::fs::create_dir_all(&root)
                .with_context(|| format!("creating videos directory {}", root.display()))?;
        }

        let data_dir = data_dir
            .or_else(|| env::var("DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let data_dir = absolutize(&data_dir)?;

        let static_dir = absolutize(Path::new("web/static"))?;

        Ok(Self {
            host,
            port,
            root,
            data_dir,
            static_dir,
        })
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.data_dir.join("thumbnails")
    }

    pub fn subtitles_dir(&self) -> PathBuf {
        self.data_dir.join("subtitles")
    }

    /// Create the artifact directories if missing.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [self.thumbnails_dir(), self.subtitles_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }
        Ok(())
    }
}

fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("cannot determine working directory")?;
    Ok(cwd.join(path))
}
