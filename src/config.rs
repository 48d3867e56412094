//! Layered configuration.
//!
//! Values are merged in increasing priority:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config
//!    directory when present)
//! 3. `DEDUP_*` environment variables (`DEDUP_WORKERS=8`, `DEDUP_HASH=sha256`)
//! 4. Command-line flags
//!
//! The result is turned into the [`RunOptions`] the engine consumes.

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::engine::RunOptions;
use crate::error::DedupError;
use crate::scanner::DigestAlgorithm;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DEDUP_";

/// Persistent defaults for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep duplicates instead of deleting them.
    pub keep: bool,
    /// Move unique files into the first directory.
    pub merge: bool,
    /// Descend into nested directories.
    pub recursive: bool,
    /// Never modify the filesystem.
    pub dry_run: bool,
    /// Worker threads; 0 uses the available parallelism.
    pub workers: usize,
    /// Digest algorithm name.
    pub hash: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep: false,
            merge: false,
            recursive: false,
            dry_run: false,
            workers: 0,
            hash: DigestAlgorithm::default().to_string(),
        }
    }
}

impl Config {
    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dedup", "dedup").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with defaults, the config file (if any) and the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load configuration. An explicitly named file must exist; the default
    /// file is optional.
    ///
    /// # Errors
    ///
    /// [`DedupError::ConfigFile`] for a missing explicit file, or a
    /// [`figment::Error`] for values that do not deserialize.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(DedupError::ConfigFile(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(path) = &file {
            log::debug!("Loading config from {}", path.display());
        }
        let config = Self::figment(file.as_deref()).extract()?;
        Ok(config)
    }

    /// Apply command-line flags on top of the loaded values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        self.keep |= cli.keep;
        self.merge |= cli.merge;
        self.recursive |= cli.recursive;
        self.dry_run |= cli.dry_run;
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(hash) = &cli.hash {
            self.hash.clone_from(hash);
        }
    }

    /// Resolve into engine options.
    ///
    /// # Errors
    ///
    /// [`DedupError::UnknownDigest`] if `hash` names no supported algorithm.
    pub fn into_options(self, verbose: bool) -> Result<RunOptions, DedupError> {
        let digest = self.hash.parse::<DigestAlgorithm>()?;
        Ok(RunOptions::default()
            .with_keep(self.keep)
            .with_merge(self.merge)
            .with_recursive(self.recursive)
            .with_verbose(verbose)
            .with_dry_run(self.dry_run)
            .with_workers(self.workers)
            .with_digest(digest))
    }
}
