//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `--config <path>` (must exist)
//! 2. `$MIRRORSYNC_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/mirrorsync/config.toml`
//! 4. `~/.mirrorsync/config.toml`
//!
//! A missing file is not an error; the configuration is then empty.
//!
//! # Example
//!
//! ```no_run
//! use mirrorsync::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! for repo in result.config.repos() {
//!     println!("{}: {} -> {}", repo.name, repo.public, repo.private);
//! }
//! ```

pub mod schema;

pub use schema::{MirrorConfig, RepoEntry};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MIRRORSYNC_CONFIG";

/// Default remote-tracking namespace for destination refs.
pub const DEFAULT_DEST_NAMESPACE: &str = "private";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown repository '{0}' (see `mirrorsync list`)")]
    UnknownRepo(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The file that triggered the warning, when known.
    pub path: Option<PathBuf>,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: MirrorConfig,
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// `explicit` is the `--config` flag; when given, the file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::locate(
                std::env::var_os(CONFIG_ENV).map(PathBuf::from),
                std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
                dirs::home_dir(),
            ),
        };

        let Some(path) = path else {
            return Ok(ConfigLoadResult {
                config: Config::default(),
                warnings: Vec::new(),
            });
        };

        let file = Self::read_file(&path)?;
        let warnings = file
            .validate()?
            .into_iter()
            .map(|w| ConfigWarning {
                path: Some(path.clone()),
                ..w
            })
            .collect();

        Ok(ConfigLoadResult {
            config: Config {
                file,
                path: Some(path),
            },
            warnings,
        })
    }

    /// Find the first existing config file among the standard locations.
    pub fn locate(
        env_path: Option<PathBuf>,
        xdg_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Option<PathBuf> {
        let candidates = [
            env_path,
            xdg_home.map(|p| p.join("mirrorsync/config.toml")),
            home.map(|p| p.join(".mirrorsync/config.toml")),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Build a configuration directly, validating it.
    pub fn from_file(file: MirrorConfig) -> Result<ConfigLoadResult, ConfigError> {
        let warnings = file.validate()?;
        Ok(ConfigLoadResult {
            config: Config { file, path: None },
            warnings,
        })
    }

    fn read_file(path: &Path) -> Result<MirrorConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Root directory for local mirrors.
    ///
    /// Defaults to `<platform cache dir>/mirrorsync`, falling back to
    /// `~/.mirrorsync/cache`.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.file.cache_dir {
            return Ok(dir.clone());
        }
        if let Some(cache) = dirs::cache_dir() {
            return Ok(cache.join("mirrorsync"));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".mirrorsync/cache"))
    }

    /// Worker pool size. Defaults to 1 (sequential).
    pub fn jobs(&self) -> usize {
        self.file.jobs.unwrap_or(1)
    }

    /// Remote-tracking namespace for destination refs.
    pub fn dest_namespace(&self) -> &str {
        self.file
            .dest_namespace
            .as_deref()
            .unwrap_or(DEFAULT_DEST_NAMESPACE)
    }

    /// All configured repositories, in file order.
    pub fn repos(&self) -> &[RepoEntry] {
        &self.file.repos
    }

    /// Select repositories by name, preserving configuration order.
    ///
    /// An empty selection means every configured repository.
    pub fn select(&self, names: &[String]) -> Result<Vec<RepoEntry>, ConfigError> {
        if names.is_empty() {
            return Ok(self.file.repos.clone());
        }
        for name in names {
            if !self.file.repos.iter().any(|r| r.name.as_str() == name) {
                return Err(ConfigError::UnknownRepo(name.clone()));
            }
        }
        Ok(self
            .file
            .repos
            .iter()
            .filter(|r| names.iter().any(|n| n == r.name.as_str()))
            .cloned()
            .collect())
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
