//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! cache_dir = "/var/cache/mirrorsync"
//! jobs = 4
//! dest_namespace = "private"
//!
//! [[repos]]
//! name = "widget"
//! public = "https://github.com/example/widget.git"
//! private = "git@git.internal:mirrors/widget.git"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: repository names must be valid
//! directory components and unique, URLs non-empty, and the destination
//! namespace a single ref component.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigWarning};
use crate::core::types::{RefId, RepoName};

/// Upper bound on the worker pool size.
pub const MAX_JOBS: usize = 64;

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Root directory for local mirrors
    pub cache_dir: Option<PathBuf>,

    /// Number of repositories processed concurrently
    pub jobs: Option<usize>,

    /// Remote-tracking namespace for destination refs
    /// (`refs/remotes/<namespace>/...`)
    pub dest_namespace: Option<String>,

    /// Mirrored repositories, in processing order
    pub repos: Vec<RepoEntry>,
}

impl MirrorConfig {
    /// Validate the configuration values.
    ///
    /// Returns non-fatal warnings on success.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        if let Some(jobs) = self.jobs {
            if jobs == 0 || jobs > MAX_JOBS {
                return Err(ConfigError::InvalidValue(format!(
                    "jobs must be between 1 and {}, got {}",
                    MAX_JOBS, jobs
                )));
            }
        }

        if let Some(ns) = &self.dest_namespace {
            if ns.contains('/') || RefId::branch(ns.as_str()).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "dest_namespace '{}' must be a single valid ref component",
                    ns
                )));
            }
        }

        let mut names = HashSet::new();
        let mut publics = HashSet::new();
        let mut warnings = Vec::new();

        for repo in &self.repos {
            repo.validate()?;

            if !names.insert(repo.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "repository '{}' is configured more than once",
                    repo.name
                )));
            }

            if !publics.insert(repo.public.as_str()) {
                warnings.push(ConfigWarning {
                    message: format!(
                        "repository '{}' mirrors the same public URL as another entry",
                        repo.name
                    ),
                    path: None,
                });
            }
        }

        Ok(warnings)
    }
}

/// One mirrored repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    /// Name, also the mirror directory name under the cache root
    pub name: RepoName,

    /// Upstream (source) URL
    pub public: String,

    /// Private mirror (destination) URL
    pub private: String,
}

impl RepoEntry {
    /// Validate the entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "repository '{}' has an empty public URL",
                self.name
            )));
        }
        if self.private.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "repository '{}' has an empty private URL",
                self.name
            )));
        }
        if self.public.starts_with('-') || self.private.starts_with('-') {
            return Err(ConfigError::InvalidValue(format!(
                "repository '{}' has a URL starting with '-'",
                self.name
            )));
        }
        if self.public == self.private {
            return Err(ConfigError::InvalidValue(format!(
                "repository '{}' uses the same URL for public and private",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, public: &str, private: &str) -> RepoEntry {
        RepoEntry {
            name: RepoName::new(name).unwrap(),
            public: public.to_string(),
            private: private.to_string(),
        }
    }

    mod mirror_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = MirrorConfig::default();
            assert!(config.cache_dir.is_none());
            assert!(config.jobs.is_none());
            assert!(config.repos.is_empty());
            assert!(config.validate().unwrap().is_empty());
        }

        #[test]
        fn jobs_bounds() {
            for bad in [0, MAX_JOBS + 1] {
                let config = MirrorConfig {
                    jobs: Some(bad),
                    ..Default::default()
                };
                assert!(config.validate().is_err());
            }
            let config = MirrorConfig {
                jobs: Some(8),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn namespace_must_be_one_component() {
            let config = MirrorConfig {
                dest_namespace: Some("a/b".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());

            let config = MirrorConfig {
                dest_namespace: Some("mirror".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn duplicate_names_rejected() {
            let config = MirrorConfig {
                repos: vec![entry("a", "p1", "q1"), entry("a", "p2", "q2")],
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn duplicate_public_warns() {
            let config = MirrorConfig {
                repos: vec![entry("a", "p", "q1"), entry("b", "p", "q2")],
                ..Default::default()
            };
            let warnings = config.validate().unwrap();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].message.contains("'b'"));
        }

        #[test]
        fn roundtrip() {
            let config = MirrorConfig {
                cache_dir: Some(PathBuf::from("/tmp/cache")),
                jobs: Some(2),
                dest_namespace: Some("private".to_string()),
                repos: vec![entry("widget", "https://x/widget.git", "git@y:widget.git")],
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: MirrorConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                jobs = 2
                unknown_field = true
            "#;
            assert!(toml::from_str::<MirrorConfig>(toml).is_err());
        }
    }

    mod repo_entry {
        use super::*;

        #[test]
        fn empty_urls_rejected() {
            assert!(entry("a", "", "q").validate().is_err());
            assert!(entry("a", "p", "  ").validate().is_err());
        }

        #[test]
        fn option_like_url_rejected() {
            assert!(entry("a", "--upload-pack=x", "q").validate().is_err());
        }

        #[test]
        fn same_url_rejected() {
            assert!(entry("a", "p", "p").validate().is_err());
        }

        #[test]
        fn invalid_name_rejected_at_parse() {
            let toml = r#"
                [[repos]]
                name = "org/widget"
                public = "p"
                private = "q"
            "#;
            assert!(toml::from_str::<MirrorConfig>(toml).is_err());
        }
    }
}
