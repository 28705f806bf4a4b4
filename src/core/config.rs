//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VesperError};
use crate::core::paths::resolve_absolute_path;

/// Full portal configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub poller: PollerConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Location and access knobs for the alert database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file written by the flow-scoring pipeline.
    pub db_path: PathBuf,
    /// How long a query waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

/// Dashboard polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollerConfig {
    /// Period of the dashboard refresh timer at startup.
    pub interval_ms: u64,
    /// Choices offered by the settings view's refresh-rate selector.
    pub refresh_presets_ms: Vec<u64>,
}

/// Activity log sink settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub activity_log: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths resolved at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

fn home_dir(context: &str) -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[VSP-CONFIG] WARNING: HOME not set, falling back to /tmp for {context}");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir("data paths")
        .join(".local")
        .join("share")
        .join("vesper")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: data_dir().join("alerts.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            refresh_presets_ms: vec![1_000, 2_000, 5_000, 10_000],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log: data_dir().join("portal.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir("config path")
                .join(".config")
                .join("vesper")
                .join("config.toml"),
        }
    }
}

impl PollerConfig {
    /// Startup refresh period.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Refresh-rate presets as durations, in configured order.
    #[must_use]
    pub fn presets(&self) -> Vec<Duration> {
        self.refresh_presets_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

impl StoreConfig {
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| VesperError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(VesperError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for log correlation.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("VESPER_DB_PATH") {
            self.store.db_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("VESPER_BUSY_TIMEOUT_MS") {
            self.store.busy_timeout_ms = parse_env_u64("VESPER_BUSY_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("VESPER_POLL_INTERVAL_MS") {
            self.poller.interval_ms = parse_env_u64("VESPER_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("VESPER_ACTIVITY_LOG") {
            self.logging.activity_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn normalize_paths(&mut self) {
        self.store.db_path = resolve_absolute_path(&self.store.db_path);
        self.logging.activity_log = resolve_absolute_path(&self.logging.activity_log);
    }

    fn validate(&self) -> Result<()> {
        if self.poller.interval_ms == 0 {
            return Err(VesperError::InvalidConfig {
                details: "poller.interval_ms must be > 0".to_string(),
            });
        }
        if self.poller.refresh_presets_ms.is_empty() {
            return Err(VesperError::InvalidConfig {
                details: "poller.refresh_presets_ms must list at least one rate".to_string(),
            });
        }
        if let Some(bad) = self.poller.refresh_presets_ms.iter().find(|ms| **ms == 0) {
            return Err(VesperError::InvalidConfig {
                details: format!("poller.refresh_presets_ms entries must be > 0, got {bad}"),
            });
        }
        if self.store.db_path.as_os_str().is_empty() {
            return Err(VesperError::InvalidConfig {
                details: "store.db_path must not be empty".to_string(),
            });
        }
        if self.logging.max_size_bytes == 0 {
            return Err(VesperError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| VesperError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{Config, VesperError};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_poll_interval_is_two_seconds() {
        let cfg = Config::default();
        assert_eq!(cfg.poller.interval(), Duration::from_millis(2_000));
        assert!(cfg.poller.presets().contains(&Duration::from_millis(2_000)));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut cfg = Config::default();
        cfg.poller.interval_ms = 0;
        let err = cfg.validate().expect_err("expected interval error");
        match err {
            VesperError::InvalidConfig { details } => assert!(details.contains("interval_ms")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_presets_rejected() {
        let mut cfg = Config::default();
        cfg.poller.refresh_presets_ms.clear();
        let err = cfg.validate().expect_err("expected presets error");
        assert!(err.to_string().contains("refresh_presets_ms"));
    }

    #[test]
    fn zero_preset_rejected() {
        let mut cfg = Config::default();
        cfg.poller.refresh_presets_ms = vec![1_000, 0];
        let err = cfg.validate().expect_err("expected preset error");
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let cfg = Config::default();
        let before = cfg.stable_hash().expect("hash should compute");
        let mut modified = Config::default();
        modified.poller.interval_ms += 1;
        let after = modified.stable_hash().expect("hash should compute");
        assert_ne!(before, after);
        assert_eq!(before, Config::default().stable_hash().unwrap());
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("VESPER_DB_PATH", "/srv/vesper/alerts.db"),
            ("VESPER_POLL_INTERVAL_MS", "5000"),
            ("VESPER_BUSY_TIMEOUT_MS", "250"),
            ("VESPER_ACTIVITY_LOG", "/srv/vesper/portal.jsonl"),
        ]);
        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect("env overrides should parse");
        assert_eq!(cfg.store.db_path, PathBuf::from("/srv/vesper/alerts.db"));
        assert_eq!(cfg.poller.interval_ms, 5_000);
        assert_eq!(cfg.store.busy_timeout_ms, 250);
        assert_eq!(
            cfg.logging.activity_log,
            PathBuf::from("/srv/vesper/portal.jsonl")
        );
    }

    #[test]
    fn env_invalid_number_rejected() {
        let mut cfg = Config::default();
        let overrides = vars(&[("VESPER_POLL_INTERVAL_MS", "fast")]);
        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("invalid number should fail");
        match err {
            VesperError::ConfigParse { context, details } => {
                assert_eq!(context, "env");
                assert!(details.contains("VESPER_POLL_INTERVAL_MS"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).expect_err("missing explicit config");
        assert_eq!(err.code(), "VSP-1002");
    }

    #[test]
    fn load_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\ndb_path = \"/var/lib/vesper/alerts.db\"\n\n[poller]\ninterval_ms = 1000\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).expect("config should load");
        assert_eq!(cfg.poller.interval_ms, 1_000);
        assert_eq!(cfg.store.busy_timeout_ms, 5_000);
        assert_eq!(cfg.paths.config_file, path);
        assert_eq!(cfg.poller.refresh_presets_ms.len(), 4);
    }

    #[test]
    fn load_malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[poller\ninterval_ms = ").unwrap();
        let err = Config::load(Some(&path)).expect_err("malformed config");
        assert_eq!(err.code(), "VSP-1003");
    }
}
