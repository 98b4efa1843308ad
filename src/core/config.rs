//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{RegistryError, Result};
use crate::logger::jsonl::Severity;

/// Full registry configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    /// File the configuration was resolved from (never serialized).
    #[serde(skip)]
    pub source: PathBuf,
}

/// Terminal presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Highlight warnings; only honored when stdout is a terminal.
    pub color: bool,
    /// Print a one-line header when the session starts.
    pub banner: bool,
}

/// Interactive session rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Re-prompt when a max value below the min value is entered.
    pub strict_range: bool,
    /// Upper bound on registered devices; 0 means unlimited.
    pub max_devices: usize,
}

/// Activity log destination and filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSONL activity log file; no file is written when unset.
    pub jsonl_path: Option<PathBuf>,
    /// Minimum severity recorded.
    pub level: Severity,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            banner: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_path: None,
            level: Severity::Info,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[MREG-CONFIG] WARNING: HOME not set, falling back to /tmp");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        home_dir.join(".config").join("mreg").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| RegistryError::io(&path_buf, source))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(RegistryError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.source = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
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
        if let Some(raw) = lookup("MREG_UI_COLOR") {
            self.ui.color = parse_env_bool("MREG_UI_COLOR", &raw)?;
        }
        if let Some(raw) = lookup("MREG_UI_BANNER") {
            self.ui.banner = parse_env_bool("MREG_UI_BANNER", &raw)?;
        }
        if let Some(raw) = lookup("MREG_SESSION_STRICT_RANGE") {
            self.session.strict_range = parse_env_bool("MREG_SESSION_STRICT_RANGE", &raw)?;
        }
        if let Some(raw) = lookup("MREG_SESSION_MAX_DEVICES") {
            self.session.max_devices = parse_env_usize("MREG_SESSION_MAX_DEVICES", &raw)?;
        }
        if let Some(raw) = lookup("MREG_LOG_JSONL_PATH") {
            self.logging.jsonl_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("MREG_LOG_LEVEL") {
            self.logging.level = parse_env_severity("MREG_LOG_LEVEL", &raw)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.logging.jsonl_path
            && path.file_name().is_none()
        {
            return Err(RegistryError::InvalidConfig {
                details: format!(
                    "logging.jsonl_path must name a file, got {}",
                    path.display()
                ),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| RegistryError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| RegistryError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_severity(name: &str, raw: &str) -> Result<Severity> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "info" => Ok(Severity::Info),
        "warning" | "warn" => Ok(Severity::Warning),
        "critical" => Ok(Severity::Critical),
        other => Err(RegistryError::ConfigParse {
            context: "env",
            details: format!("{name}={other:?}: expected info, warning, or critical"),
        }),
    }
}
