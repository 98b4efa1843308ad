//! MREG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Top-level error type for the measurement device registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("[MREG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[MREG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[MREG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[MREG-2001] no device selected")]
    NoSelection,

    #[error("[MREG-2002] device is not active")]
    Inactive,

    #[error("[MREG-2003] value {value} outside measurement range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("[MREG-2004] measurement range is empty: min {min} > max {max}")]
    EmptyRange { min: f64, max: f64 },

    #[error("[MREG-2005] selected device is not {}", .capability.required_variant())]
    Unsupported { capability: Capability },

    #[error("[MREG-2006] invalid {what} choice: {raw}")]
    InvalidChoice { what: &'static str, raw: i64 },

    #[error("[MREG-2007] device limit reached ({limit})")]
    DeviceLimit { limit: usize },

    #[error("[MREG-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[MREG-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[MREG-3002] terminal failure: {0}")]
    Terminal(#[from] io::Error),

    #[error("[MREG-3003] input stream closed")]
    InputClosed,
}

/// Variant-only data a command may require from the selected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Current temperature and temperature scale.
    TemperatureScale,
    /// Calibration offset.
    CalibrationOffset,
}

impl Capability {
    /// Article-qualified name of the narrowest variant carrying this capability.
    #[must_use]
    pub const fn required_variant(self) -> &'static str {
        match self {
            Self::TemperatureScale => "a TemperatureMeasurementDevice",
            Self::CalibrationOffset => "an AdvancedTemperatureMeasurementDevice",
        }
    }
}

impl RegistryError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "MREG-1001",
            Self::MissingConfig { .. } => "MREG-1002",
            Self::ConfigParse { .. } => "MREG-1003",
            Self::NoSelection => "MREG-2001",
            Self::Inactive => "MREG-2002",
            Self::OutOfRange { .. } => "MREG-2003",
            Self::EmptyRange { .. } => "MREG-2004",
            Self::Unsupported { .. } => "MREG-2005",
            Self::InvalidChoice { .. } => "MREG-2006",
            Self::DeviceLimit { .. } => "MREG-2007",
            Self::Serialization { .. } => "MREG-2101",
            Self::Io { .. } => "MREG-3001",
            Self::Terminal(_) => "MREG-3002",
            Self::InputClosed => "MREG-3003",
        }
    }

    /// Whether the failure is a rejected user action the session recovers from.
    ///
    /// Everything else ends the session or aborts startup.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoSelection
                | Self::Inactive
                | Self::OutOfRange { .. }
                | Self::EmptyRange { .. }
                | Self::Unsupported { .. }
                | Self::InvalidChoice { .. }
                | Self::DeviceLimit { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for RegistryError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
