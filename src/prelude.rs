//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use measurement_registry::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, SessionConfig};
pub use crate::core::errors::{Capability, RegistryError, Result};

// Device model
pub use crate::device::registry::Registry;
pub use crate::device::{Device, DeviceKind, DeviceType, Material, TemperatureScale};

// Console
pub use crate::console::prompt::Prompter;
pub use crate::console::session::{Session, SessionEnd};

// Logging
pub use crate::logger::jsonl::{ActivityLog, Severity};
