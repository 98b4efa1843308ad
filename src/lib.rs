#![forbid(unsafe_code)]

//! Measurement device registry (mreg): an interactive console for
//! registering, measuring with, and editing temperature devices in memory.
//!
//! Layers:
//! 1. **Device model**: shared base record plus variant data, with
//!    capability queries for variant-only fields
//! 2. **Console**: token prompter, interactive device operations, and the
//!    numbered-menu session that owns the registry
//! 3. **Support**: TOML configuration, coded errors, JSONL activity log
//!
//! # Library usage
//!
//! ```rust,no_run
//! use measurement_registry::prelude::*;
//!
//! let stdin = std::io::stdin();
//! let prompter = Prompter::new(stdin.lock(), std::io::stdout());
//! let config = Config::default();
//! let mut session = Session::new(prompter, &config.session, ActivityLog::disabled());
//! session.run().expect("terminal available");
//! ```

pub mod prelude;

pub mod console;
pub mod core;
pub mod device;
pub mod logger;
