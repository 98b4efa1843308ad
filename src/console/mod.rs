//! Terminal boundary: prompting, interactive device operations, menu session.

pub mod device_ops;
pub mod prompt;
pub mod session;
