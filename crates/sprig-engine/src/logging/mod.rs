//! Logging utilities.
//!
//! The engine logs through the `log` facade; this module only wires up the
//! `env_logger` backend for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
