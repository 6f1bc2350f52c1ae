//! Tracing initialization
//!
//! Installs the global subscriber used by every TreeTracker binary.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
