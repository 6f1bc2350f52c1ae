//! TreeTracker Infrastructure Library
//!
//! Concrete collaborators for the capture controller:
//! - Telemetry initialization
//! - Upload sinks (logging, channel)
//! - File-backed media picker
//! - Token stores (memory, file)
//! - Fixed location provider

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod location;
pub mod picker;
pub mod tokens;
pub mod upload;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

pub use location::FixedLocationProvider;
pub use picker::FileMediaPicker;
pub use tokens::{FileTokenStore, MemoryTokenStore};
pub use upload::{ChannelUploadSink, LoggingUploadSink};
