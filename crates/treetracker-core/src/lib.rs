//! TreeTracker Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, and
//! collaborator traits shared by the capture controller, the identity client,
//! and the command-line driver.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{CaptureConfig, IdentityConfig};
pub use error::{CaptureError, CaptureErrorMetadata, IdentityError, LogLevel, PickError};
pub use hooks::{
    Clock, IdentityProvider, LocationProvider, MediaPicker, PermissionObserver, PermissionSource,
    Subscription, SystemClock, TokenStore, UploadSink,
};
pub use models::{
    AcquisitionStatus, CapturePhase, CaptureRecord, Coordinate, CoordinateError,
    LocationFailureReason, LocationPermissionState, MediaAsset, PendingCapture, PositionOptions,
    SessionContext, TokenSet,
};
pub use validation::{MediaValidationError, MediaValidator, RegistrationError, RegistrationForm};
