//! Error types module
//!
//! `CaptureError` is the user-facing taxonomy of the capture workflow. Every
//! variant is recoverable from the application's point of view: the
//! controller stores it as the capture's validation message instead of
//! propagating it. `PickError` and `IdentityError` cover the media picker and
//! identity collaborators.

use crate::models::LocationFailureReason;
use crate::validation::MediaValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like an incomplete form
    Debug,
    /// Warning level - for provider failures worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how a capture error should be presented
pub trait CaptureErrorMetadata {
    /// Machine-readable error code (e.g., "MISSING_MEDIA")
    fn error_code(&self) -> &'static str;

    /// Whether the user may retry the failed step
    fn is_retryable(&self) -> bool;

    /// Short hint shown under the main message
    fn suggested_action(&self) -> Option<&'static str>;

    /// Message shown to the user
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Please choose an image.")]
    MissingMedia,

    #[error("Location is required. Please allow location access.")]
    MissingLocation,

    #[error("Still waiting for a location fix.")]
    LocationPending,

    /// `remembered` is set when the stored permission state was already
    /// denied and the platform prompt was never shown.
    #[error("{}", permission_denied_message(.remembered))]
    LocationPermissionDenied { remembered: bool },

    #[error("Location request timed out. Please try again.")]
    LocationTimeout,

    #[error("Please allow location access to upload tree images.")]
    LocationUnavailable,

    #[error("Geolocation is not supported by your browser.")]
    GeolocationUnsupported,
}

fn permission_denied_message(remembered: &bool) -> &'static str {
    if *remembered {
        "Location permission was previously denied. Please enable it in your browser settings."
    } else {
        "Location access was denied. Please enable it in your browser settings."
    }
}

impl From<LocationFailureReason> for CaptureError {
    fn from(reason: LocationFailureReason) -> Self {
        match reason {
            LocationFailureReason::PermissionDenied => {
                CaptureError::LocationPermissionDenied { remembered: false }
            }
            LocationFailureReason::Timeout => CaptureError::LocationTimeout,
            LocationFailureReason::PositionUnavailable => CaptureError::LocationUnavailable,
        }
    }
}

/// Static metadata for each variant: (error_code, retryable, suggested_action, log_level).
fn capture_error_static_metadata(
    err: &CaptureError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        CaptureError::MissingMedia => (
            "MISSING_MEDIA",
            true,
            Some("Choose a photo before uploading"),
            LogLevel::Debug,
        ),
        CaptureError::MissingLocation => (
            "MISSING_LOCATION",
            true,
            Some("Request the location again"),
            LogLevel::Debug,
        ),
        CaptureError::LocationPending => (
            "LOCATION_PENDING",
            true,
            Some("Wait for the location request to finish"),
            LogLevel::Debug,
        ),
        CaptureError::LocationPermissionDenied { .. } => (
            "LOCATION_PERMISSION_DENIED",
            false,
            Some("Check browser settings or try another browser"),
            LogLevel::Warn,
        ),
        CaptureError::LocationTimeout => (
            "LOCATION_TIMEOUT",
            true,
            Some("Move somewhere with a clearer sky and retry"),
            LogLevel::Warn,
        ),
        CaptureError::LocationUnavailable => (
            "LOCATION_UNAVAILABLE",
            true,
            Some("Retry the location request"),
            LogLevel::Warn,
        ),
        CaptureError::GeolocationUnsupported => (
            "GEOLOCATION_UNSUPPORTED",
            false,
            Some("Use a device or browser with location support"),
            LogLevel::Error,
        ),
    }
}

impl CaptureError {
    /// True for failures that came from the location subsystem
    pub fn is_location_error(&self) -> bool {
        matches!(
            self,
            CaptureError::LocationPermissionDenied { .. }
                | CaptureError::LocationTimeout
                | CaptureError::LocationUnavailable
                | CaptureError::GeolocationUnsupported
        )
    }
}

impl CaptureErrorMetadata for CaptureError {
    fn error_code(&self) -> &'static str {
        capture_error_static_metadata(self).0
    }

    fn is_retryable(&self) -> bool {
        capture_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        capture_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        capture_error_static_metadata(self).3
    }
}

/// Failures of the media picker collaborator
#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("Failed to read selected file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Selected file rejected: {0}")]
    Rejected(#[from] MediaValidationError),
}

/// Failures of the identity collaborator
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    LoginFailed(String),

    #[error("{0}")]
    RegistrationFailed(String),

    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    #[error("Invalid identity configuration: {0}")]
    Configuration(String),
}
