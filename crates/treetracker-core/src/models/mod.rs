//! Data models for the capture workflow
//!
//! Each sub-module covers one feature area: the capture record under
//! construction, geolocation types, the picked media asset, and the
//! authenticated session.

mod capture;
mod location;
mod media;
mod session;

pub use capture::{CapturePhase, CaptureRecord, PendingCapture};
pub use location::{
    AcquisitionStatus, Coordinate, CoordinateError, LocationFailureReason,
    LocationPermissionState, PositionOptions, DEFAULT_LOCATION_TIMEOUT,
};
pub use media::MediaAsset;
pub use session::{SessionContext, TokenSet};
