//! TreeTracker capture controller
//!
//! Drives a single tree photo from selection through location acquisition to
//! hand-off, behind an authentication gate.

pub mod gate;
pub mod permission;
pub mod session;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use gate::{resolve_page, GateMessage, Page, SessionGate};
pub use permission::{NoPermissionApi, PermissionHub};
pub use session::{CaptureDeps, CaptureSession, SessionUpdate};
