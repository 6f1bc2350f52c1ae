//! Location provider that always reports the same outcome.
//!
//! Used by the command-line driver, where the coordinate comes from flags
//! instead of a device sensor.

use async_trait::async_trait;

use treetracker_core::{Coordinate, LocationFailureReason, LocationProvider, PositionOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedLocationProvider {
    Fix(Coordinate),
    Fail(LocationFailureReason),
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_fix(
        &self,
        options: PositionOptions,
    ) -> Result<Coordinate, LocationFailureReason> {
        tracing::debug!(
            high_accuracy = options.enable_high_accuracy,
            timeout_ms = options.timeout.as_millis() as u64,
            outcome = ?self,
            "Fixed location requested"
        );
        match *self {
            Self::Fix(coordinate) => Ok(coordinate),
            Self::Fail(reason) => Err(reason),
        }
    }
}
