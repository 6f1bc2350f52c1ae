use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::location::Coordinate;
use super::media::MediaAsset;
use crate::error::CaptureError;

/// Media plus the instant it was chosen. Kept together so a timestamp can
/// never exist without its media.
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    id: Uuid,
    media: MediaAsset,
    captured_at: DateTime<Utc>,
}

/// The single capture under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingCapture {
    selection: Option<Selection>,
    location: Option<Coordinate>,
    validation_error: Option<CaptureError>,
}

impl PendingCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the media, stamp the selection time, and drop any previous
    /// fix and error. Returns the identity of the new selection.
    pub fn select(&mut self, media: MediaAsset, captured_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.selection = Some(Selection {
            id,
            media,
            captured_at,
        });
        self.location = None;
        self.validation_error = None;
        id
    }

    pub fn capture_id(&self) -> Option<Uuid> {
        self.selection.as_ref().map(|s| s.id)
    }

    pub fn media(&self) -> Option<&MediaAsset> {
        self.selection.as_ref().map(|s| &s.media)
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.selection.as_ref().map(|s| s.captured_at)
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.location
    }

    pub fn validation_error(&self) -> Option<&CaptureError> {
        self.validation_error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_none() && self.location.is_none()
    }

    pub fn set_location(&mut self, location: Coordinate) {
        self.location = Some(location);
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    pub fn set_error(&mut self, error: CaptureError) {
        self.validation_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.validation_error = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Build the hand-off record, or the error naming the first missing field.
    pub fn to_record(&self) -> Result<CaptureRecord, CaptureError> {
        let selection = self.selection.as_ref().ok_or(CaptureError::MissingMedia)?;
        let location = self.location.ok_or(CaptureError::MissingLocation)?;
        Ok(CaptureRecord {
            media: selection.media.clone(),
            location,
            captured_at: selection.captured_at,
        })
    }
}

/// A complete capture, ready for the upload collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureRecord {
    pub media: MediaAsset,
    pub location: Coordinate,
    pub captured_at: DateTime<Utc>,
}

/// Position of the current capture in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    Empty,
    MediaSet,
    AwaitingLocation,
    Ready,
}
