//! Test helpers for capture session tests
//!
//! Scripted collaborators that let tests control when and how location
//! requests resolve, observe hand-offs, and pin capture timestamps.

pub mod location;

pub use location::ScriptedLocationProvider;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use treetracker_core::{CaptureRecord, Clock, MediaAsset, UploadSink};

/// Small JPEG-typed asset for tests
pub fn sample_image(name: &str) -> MediaAsset {
    let mut data = vec![0xff, 0xd8, 0xff, 0xe0];
    data.extend_from_slice(name.as_bytes());
    MediaAsset::new(name, "image/jpeg", Bytes::from(data))
}

/// Upload collaborator that keeps every record it receives
#[derive(Default)]
pub struct RecordingUploadSink {
    records: Mutex<Vec<CaptureRecord>>,
}

impl RecordingUploadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CaptureRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl UploadSink for RecordingUploadSink {
    fn hand_off(&self, record: CaptureRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
