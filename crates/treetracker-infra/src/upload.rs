//! Upload collaborators
//!
//! The capture controller only guarantees that a record is complete when it
//! is handed off. Transport is up to the sink.

use tokio::sync::mpsc;

use treetracker_core::{CaptureRecord, UploadSink};

/// Default sink: logs the record and drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingUploadSink;

impl UploadSink for LoggingUploadSink {
    fn hand_off(&self, record: CaptureRecord) {
        match serde_json::to_string(&record) {
            Ok(payload) => tracing::info!(payload = %payload, "Upload requested"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize capture record"),
        }
    }
}

/// Forwards records to an async consumer (an uploader task, the CLI, a test).
#[derive(Debug, Clone)]
pub struct ChannelUploadSink {
    tx: mpsc::UnboundedSender<CaptureRecord>,
}

impl ChannelUploadSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CaptureRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UploadSink for ChannelUploadSink {
    fn hand_off(&self, record: CaptureRecord) {
        if self.tx.send(record).is_err() {
            tracing::warn!("Upload consumer has gone away, capture record dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use treetracker_core::{Coordinate, MediaAsset};

    fn record() -> CaptureRecord {
        CaptureRecord {
            media: MediaAsset::new("oak.jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8")),
            location: Coordinate::new(52.37, 4.89).unwrap(),
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_records() {
        let (sink, mut rx) = ChannelUploadSink::new();
        let sent = record();
        sink.hand_off(sent.clone());
        assert_eq!(rx.recv().await, Some(sent));
    }

    #[test]
    fn test_channel_sink_with_closed_receiver() {
        let (sink, rx) = ChannelUploadSink::new();
        drop(rx);
        sink.hand_off(record());
    }

    #[test]
    fn test_logging_sink_accepts_record() {
        LoggingUploadSink.hand_off(record());
    }
}
