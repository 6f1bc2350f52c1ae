//! Capture session controller
//!
//! Owns the single [`PendingCapture`] and drives it through
//! select media → acquire location → validate → hand off.
//!
//! All mutation happens through `&mut self`. Location requests run as
//! spawned tasks that report back over a channel together with permission
//! change notifications; the owner applies them with [`CaptureSession::next_event`]
//! or [`CaptureSession::drain_events`]. Each request carries a ticket naming
//! the capture it was made for and its sequence number, and a result is only
//! applied while that ticket is still the outstanding one.
//!
//! Location requests call `tokio::spawn`, so the session must live inside a
//! Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use treetracker_core::{
    AcquisitionStatus, CaptureError, CaptureErrorMetadata, CapturePhase, CaptureRecord, Clock,
    Coordinate, LocationFailureReason, LocationPermissionState, LocationProvider, LogLevel,
    MediaAsset, PendingCapture, PermissionSource, PositionOptions, Subscription, SystemClock,
    UploadSink,
};

/// Slack added to the provider's own timeout before the session gives up on it.
const PROVIDER_GRACE: Duration = Duration::from_secs(1);

/// Collaborators used by a capture session
#[derive(Clone)]
pub struct CaptureDeps {
    /// `None` when the platform has no geolocation service
    pub location: Option<Arc<dyn LocationProvider>>,
    pub permissions: Arc<dyn PermissionSource>,
    pub uploader: Arc<dyn UploadSink>,
    pub clock: Arc<dyn Clock>,
}

impl CaptureDeps {
    pub fn new(
        location: Option<Arc<dyn LocationProvider>>,
        permissions: Arc<dyn PermissionSource>,
        uploader: Arc<dyn UploadSink>,
    ) -> Self {
        Self {
            location,
            permissions,
            uploader,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AcquisitionTicket {
    capture_id: Uuid,
    seq: u64,
}

#[derive(Debug)]
enum SessionEvent {
    FixResolved {
        ticket: AcquisitionTicket,
        result: Result<Coordinate, LocationFailureReason>,
    },
    PermissionChanged(LocationPermissionState),
}

/// What applying one event did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    LocationApplied(Coordinate),
    LocationFailed(CaptureError),
    /// A result for a capture or request that has since been replaced
    StaleResultDiscarded,
    PermissionChanged(LocationPermissionState),
}

pub struct CaptureSession {
    capture: PendingCapture,
    status: AcquisitionStatus,
    permission: LocationPermissionState,
    options: PositionOptions,
    seq: u64,
    in_flight: Option<AcquisitionTicket>,
    deps: CaptureDeps,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    _permission_subscription: Subscription,
}

impl CaptureSession {
    /// Create an empty session, subscribe to permission changes, and read
    /// the initial permission state.
    pub async fn mount(deps: CaptureDeps, options: PositionOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // subscribe before querying so a change in between is not lost
        let observer_tx = events_tx.clone();
        let subscription = deps.permissions.subscribe(Box::new(move |state| {
            let _ = observer_tx.send(SessionEvent::PermissionChanged(state));
        }));
        let permission = deps.permissions.query().await;

        tracing::debug!(
            permission = %permission,
            geolocation_supported = deps.location.is_some(),
            "Capture session mounted"
        );

        Self {
            capture: PendingCapture::new(),
            status: AcquisitionStatus::Idle,
            permission,
            options,
            seq: 0,
            in_flight: None,
            deps,
            events_tx,
            events_rx,
            _permission_subscription: subscription,
        }
    }

    pub fn capture(&self) -> &PendingCapture {
        &self.capture
    }

    pub fn status(&self) -> AcquisitionStatus {
        self.status
    }

    pub fn permission(&self) -> LocationPermissionState {
        self.permission
    }

    pub fn validation_error(&self) -> Option<&CaptureError> {
        self.capture.validation_error()
    }

    pub fn phase(&self) -> CapturePhase {
        if self.capture.media().is_none() {
            CapturePhase::Empty
        } else if self.status == AcquisitionStatus::Requesting {
            CapturePhase::AwaitingLocation
        } else if self.capture.location().is_some() {
            CapturePhase::Ready
        } else {
            CapturePhase::MediaSet
        }
    }

    /// Mirrors the upload button: enabled only for a complete capture.
    pub fn can_submit(&self) -> bool {
        self.capture.media().is_some()
            && self.capture.location().is_some()
            && self.status != AcquisitionStatus::Requesting
    }

    /// Whether a manual location retry should be offered.
    pub fn can_retry_location(&self) -> bool {
        self.deps.location.is_some()
            && self.capture.media().is_some()
            && self.capture.location().is_none()
            && self.status != AcquisitionStatus::Requesting
    }

    /// Take a newly picked image as the current capture and start locating it.
    pub fn select_media(&mut self, media: MediaAsset) {
        let captured_at = self.deps.clock.now();
        let capture_id = self.capture.select(media, captured_at);
        self.in_flight = None;
        self.status = AcquisitionStatus::Idle;

        tracing::debug!(
            capture_id = %capture_id,
            captured_at = %captured_at,
            "Media selected"
        );

        self.request_location();
    }

    /// Start a location acquisition for the current capture.
    pub fn request_location(&mut self) {
        let Some(capture_id) = self.capture.capture_id() else {
            self.record_error(CaptureError::MissingMedia);
            return;
        };

        let Some(provider) = self.deps.location.clone() else {
            self.in_flight = None;
            self.status = AcquisitionStatus::Failed;
            self.record_error(CaptureError::GeolocationUnsupported);
            return;
        };

        self.seq += 1;
        let ticket = AcquisitionTicket {
            capture_id,
            seq: self.seq,
        };
        self.in_flight = Some(ticket);
        self.status = AcquisitionStatus::Requesting;
        self.capture.clear_location();
        self.capture.clear_error();

        tracing::debug!(
            capture_id = %capture_id,
            seq = ticket.seq,
            high_accuracy = self.options.enable_high_accuracy,
            timeout_ms = self.options.timeout.as_millis() as u64,
            "Requesting location"
        );

        let options = self.options;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let deadline = options.timeout + PROVIDER_GRACE;
            let result = match tokio::time::timeout(deadline, provider.current_fix(options)).await
            {
                Ok(result) => result,
                Err(_) => Err(LocationFailureReason::Timeout),
            };
            // receiver gone means the session was dropped
            let _ = tx.send(SessionEvent::FixResolved { ticket, result });
        });
    }

    /// User-initiated retry. A remembered denial is reported without
    /// re-prompting, since the platform would refuse anyway.
    pub fn request_location_manually(&mut self) {
        if self.status == AcquisitionStatus::Requesting {
            tracing::debug!("Location request already in flight, ignoring retry");
            return;
        }

        if self.deps.location.is_some() && self.permission == LocationPermissionState::Denied {
            self.record_error(CaptureError::LocationPermissionDenied { remembered: true });
            return;
        }

        self.request_location();
    }

    /// Validate the capture and hand it to the upload collaborator.
    ///
    /// On failure the error is also stored as the capture's validation
    /// message and nothing else changes.
    pub fn submit(&mut self) -> Result<CaptureRecord, CaptureError> {
        let outcome = if self.capture.media().is_none() {
            Err(CaptureError::MissingMedia)
        } else if self.status == AcquisitionStatus::Requesting {
            Err(CaptureError::LocationPending)
        } else {
            self.capture.to_record()
        };

        match outcome {
            Ok(record) => {
                tracing::info!(
                    media = %record.media.name,
                    content_type = %record.media.content_type,
                    size_bytes = record.media.size_bytes,
                    latitude = record.location.latitude(),
                    longitude = record.location.longitude(),
                    captured_at = %record.captured_at,
                    "Handing off capture"
                );
                self.deps.uploader.hand_off(record.clone());
                self.reset();
                Ok(record)
            }
            Err(err) => {
                self.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Discard the capture regardless of any request in flight.
    pub fn reset(&mut self) {
        self.capture.clear();
        self.status = AcquisitionStatus::Idle;
        self.in_flight = None;
        tracing::debug!("Capture session reset");
    }

    /// Wait for the next event and apply it.
    ///
    /// Never returns `None` while the session is alive, since the session
    /// holds a sender itself; callers should only await this when an event
    /// is expected (see [`CaptureSession::settle`]).
    pub async fn next_event(&mut self) -> Option<SessionUpdate> {
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Apply every event that is already queued.
    pub fn drain_events(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            updates.push(self.apply(event));
        }
        updates
    }

    /// Apply events until no location request is outstanding.
    pub async fn settle(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while self.status == AcquisitionStatus::Requesting {
            match self.next_event().await {
                Some(update) => updates.push(update),
                None => break,
            }
        }
        updates
    }

    fn apply(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::PermissionChanged(state) => {
                tracing::debug!(
                    from = %self.permission,
                    to = %state,
                    "Location permission updated"
                );
                self.permission = state;
                SessionUpdate::PermissionChanged(state)
            }
            SessionEvent::FixResolved { ticket, result } => {
                let current = self.capture.capture_id();
                if self.in_flight != Some(ticket) || current != Some(ticket.capture_id) {
                    tracing::debug!(
                        capture_id = %ticket.capture_id,
                        seq = ticket.seq,
                        "Discarding stale location result"
                    );
                    return SessionUpdate::StaleResultDiscarded;
                }
                self.in_flight = None;

                match result {
                    Ok(coordinate) => {
                        self.capture.set_location(coordinate);
                        self.capture.clear_error();
                        self.status = AcquisitionStatus::Succeeded;
                        tracing::debug!(
                            capture_id = %ticket.capture_id,
                            location = %coordinate,
                            "Location acquired"
                        );
                        SessionUpdate::LocationApplied(coordinate)
                    }
                    Err(reason) => {
                        self.capture.clear_location();
                        self.status = AcquisitionStatus::Failed;
                        let err = CaptureError::from(reason);
                        tracing::warn!(
                            capture_id = %ticket.capture_id,
                            reason = %reason,
                            "Location acquisition failed"
                        );
                        self.record_error(err.clone());
                        SessionUpdate::LocationFailed(err)
                    }
                }
            }
        }
    }

    fn record_error(&mut self, err: CaptureError) {
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(code = err.error_code(), "{}", err),
            LogLevel::Warn => tracing::warn!(code = err.error_code(), "{}", err),
            LogLevel::Error => tracing::error!(code = err.error_code(), "{}", err),
        }
        self.capture.set_error(err);
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("capture", &self.capture)
            .field("status", &self.status)
            .field("permission", &self.permission)
            .field("seq", &self.seq)
            .finish()
    }
}
