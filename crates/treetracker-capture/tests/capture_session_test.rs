//! Integration tests for the capture session
//!
//! These drive the session through the select → locate → submit cycle with
//! scripted collaborators, so the order in which location fixes arrive is
//! decided by the test.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use treetracker_capture::test_helpers::{
    sample_image, ManualClock, RecordingUploadSink, ScriptedLocationProvider,
};
use treetracker_capture::{CaptureDeps, CaptureSession, PermissionHub, SessionUpdate};
use treetracker_core::{
    AcquisitionStatus, CaptureError, CapturePhase, Clock, Coordinate, LocationFailureReason,
    LocationPermissionState, LocationProvider, PositionOptions,
};

struct Harness {
    session: CaptureSession,
    provider: Arc<ScriptedLocationProvider>,
    hub: PermissionHub,
    uploads: Arc<RecordingUploadSink>,
    clock: Arc<ManualClock>,
}

async fn harness(
    provider: ScriptedLocationProvider,
    permission: LocationPermissionState,
) -> Harness {
    let provider = Arc::new(provider);
    let hub = PermissionHub::new(permission);
    let uploads = Arc::new(RecordingUploadSink::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));

    let deps = CaptureDeps::new(
        Some(provider.clone() as Arc<dyn LocationProvider>),
        Arc::new(hub.clone()),
        uploads.clone(),
    )
    .with_clock(clock.clone());

    Harness {
        session: CaptureSession::mount(deps, PositionOptions::default()).await,
        provider,
        hub,
        uploads,
        clock,
    }
}

fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

#[tokio::test]
async fn test_captured_at_follows_latest_selection() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([Ok(coord(10.0, 20.0))]),
        LocationPermissionState::Granted,
    )
    .await;
    let t0 = h.clock.now();

    h.session.select_media(sample_image("first.jpg"));
    assert_eq!(h.session.capture().captured_at(), Some(t0));
    assert_eq!(h.session.capture().location(), None);
    h.session.settle().await;
    assert_eq!(h.session.capture().location(), Some(coord(10.0, 20.0)));

    h.clock.advance(chrono::Duration::seconds(30));
    h.session.select_media(sample_image("second.jpg"));

    assert_eq!(
        h.session.capture().captured_at(),
        Some(t0 + chrono::Duration::seconds(30))
    );
    assert_eq!(h.session.capture().location(), None);
    assert_eq!(h.session.capture().media().unwrap().name, "second.jpg");
}

#[tokio::test]
async fn test_submit_only_when_complete() {
    let mut h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Granted).await;

    // empty
    assert!(!h.session.can_submit());
    assert_eq!(h.session.submit(), Err(CaptureError::MissingMedia));

    // requesting
    h.session.select_media(sample_image("tree.jpg"));
    h.provider.wait_for_calls(1).await;
    assert!(!h.session.can_submit());
    assert_eq!(h.session.submit(), Err(CaptureError::LocationPending));

    // failed
    h.provider
        .resolve_next(Err(LocationFailureReason::PositionUnavailable));
    h.session.settle().await;
    assert_eq!(h.session.status(), AcquisitionStatus::Failed);
    assert!(!h.session.can_submit());
    assert_eq!(h.session.submit(), Err(CaptureError::MissingLocation));

    // retried and succeeded
    h.session.request_location_manually();
    h.provider.wait_for_calls(2).await;
    h.provider.resolve_next(Ok(coord(-33.9, 18.4)));
    h.session.settle().await;
    assert_eq!(h.session.phase(), CapturePhase::Ready);
    assert!(h.session.can_submit());

    let record = h.session.submit().unwrap();
    assert_eq!(record.location, coord(-33.9, 18.4));
    assert_eq!(h.uploads.count(), 1);
}

#[tokio::test]
async fn test_late_fix_for_replaced_selection_is_discarded() {
    let mut h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Granted).await;

    h.session.select_media(sample_image("a.jpg"));
    h.clock.advance(chrono::Duration::seconds(5));
    let second_at = h.clock.now();
    h.session.select_media(sample_image("b.jpg"));
    h.provider.wait_for_calls(2).await;

    // the first request resolves after the second selection
    assert!(h.provider.resolve_next(Ok(coord(50.0, 50.0))));
    assert_eq!(
        h.session.next_event().await,
        Some(SessionUpdate::StaleResultDiscarded)
    );
    assert_eq!(h.session.capture().location(), None);
    assert_eq!(h.session.status(), AcquisitionStatus::Requesting);

    assert!(h.provider.resolve_next(Ok(coord(1.5, 2.5))));
    let updates = h.session.settle().await;
    assert_eq!(updates, vec![SessionUpdate::LocationApplied(coord(1.5, 2.5))]);

    let record = h.session.submit().unwrap();
    assert_eq!(record.media.name, "b.jpg");
    assert_eq!(record.location, coord(1.5, 2.5));
    assert_eq!(record.captured_at, second_at);
}

#[tokio::test]
async fn test_remembered_denial_does_not_reprompt() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([Err(LocationFailureReason::PermissionDenied)]),
        LocationPermissionState::Denied,
    )
    .await;

    h.session.select_media(sample_image("tree.jpg"));
    h.session.settle().await;
    assert_eq!(
        h.session.validation_error(),
        Some(&CaptureError::LocationPermissionDenied { remembered: false })
    );
    assert_eq!(h.provider.call_count(), 1);

    h.session.request_location_manually();
    tokio::task::yield_now().await;

    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(
        h.session.validation_error(),
        Some(&CaptureError::LocationPermissionDenied { remembered: true })
    );
    assert_eq!(
        h.session.validation_error().unwrap().to_string(),
        "Location permission was previously denied. Please enable it in your browser settings."
    );
}

#[tokio::test]
async fn test_denied_then_second_photo_succeeds() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([
            Err(LocationFailureReason::PermissionDenied),
            Ok(coord(1.0, 2.0)),
        ]),
        LocationPermissionState::Prompt,
    )
    .await;
    let t0 = h.clock.now();

    h.session.select_media(sample_image("a.jpg"));
    h.session.settle().await;
    assert_eq!(h.session.capture().location(), None);
    assert_eq!(
        h.session.validation_error().unwrap().to_string(),
        "Location access was denied. Please enable it in your browser settings."
    );

    let t1 = t0 + chrono::Duration::seconds(1);
    h.clock.set(t1);
    h.session.select_media(sample_image("b.jpg"));
    h.session.settle().await;

    let record = h.session.submit().unwrap();
    assert_eq!(record.media, sample_image("b.jpg"));
    assert_eq!(record.location, coord(1.0, 2.0));
    assert_eq!(record.captured_at, t1);
    assert_eq!(h.uploads.records(), vec![record]);

    assert_eq!(h.session.phase(), CapturePhase::Empty);
    assert!(h.session.capture().is_empty());
    assert_eq!(h.session.validation_error(), None);
}

#[tokio::test]
async fn test_submit_without_media_hands_off_nothing() {
    let mut h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Granted).await;

    assert_eq!(h.session.submit(), Err(CaptureError::MissingMedia));
    assert_eq!(
        h.session.validation_error().unwrap().to_string(),
        "Please choose an image."
    );
    assert_eq!(h.uploads.count(), 0);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_repeated_invalid_submit_is_idempotent() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([Err(LocationFailureReason::Timeout)]),
        LocationPermissionState::Granted,
    )
    .await;
    h.session.select_media(sample_image("tree.jpg"));
    h.session.settle().await;

    let first = h.session.submit();
    let after_first = h.session.capture().clone();
    let status_after_first = h.session.status();

    let second = h.session.submit();

    assert_eq!(first, Err(CaptureError::MissingLocation));
    assert_eq!(first, second);
    assert_eq!(h.session.capture(), &after_first);
    assert_eq!(h.session.status(), status_after_first);
    assert_eq!(h.uploads.count(), 0);
}

#[tokio::test]
async fn test_permission_changes_are_pushed() {
    let mut h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Prompt).await;
    assert_eq!(h.session.permission(), LocationPermissionState::Prompt);

    h.hub.set(LocationPermissionState::Granted);
    h.hub.set(LocationPermissionState::Denied);

    assert_eq!(
        h.session.drain_events(),
        vec![
            SessionUpdate::PermissionChanged(LocationPermissionState::Granted),
            SessionUpdate::PermissionChanged(LocationPermissionState::Denied),
        ]
    );
    assert_eq!(h.session.permission(), LocationPermissionState::Denied);
}

#[tokio::test]
async fn test_pushed_grant_allows_manual_retry() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([
            Err(LocationFailureReason::PermissionDenied),
            Ok(coord(1.0, 2.0)),
        ]),
        LocationPermissionState::Denied,
    )
    .await;

    h.session.select_media(sample_image("tree.jpg"));
    h.session.settle().await;
    assert_eq!(h.provider.call_count(), 1);

    // user re-enables location in the settings
    h.hub.set(LocationPermissionState::Granted);
    assert_eq!(
        h.session.drain_events(),
        vec![SessionUpdate::PermissionChanged(LocationPermissionState::Granted)]
    );

    h.session.request_location_manually();
    h.session.settle().await;

    assert_eq!(h.provider.call_count(), 2);
    assert_eq!(h.session.capture().location(), Some(coord(1.0, 2.0)));
    assert_eq!(h.session.validation_error(), None);
    assert_eq!(h.session.status(), AcquisitionStatus::Succeeded);
}

#[tokio::test]
async fn test_pushed_denial_blocks_manual_retry() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([Err(LocationFailureReason::Timeout)]),
        LocationPermissionState::Granted,
    )
    .await;

    h.session.select_media(sample_image("tree.jpg"));
    h.session.settle().await;
    assert_eq!(
        h.session.validation_error(),
        Some(&CaptureError::LocationTimeout)
    );

    h.hub.set(LocationPermissionState::Denied);
    h.session.drain_events();
    assert_eq!(h.session.permission(), LocationPermissionState::Denied);

    h.session.request_location_manually();
    tokio::task::yield_now().await;

    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(
        h.session.validation_error(),
        Some(&CaptureError::LocationPermissionDenied { remembered: true })
    );
}

#[tokio::test]
async fn test_dropping_session_unsubscribes() {
    let h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Prompt).await;
    assert_eq!(h.hub.observer_count(), 1);

    let Harness { session, hub, .. } = h;
    drop(session);

    assert_eq!(hub.observer_count(), 0);
    hub.set(LocationPermissionState::Granted);
}

#[tokio::test]
async fn test_reset_discards_in_flight_result() {
    let mut h = harness(ScriptedLocationProvider::new(), LocationPermissionState::Granted).await;

    h.session.select_media(sample_image("tree.jpg"));
    h.provider.wait_for_calls(1).await;
    h.session.reset();
    assert_eq!(h.session.phase(), CapturePhase::Empty);

    h.provider.resolve_next(Ok(coord(3.0, 4.0)));
    assert_eq!(
        h.session.next_event().await,
        Some(SessionUpdate::StaleResultDiscarded)
    );
    assert!(h.session.capture().is_empty());
    assert_eq!(h.session.status(), AcquisitionStatus::Idle);
}

#[tokio::test]
async fn test_timeout_failure_can_be_retried() {
    let mut h = harness(
        ScriptedLocationProvider::with_results([
            Err(LocationFailureReason::Timeout),
            Ok(coord(7.0, 8.0)),
        ]),
        LocationPermissionState::Granted,
    )
    .await;

    h.session.select_media(sample_image("tree.jpg"));
    h.session.settle().await;
    assert_eq!(
        h.session.validation_error(),
        Some(&CaptureError::LocationTimeout)
    );
    assert!(h.session.can_retry_location());

    h.session.request_location_manually();
    assert_eq!(h.session.validation_error(), None);
    h.session.settle().await;

    assert_eq!(h.session.capture().location(), Some(coord(7.0, 8.0)));
    assert_eq!(h.session.status(), AcquisitionStatus::Succeeded);
}
