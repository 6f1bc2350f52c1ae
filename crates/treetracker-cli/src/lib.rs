//! Shared plumbing for the `treetracker` command-line driver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use treetracker_capture::{CaptureDeps, CaptureSession, NoPermissionApi, PermissionHub, SessionGate};
use treetracker_core::{
    CaptureConfig, CaptureError, CaptureErrorMetadata, CaptureRecord, Coordinate, LocationFailureReason,
    LocationPermissionState, LocationProvider, MediaPicker, PermissionSource, UploadSink,
};
use treetracker_infra::{FileMediaPicker, FileTokenStore, FixedLocationProvider, LoggingUploadSink};

/// Where the CLI keeps tokens between runs.
///
/// `persistent` is written on `--remember` and lasts until `logout`.
/// `session` is a per-user file in the temp directory: every CLI call is its
/// own process, so it outlives each call and lasts until `logout` or until
/// the temp directory is cleaned, typically at reboot.
#[derive(Debug, Clone)]
pub struct TokenPaths {
    pub persistent: PathBuf,
    pub session: PathBuf,
}

impl TokenPaths {
    /// `TREETRACKER_TOKEN_FILE` overrides the persistent location,
    /// otherwise `~/.treetracker/tokens.json`.
    pub fn from_env() -> Self {
        let persistent = std::env::var("TREETRACKER_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                Path::new(&home).join(".treetracker").join("tokens.json")
            });

        Self {
            persistent,
            session: std::env::temp_dir().join(session_file_name(
                std::env::var("USER").ok().as_deref(),
            )),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            persistent: dir.join("tokens.json"),
            session: dir.join("session.json"),
        }
    }
}

fn session_file_name(user: Option<&str>) -> String {
    match user.filter(|u| !u.is_empty()) {
        Some(user) => format!("treetracker-session-{}.json", user),
        None => "treetracker-session.json".to_string(),
    }
}

/// Outcome the fixed location provider reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    Fix(Coordinate),
    Denied,
    Unavailable,
    TimedOut,
    /// No geolocation service at all
    Unsupported,
}

impl LocationOutcome {
    pub fn from_flags(
        lat: Option<f64>,
        lng: Option<f64>,
        deny: bool,
        unavailable: bool,
        timeout: bool,
    ) -> Result<Self> {
        let outcome = match (lat, lng) {
            (Some(lat), Some(lng)) => Self::Fix(Coordinate::new(lat, lng)?),
            (None, None) if deny => Self::Denied,
            (None, None) if unavailable => Self::Unavailable,
            (None, None) if timeout => Self::TimedOut,
            (None, None) => Self::Unsupported,
            _ => anyhow::bail!("--lat and --lng must be given together"),
        };
        Ok(outcome)
    }

    fn collaborators(self) -> (Option<Arc<dyn LocationProvider>>, Arc<dyn PermissionSource>) {
        let fixed = |provider: FixedLocationProvider, state| {
            (
                Some(Arc::new(provider) as Arc<dyn LocationProvider>),
                Arc::new(PermissionHub::new(state)) as Arc<dyn PermissionSource>,
            )
        };
        match self {
            Self::Fix(coordinate) => fixed(
                FixedLocationProvider::Fix(coordinate),
                LocationPermissionState::Granted,
            ),
            Self::Denied => fixed(
                FixedLocationProvider::Fail(LocationFailureReason::PermissionDenied),
                LocationPermissionState::Denied,
            ),
            Self::Unavailable => fixed(
                FixedLocationProvider::Fail(LocationFailureReason::PositionUnavailable),
                LocationPermissionState::Granted,
            ),
            Self::TimedOut => fixed(
                FixedLocationProvider::Fail(LocationFailureReason::Timeout),
                LocationPermissionState::Granted,
            ),
            Self::Unsupported => (None, Arc::new(NoPermissionApi)),
        }
    }
}

/// Mount a capture session and put the gate in front of it, restoring any
/// stored tokens.
pub async fn open_gate(
    config: &CaptureConfig,
    paths: &TokenPaths,
    outcome: LocationOutcome,
    uploader: Arc<dyn UploadSink>,
) -> SessionGate {
    let (location, permissions) = outcome.collaborators();
    let deps = CaptureDeps::new(location, permissions, uploader);
    let session = CaptureSession::mount(deps, config.position_options()).await;

    SessionGate::restore(
        Arc::new(FileTokenStore::new(&paths.persistent)),
        Arc::new(FileTokenStore::new(&paths.session)),
        session,
    )
}

/// Select the file, wait for the location, and submit.
pub async fn capture_file(
    config: &CaptureConfig,
    paths: &TokenPaths,
    file: &Path,
    outcome: LocationOutcome,
) -> Result<CaptureRecord> {
    let mut gate = open_gate(config, paths, outcome, Arc::new(LoggingUploadSink)).await;
    let session = gate
        .capture_mut()
        .context("Not signed in. Run `treetracker login` first")?;

    let mut picker = FileMediaPicker::new(config.media_validator());
    picker.offer(file);
    let media = picker
        .choose()
        .await?
        .context("No file was selected")?;

    session.select_media(media);
    session.settle().await;

    // a failed acquisition is more useful to report than the missing location
    if let Some(err) = session.validation_error().filter(|e| e.is_location_error()) {
        return Err(describe(err));
    }
    session.submit().map_err(|e| describe(&e))
}

fn describe(err: &CaptureError) -> anyhow::Error {
    match err.suggested_action() {
        Some(action) => anyhow::anyhow!("{} ({})", err.client_message(), action),
        None => anyhow::anyhow!(err.client_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use treetracker_core::{TokenSet, TokenStore};

    fn signed_in(dir: &TempDir) -> TokenPaths {
        let paths = TokenPaths::in_dir(dir.path());
        FileTokenStore::new(&paths.persistent)
            .save(&TokenSet {
                access_token: "abc".to_string(),
                expires_in: 300,
                refresh_token: None,
                token_type: None,
            })
            .unwrap();
        paths
    }

    fn photo(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("baobab.jpg");
        std::fs::write(&path, b"\xff\xd8\xff\xe0jpeg").unwrap();
        path
    }

    #[test]
    fn test_session_file_is_per_user() {
        assert_eq!(session_file_name(Some("ada")), "treetracker-session-ada.json");
        assert_ne!(session_file_name(Some("ada")), session_file_name(Some("grace")));
        assert_eq!(session_file_name(Some("")), "treetracker-session.json");
        assert_eq!(session_file_name(None), "treetracker-session.json");
    }

    #[test]
    fn test_outcome_from_flags() {
        assert_eq!(
            LocationOutcome::from_flags(Some(1.0), Some(2.0), false, false, false).unwrap(),
            LocationOutcome::Fix(Coordinate::new(1.0, 2.0).unwrap())
        );
        assert_eq!(
            LocationOutcome::from_flags(None, None, true, false, false).unwrap(),
            LocationOutcome::Denied
        );
        assert_eq!(
            LocationOutcome::from_flags(None, None, false, false, false).unwrap(),
            LocationOutcome::Unsupported
        );
        assert!(LocationOutcome::from_flags(Some(1.0), None, false, false, false).is_err());
        assert!(LocationOutcome::from_flags(Some(91.0), Some(0.0), false, false, false).is_err());
    }

    #[tokio::test]
    async fn test_capture_file_hands_off_record() {
        let dir = TempDir::new().unwrap();
        let paths = signed_in(&dir);
        let file = photo(&dir);
        let here = Coordinate::new(-1.2921, 36.8219).unwrap();

        let record = capture_file(
            &CaptureConfig::default(),
            &paths,
            &file,
            LocationOutcome::Fix(here),
        )
        .await
        .unwrap();

        assert_eq!(record.media.name, "baobab.jpg");
        assert_eq!(record.media.content_type, "image/jpeg");
        assert_eq!(record.location, here);
    }

    #[tokio::test]
    async fn test_capture_file_requires_sign_in() {
        let dir = TempDir::new().unwrap();
        let paths = TokenPaths::in_dir(dir.path());
        let file = photo(&dir);

        let err = capture_file(
            &CaptureConfig::default(),
            &paths,
            &file,
            LocationOutcome::Fix(Coordinate::new(0.0, 0.0).unwrap()),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Not signed in"));
    }

    #[tokio::test]
    async fn test_capture_file_reports_location_errors() {
        let dir = TempDir::new().unwrap();
        let paths = signed_in(&dir);
        let file = photo(&dir);

        let err = capture_file(&CaptureConfig::default(), &paths, &file, LocationOutcome::Denied)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Location access was denied. Please enable it in your browser settings."));

        let err = capture_file(
            &CaptureConfig::default(),
            &paths,
            &file,
            LocationOutcome::Unsupported,
        )
        .await
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Geolocation is not supported by your browser."));
    }

    #[tokio::test]
    async fn test_capture_file_rejects_non_image() {
        let dir = TempDir::new().unwrap();
        let paths = signed_in(&dir);
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"not a tree").unwrap();

        let err = capture_file(
            &CaptureConfig::default(),
            &paths,
            &file,
            LocationOutcome::Fix(Coordinate::new(0.0, 0.0).unwrap()),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }
}
