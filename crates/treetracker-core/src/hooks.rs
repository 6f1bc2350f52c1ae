//! Collaborator traits
//!
//! The capture controller owns none of the platform services it talks to.
//! Location, permissions, media selection, upload, identity, and token
//! storage are reached through these traits so that platform adapters and
//! test doubles can be swapped in without touching the controller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{IdentityError, PickError};
use crate::models::{
    CaptureRecord, Coordinate, LocationFailureReason, LocationPermissionState, MediaAsset,
    PositionOptions, TokenSet,
};

/// Device geolocation service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Resolve a single fix. Implementations must honour `options` and
    /// resolve exactly once per call.
    async fn current_fix(
        &self,
        options: PositionOptions,
    ) -> Result<Coordinate, LocationFailureReason>;
}

/// Callback invoked with the new state whenever permission changes.
pub type PermissionObserver = Box<dyn Fn(LocationPermissionState) + Send + Sync>;

/// Platform permission subsystem for geolocation.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Current permission state
    async fn query(&self) -> LocationPermissionState;

    /// Register for out-of-band changes. The observer stays registered until
    /// the returned handle is dropped.
    fn subscribe(&self, observer: PermissionObserver) -> Subscription;
}

/// Handle for an observer registration; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to tear down
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Native file or camera chooser.
#[async_trait]
pub trait MediaPicker: Send {
    /// Let the user choose one image. Any previously chosen value is cleared
    /// before the chooser opens, so choosing the same file twice still
    /// yields a fresh selection. `Ok(None)` means the user cancelled.
    async fn choose(&mut self) -> Result<Option<MediaAsset>, PickError>;
}

/// Receives completed captures. Transport, retries, and acknowledgement
/// belong to the implementation.
pub trait UploadSink: Send + Sync {
    fn hand_off(&self, record: CaptureRecord);
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<TokenSet, IdentityError>;
}

/// Storage for issued tokens (persistent or per-session).
pub trait TokenStore: Send + Sync {
    /// Stored tokens, if any. Unreadable or corrupt data is an error.
    fn load(&self) -> anyhow::Result<Option<TokenSet>>;

    fn save(&self, tokens: &TokenSet) -> anyhow::Result<()>;

    fn clear(&self) -> anyhow::Result<()>;
}

/// Source of capture timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
