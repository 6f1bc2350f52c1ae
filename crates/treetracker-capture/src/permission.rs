//! Observable geolocation permission state
//!
//! `PermissionHub` is the in-process counterpart of the platform permission
//! object: it holds the current state and pushes every change to registered
//! observers. Platform adapters feed it with [`PermissionHub::set`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use treetracker_core::{LocationPermissionState, PermissionObserver, PermissionSource, Subscription};

type SharedObserver = Arc<dyn Fn(LocationPermissionState) + Send + Sync>;

struct HubInner {
    state: LocationPermissionState,
    next_id: u64,
    observers: HashMap<u64, SharedObserver>,
}

/// Permission source with live change notification.
#[derive(Clone)]
pub struct PermissionHub {
    inner: Arc<Mutex<HubInner>>,
}

impl PermissionHub {
    pub fn new(initial: LocationPermissionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                state: initial,
                next_id: 0,
                observers: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubInner> {
        // observers run outside the lock, so a poisoned guard still holds consistent data
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> LocationPermissionState {
        self.lock().state
    }

    /// Record a new state and notify observers if it changed.
    pub fn set(&self, state: LocationPermissionState) {
        let observers: Vec<SharedObserver> = {
            let mut inner = self.lock();
            if inner.state == state {
                return;
            }
            inner.state = state;
            inner.observers.values().cloned().collect()
        };

        tracing::debug!(
            permission = %state,
            observers = observers.len(),
            "Location permission changed"
        );

        for observer in observers {
            observer(state);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }
}

impl Default for PermissionHub {
    fn default() -> Self {
        Self::new(LocationPermissionState::Prompt)
    }
}

#[async_trait]
impl PermissionSource for PermissionHub {
    async fn query(&self) -> LocationPermissionState {
        self.state()
    }

    fn subscribe(&self, observer: PermissionObserver) -> Subscription {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.insert(id, Arc::from(observer));
            id
        };

        let weak: Weak<Mutex<HubInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                inner.observers.remove(&id);
            }
        })
    }
}

/// Platform without a permissions API: state stays unknown and no change
/// is ever reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionApi;

#[async_trait]
impl PermissionSource for NoPermissionApi {
    async fn query(&self) -> LocationPermissionState {
        LocationPermissionState::Unknown
    }

    fn subscribe(&self, _observer: PermissionObserver) -> Subscription {
        Subscription::noop()
    }
}
