//! Location provider whose answers are controlled by the test

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{oneshot, Notify};

use treetracker_core::{Coordinate, LocationFailureReason, LocationProvider, PositionOptions};

type FixResult = Result<Coordinate, LocationFailureReason>;

enum Answer {
    Now(FixResult),
    Later(oneshot::Receiver<FixResult>),
}

#[derive(Default)]
struct ScriptState {
    calls: usize,
    last_options: Option<PositionOptions>,
    scripted: VecDeque<FixResult>,
    pending: VecDeque<oneshot::Sender<FixResult>>,
}

/// Provider that either answers from a script or parks each call until the
/// test resolves it, so tests decide the order in which fixes arrive.
#[derive(Default)]
pub struct ScriptedLocationProvider {
    state: Mutex<ScriptState>,
    calls_changed: Notify,
}

impl ScriptedLocationProvider {
    /// Every call waits for [`resolve_next`](Self::resolve_next)
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls consume `results` in order; once exhausted they wait
    pub fn with_results(results: impl IntoIterator<Item = FixResult>) -> Self {
        let provider = Self::default();
        provider.lock().scripted.extend(results);
        provider
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    pub fn last_options(&self) -> Option<PositionOptions> {
        self.lock().last_options
    }

    /// Answer the oldest parked call. Returns false if none is parked.
    pub fn resolve_next(&self, result: FixResult) -> bool {
        match self.lock().pending.pop_front() {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    /// Wait until the provider has been called at least `n` times.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let changed = self.calls_changed.notified();
            if self.call_count() >= n {
                return;
            }
            changed.await;
        }
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocationProvider {
    async fn current_fix(&self, options: PositionOptions) -> FixResult {
        let receiver = {
            let mut state = self.lock();
            state.calls += 1;
            state.last_options = Some(options);
            match state.scripted.pop_front() {
                Some(result) => Answer::Now(result),
                None => {
                    let (tx, rx) = oneshot::channel();
                    state.pending.push_back(tx);
                    Answer::Later(rx)
                }
            }
        };
        self.calls_changed.notify_waiters();

        match receiver {
            Answer::Now(result) => result,
            // a dropped sender behaves like a sensor failure
            Answer::Later(rx) => rx
                .await
                .unwrap_or(Err(LocationFailureReason::PositionUnavailable)),
        }
    }
}
