//! # Decisions Store
//!
//! Owns the fetched decisions and the load lifecycle, and broadcasts
//! immutable snapshots to the UI over a `tokio::sync::watch` channel.
//!
//! ## Staleness policy
//! A failed reload never wipes data that is already on screen. If a fetch
//! fails while the store holds a non-empty decision set, the previous
//! decisions and meta are kept, the error is logged at WARN and *not*
//! surfaced into the state. Only a failure with nothing to show yet puts the
//! store into the error state.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::client::FetchError;
use crate::decision::{Decision, DecisionsMeta, DecisionsPayload};
use crate::source::DecisionSource;

/// Snapshot of the decisions data handed to the UI each frame.
#[derive(Debug, Clone, Default)]
pub struct DecisionsState {
    /// A load is in flight.
    pub loading: bool,

    /// Terminal load failure, only when there is no data to show instead.
    pub error: Option<String>,

    /// Meta of the last successful payload.
    pub meta: Option<DecisionsMeta>,

    /// Decisions of the last successful payload.
    pub decisions: Vec<Decision>,
}

/// Mutable owner of [`DecisionsState`].
///
/// Lives behind an `Arc<Mutex<_>>` so that spawned reloads share it; each
/// completed load replaces the decision set wholesale (no merging, no dedup,
/// last write wins).
#[derive(Debug, Default)]
pub struct DecisionsStore {
    state: DecisionsState,
}

impl DecisionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a load as started: raises `loading`, clears any prior error.
    pub fn begin_load(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    /// Fold a load result into the state (see module staleness policy).
    pub fn complete(&mut self, result: Result<DecisionsPayload, FetchError>) {
        self.state.loading = false;
        match result {
            Ok(payload) => {
                tracing::info!(
                    "loaded {} decisions from {}",
                    payload.decisions.len(),
                    payload.meta.source
                );
                self.state.error = None;
                self.state.meta = Some(payload.meta);
                self.state.decisions = payload.decisions;
            }
            Err(err) if !self.state.decisions.is_empty() => {
                tracing::warn!(
                    "decisions fetch failed, keeping {} stale records: {}",
                    self.state.decisions.len(),
                    err
                );
            }
            Err(err) => {
                tracing::warn!("decisions fetch failed with no data to show: {}", err);
                self.state.error = Some(err.to_string());
            }
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> DecisionsState {
        self.state.clone()
    }
}

/// Create the state broadcast channel, seeded with the empty state.
pub fn make_state_channel() -> (watch::Sender<DecisionsState>, watch::Receiver<DecisionsState>) {
    watch::channel(DecisionsState::default())
}

/// Run one full load: broadcast the loading state, fetch, fold the result
/// into the store and broadcast the outcome.
///
/// Concurrent calls are not serialized beyond the store lock; overlapping
/// loads resolve last-write-wins, same as the completion order of the
/// fetches.
pub async fn load_decisions(
    source: Arc<dyn DecisionSource>,
    store: Arc<Mutex<DecisionsStore>>,
    tx: watch::Sender<DecisionsState>,
) {
    {
        let mut guard = store.lock().await;
        guard.begin_load();
        let _ = tx.send(guard.snapshot());
    }

    let result = source.fetch().await;

    let mut guard = store.lock().await;
    guard.complete(result);
    let _ = tx.send(guard.snapshot());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionsMeta;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn payload(countries: &[&str]) -> DecisionsPayload {
        DecisionsPayload {
            meta: DecisionsMeta {
                source: "routing-pipeline".to_string(),
                count: countries.len() as u64,
                generated_at: None,
            },
            decisions: countries
                .iter()
                .map(|c| Decision {
                    predicted_country: Some(c.to_string()),
                    ..Decision::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_initial_state_is_empty() {
        let store = DecisionsStore::new();
        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.meta.is_none());
        assert!(state.decisions.is_empty());
    }

    #[test]
    fn test_begin_load_raises_loading_and_clears_error() {
        let mut store = DecisionsStore::new();
        store.complete(Err(FetchError::Status { status: 500 }));
        assert!(store.snapshot().error.is_some());

        store.begin_load();
        let state = store.snapshot();
        assert!(state.loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_success_replaces_decisions() {
        let mut store = DecisionsStore::new();
        store.begin_load();
        store.complete(Ok(payload(&["US", "DE"])));

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(state.decisions.len(), 2);
        assert_eq!(state.meta.as_ref().map(|m| m.count), Some(2));

        // A later load fully replaces, it never merges.
        store.begin_load();
        store.complete(Ok(payload(&["JP"])));
        assert_eq!(store.snapshot().decisions.len(), 1);
    }

    #[test]
    fn test_failure_with_no_data_sets_error() {
        let mut store = DecisionsStore::new();
        store.begin_load();
        store.complete(Err(FetchError::Status { status: 500 }));

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some("failed to fetch decisions: 500")
        );
        assert!(state.decisions.is_empty());
    }

    #[test]
    fn test_failure_keeps_stale_decisions() {
        let mut store = DecisionsStore::new();
        store.begin_load();
        store.complete(Ok(payload(&["US", "DE"])));

        store.begin_load();
        store.complete(Err(FetchError::Status { status: 503 }));

        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none(), "stale data suppresses the error");
        assert_eq!(state.decisions.len(), 2);
        assert!(state.meta.is_some());
    }

    #[test]
    fn test_success_after_stale_failure_replaces() {
        let mut store = DecisionsStore::new();
        store.complete(Ok(payload(&["US"])));
        store.complete(Err(FetchError::Status { status: 500 }));
        store.complete(Ok(payload(&["JP", "IN", "CN"])));

        let state = store.snapshot();
        assert_eq!(state.decisions.len(), 3);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = DecisionsStore::new();
        store.complete(Ok(payload(&["US"])));

        let mut snap = store.snapshot();
        snap.decisions.clear();
        assert_eq!(store.snapshot().decisions.len(), 1);
    }

    struct FlakySource {
        fail_first: AtomicBool,
    }

    #[async_trait::async_trait]
    impl DecisionSource for FlakySource {
        async fn fetch(&self) -> Result<DecisionsPayload, FetchError> {
            if self.fail_first.swap(false, Ordering::SeqCst) {
                Err(FetchError::Status { status: 500 })
            } else {
                Ok(payload(&["US"]))
            }
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_decisions_broadcasts_outcome() {
        let (tx, mut rx) = make_state_channel();
        let store = Arc::new(Mutex::new(DecisionsStore::new()));
        let source: Arc<dyn DecisionSource> = Arc::new(FlakySource {
            fail_first: AtomicBool::new(true),
        });

        load_decisions(source.clone(), store.clone(), tx.clone()).await;
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.error.is_some());

        load_decisions(source, store, tx).await;
        let state = rx.borrow_and_update().clone();
        assert!(state.error.is_none());
        assert_eq!(state.decisions.len(), 1);
    }
}
