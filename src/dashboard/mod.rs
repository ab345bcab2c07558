//! Endpoint dashboard — calls a fixed list of API endpoints and publishes
//! the per-endpoint outcomes to a renderer.
//!
//! # Passes
//!
//! [`EndpointAggregator::activate_all`] calls every descriptor strictly one
//! at a time, in list order, and collects an outcome for each. A failing
//! call becomes an `"Error: …"` string in its slot and the pass continues.
//! [`EndpointAggregator::activate_one`] does the same for a single path.
//!
//! # State publication
//!
//! The current [`AggregationState`] lives in a [`watch`] channel. A pass
//! flips `loading` on while keeping the previous results, then publishes
//! the finished result list and `loading = false` in one replacement, so
//! subscribers never observe a half-built list. A pass whose future is
//! dropped before it finishes clears `loading` and leaves the previous
//! results in place.
//!
//! Passes on one aggregator are serialized: an activation that arrives
//! while another is running waits for it to finish.

pub mod render;
pub mod transport;

pub use render::{Renderer, TerminalRenderer, drive};
pub use transport::{Transport, TransportError, TransportFuture};
#[cfg(feature = "dashboard")]
pub use transport::HttpTransport;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

// ── Data model ────────────────────────────────────────────────────────────────

/// One dashboard-callable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub label: String,
    pub path: String,
}

impl EndpointDescriptor {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Parsed response body, or the error text shown in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutcomeData {
    Json(Value),
    Error(String),
}

impl OutcomeData {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Result of one call within a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub label: String,
    pub path: String,
    pub data: OutcomeData,
}

/// What a renderer is shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationState {
    pub loading: bool,
    pub results: Vec<CallOutcome>,
}

// ── EndpointAggregator ────────────────────────────────────────────────────────

pub struct EndpointAggregator {
    transport: Arc<dyn Transport>,
    descriptors: Arc<[EndpointDescriptor]>,
    state: watch::Sender<AggregationState>,
    /// Held for the whole of a pass.
    pass_lock: Mutex<()>,
}

impl EndpointAggregator {
    pub fn new(
        transport: Arc<dyn Transport>,
        descriptors: impl Into<Arc<[EndpointDescriptor]>>,
    ) -> Self {
        let (state, _) = watch::channel(AggregationState::default());
        Self {
            transport,
            descriptors: descriptors.into(),
            state,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn descriptors(&self) -> &[EndpointDescriptor] {
        &self.descriptors
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AggregationState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<AggregationState> {
        self.state.subscribe()
    }

    /// Call every descriptor in order and replace the results with one
    /// outcome per descriptor.
    pub async fn activate_all(&self) {
        let _lock = self.pass_lock.lock().await;
        let pass = self.begin_pass();

        let mut results = Vec::with_capacity(self.descriptors.len());
        for descriptor in self.descriptors.iter() {
            results.push(self.call(&descriptor.label, &descriptor.path).await);
        }

        let failed = results.iter().filter(|o| o.data.is_error()).count();
        info!(calls = results.len(), failed, "dashboard pass complete");
        pass.finish(results);
    }

    /// Call a single path and replace the results with its outcome alone.
    /// The outcome is labelled with the path itself.
    pub async fn activate_one(&self, path: &str) {
        let _lock = self.pass_lock.lock().await;
        let pass = self.begin_pass();
        let outcome = self.call(path, path).await;
        pass.finish(vec![outcome]);
    }

    fn begin_pass(&self) -> PassGuard<'_> {
        self.state.send_modify(|state| state.loading = true);
        PassGuard {
            state: &self.state,
            finished: false,
        }
    }

    async fn call(&self, label: &str, path: &str) -> CallOutcome {
        debug!(%label, %path, "calling endpoint");
        let data = match self.transport.get(path).await {
            Ok(body) => OutcomeData::Json(body),
            Err(e) => {
                warn!(%label, %path, "endpoint call failed: {e}");
                OutcomeData::Error(format!("Error: {e}"))
            }
        };
        CallOutcome {
            label: label.to_string(),
            path: path.to_string(),
            data,
        }
    }
}

/// Open pass. Dropping it without [`PassGuard::finish`] (the pass future
/// was cancelled) clears `loading` and keeps the previous results.
struct PassGuard<'a> {
    state: &'a watch::Sender<AggregationState>,
    finished: bool,
}

impl PassGuard<'_> {
    fn finish(mut self, results: Vec<CallOutcome>) {
        self.finished = true;
        self.state.send_replace(AggregationState {
            loading: false,
            results,
        });
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("dashboard pass cancelled");
            self.state.send_modify(|state| state.loading = false);
        }
    }
}
