//! Rendering surface for aggregation state.

use std::io::Write;

use tokio::sync::watch;
use tracing::warn;

use super::{AggregationState, CallOutcome, OutcomeData};

/// Accepts the current result list and loading flag.
pub trait Renderer {
    fn render(&mut self, results: &[CallOutcome], loading: bool);
}

/// Render every state published on `rx` until the aggregator is dropped,
/// then hand the renderer back.
///
/// Rapid updates may coalesce; each render still sees one whole state.
pub async fn drive<R: Renderer>(mut rx: watch::Receiver<AggregationState>, mut renderer: R) -> R {
    loop {
        {
            let state = rx.borrow_and_update();
            renderer.render(&state.results, state.loading);
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    renderer
}

/// Plain-text renderer: one block per outcome.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_state(&mut self, results: &[CallOutcome], loading: bool) -> std::io::Result<()> {
        if loading {
            writeln!(self.out, "Loading...")?;
            return self.out.flush();
        }
        for outcome in results {
            writeln!(self.out, "== {} ({})", outcome.label, outcome.path)?;
            match &outcome.data {
                OutcomeData::Json(value) => {
                    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                    writeln!(self.out, "{pretty}")?;
                }
                OutcomeData::Error(message) => writeln!(self.out, "{message}")?,
            }
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, results: &[CallOutcome], loading: bool) {
        if let Err(e) = self.write_state(results, loading) {
            warn!("dashboard render failed: {e}");
        }
    }
}
