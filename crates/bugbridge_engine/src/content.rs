use bridge_logging::{bridge_debug, bridge_warn};
use bugbridge_core::PageMessage;
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::notifier::Port;
use crate::page::PageError;
use crate::reconciler::{Outcome, PageReconciler};

/// Tally of the passes a [`ContentScript::run`] drove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rendered: usize,
    pub ignored: usize,
    pub superseded: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, result: Result<Outcome, PageError>) {
        match result {
            Ok(Outcome::Rendered { .. }) => self.rendered += 1,
            Ok(Outcome::Ignored) => self.ignored += 1,
            Ok(Outcome::Superseded { .. }) => self.superseded += 1,
            Err(err) => {
                bridge_warn!("Page reconciliation failed: {}", err);
                self.failed += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.rendered + self.ignored + self.superseded + self.failed
    }
}

/// Page-side driver: one reconciliation on load, then one per page-change
/// message.
pub struct ContentScript {
    reconciler: PageReconciler,
}

impl ContentScript {
    pub fn new(reconciler: PageReconciler) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &PageReconciler {
        &self.reconciler
    }

    /// Serve `port` until the background side goes away.
    ///
    /// Passes are started as messages arrive without waiting for earlier ones,
    /// so a pass stuck waiting for the action bar does not hold up later
    /// messages. Passes still running when the port closes are finished before
    /// returning.
    pub async fn run(&self, mut port: Port) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut in_flight = FuturesUnordered::new();

        // No message arrives for the initial load.
        in_flight.push(self.reconciler.on_page_change());

        loop {
            tokio::select! {
                message = port.recv() => match message {
                    Some(PageMessage::PageChanged) => {
                        in_flight.push(self.reconciler.on_page_change());
                    }
                    None => break,
                },
                Some(result) = in_flight.next(), if !in_flight.is_empty() => {
                    summary.record(result);
                }
            }
        }

        bridge_debug!(
            "Port for tab {} closed with {} pass(es) in flight",
            port.tab_id(),
            in_flight.len()
        );
        while let Some(result) = in_flight.next().await {
            summary.record(result);
        }
        summary
    }
}
