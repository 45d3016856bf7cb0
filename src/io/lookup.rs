//! Runs region-list fetches concurrently and hands the results back in
//! completion order. Ordering is deliberately not preserved; the region chain
//! discards whatever arrives stale.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::form::{LookupResponse, LookupTicket};

use super::RegionSource;

/// Fetches the options described by `ticket`. Never fails; errors travel
/// inside the response.
pub async fn resolve(source: &dyn RegionSource, ticket: LookupTicket) -> LookupResponse {
    let result = source
        .fetch_regions(ticket.level, ticket.parent_id.as_deref())
        .await
        .map_err(Into::into);
    LookupResponse { ticket, result }
}

pub struct LookupDispatcher {
    source: Arc<dyn RegionSource>,
    tx: mpsc::UnboundedSender<LookupResponse>,
    rx: mpsc::UnboundedReceiver<LookupResponse>,
    in_flight: usize,
}

impl LookupDispatcher {
    pub fn new(source: Arc<dyn RegionSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Starts a fetch on the current tokio runtime.
    pub fn spawn(&mut self, ticket: LookupTicket) {
        debug!(level = %ticket.level, parent = ?ticket.parent_id, "spawning region lookup");
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let response = resolve(source.as_ref(), ticket).await;
            // The receiver lives as long as the dispatcher.
            let _ = tx.send(response);
        });
    }

    pub fn spawn_all(&mut self, tickets: impl IntoIterator<Item = LookupTicket>) {
        for ticket in tickets {
            self.spawn(ticket);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Waits for the next finished fetch. `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<LookupResponse> {
        if self.in_flight == 0 {
            return None;
        }
        let response = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(response)
    }

    /// Non-blocking variant of [`LookupDispatcher::next`].
    pub fn try_next(&mut self) -> Option<LookupResponse> {
        let response = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(response)
    }
}
