//! Lifecycle and navigation events emitted by the engine.
//!
//! Outcomes are a closed set of tagged variants so host applications handle
//! them exhaustively; delivery goes through an injected unbounded channel.

use crate::ids::QueryId;
use crate::model::{Query, QueryEditor, ResultSet};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Issue codes attached to failed query payloads for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCode {
    pub code: u32,
    pub message: String,
}

/// Transport-level failure.
pub const ISSUE_TRANSPORT: u32 = 1000;
/// Failure classified as a timeout.
pub const ISSUE_TIMEOUT: u32 = 1001;

impl IssueCode {
    /// Issue codes for a failed network call, richer when timeout-classified.
    pub fn for_network_failure(timed_out: bool) -> Vec<IssueCode> {
        let mut codes = vec![IssueCode {
            code: ISSUE_TRANSPORT,
            message: "The backend could not be reached".to_string(),
        }];
        if timed_out {
            codes.push(IssueCode {
                code: ISSUE_TIMEOUT,
                message: "The query exceeded the transport timeout".to_string(),
            });
        }
        codes
    }
}

/// Failure payload carried by [`WorkbenchEvent::QueryFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub message: String,
    pub issue_codes: Vec<IssueCode>,
}

/// Events emitted to the host application.
#[derive(Debug, Clone)]
pub enum WorkbenchEvent {
    /// A query was submitted; emitted before the network call.
    QueryStarted { query: Query },
    /// A query completed with decoded results.
    QuerySuccess { query_id: QueryId, results: ResultSet },
    /// A query failed; payload carries issue codes for diagnostics.
    QueryFailed { query_id: QueryId, failure: QueryFailure },
    /// A query was stopped locally (fire-and-forget backend stop).
    QueryStopped { query_id: QueryId },
    /// The active editor changed; carries the merged up-to-date view.
    ActiveEditorChanged { editor: QueryEditor },
}

/// Thin wrapper over the event channel.
///
/// A closed receiver is not an error: the host may have shut down while
/// operations were still in flight.
#[derive(Clone)]
pub struct EventSink {
    tx: UnboundedSender<WorkbenchEvent>,
}

impl EventSink {
    /// Creates a sink over the given sender.
    pub fn new(tx: UnboundedSender<WorkbenchEvent>) -> Self {
        Self { tx }
    }

    /// Emits an event, ignoring a closed receiver.
    pub fn emit(&self, event: WorkbenchEvent) {
        if self.tx.send(event).is_err() {
            debug!("event receiver dropped; event discarded");
        }
    }
}
