//! Shared test harness: a workbench wired to mock collaborators.

use std::sync::Arc;

use sqldeck::api::mock::{MockBackend, RecordingNotifier, StaticFlags};
use sqldeck::config::{Config, PERSISTENCE_FLAG};
use sqldeck::events::WorkbenchEvent;
use sqldeck::workbench::{Collaborators, Workbench};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub workbench: Workbench,
    pub events: UnboundedReceiver<WorkbenchEvent>,
}

/// Builds a workbench over mocks, with backend persistence on or off.
pub fn harness(persistence_enabled: bool) -> Harness {
    // First caller installs the subscriber; later calls are refused, which
    // is fine here
    let _ = sqldeck::logging::init_stderr_logging();

    let backend = Arc::new(MockBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let flags = if persistence_enabled {
        StaticFlags::new().with_enabled(PERSISTENCE_FLAG)
    } else {
        StaticFlags::new()
    };

    let collaborators = Collaborators {
        execution: backend.clone(),
        tab_state: backend.clone(),
        saved_queries: backend.clone(),
        format: backend.clone(),
        flags: Arc::new(flags),
        notifier: notifier.clone(),
    };

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let workbench = Workbench::new(&Config::default(), collaborators, tx);

    Harness {
        backend,
        notifier,
        workbench,
        events: rx,
    }
}

/// Drains every event currently buffered on the channel.
pub fn drain(rx: &mut UnboundedReceiver<WorkbenchEvent>) -> Vec<WorkbenchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
