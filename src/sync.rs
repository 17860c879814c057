//! Persistence sync gateway: best-effort backend mirroring.
//!
//! Every mutating operation on an editor or table optionally mirrors to the
//! backend, gated by the `sqllab_backend_persistence` capability flag. Local
//! state is authoritative: mirror failures are logged and swallowed, never
//! rolled back. Updates for an editor that has not migrated yet are held in
//! a per-editor queue and flushed once its durable id exists, which also
//! serializes an editor's backend operations behind its migration.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{CapabilityFlags, TabStateApi};
use crate::config::PERSISTENCE_FLAG;
use crate::ids::EditorId;
use crate::model::{QueryEditor, Table, UnsavedQueryEditor};

/// Gateway deciding, per mutation, whether and how to mirror local state.
pub struct SyncGateway {
    api: Arc<dyn TabStateApi>,
    flags: Arc<dyn CapabilityFlags>,
    /// Updates deferred until the editor's migration resolves.
    pending: HashMap<EditorId, VecDeque<UnsavedQueryEditor>>,
}

impl SyncGateway {
    pub fn new(api: Arc<dyn TabStateApi>, flags: Arc<dyn CapabilityFlags>) -> Self {
        Self {
            api,
            flags,
            pending: HashMap::new(),
        }
    }

    /// Whether backend persistence is enabled at all.
    pub fn enabled(&self) -> bool {
        self.flags.is_enabled(PERSISTENCE_FLAG)
    }

    /// Mirrors an editor create. Returns the durable backend id on success;
    /// `None` when persistence is disabled or the call failed.
    pub async fn mirror_create_editor(&self, editor: &QueryEditor) -> Option<u64> {
        if !self.enabled() {
            return None;
        }
        match self.api.create_editor(editor).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(editor_id = %editor.id, error = %e, "editor create mirror failed");
                None
            }
        }
    }

    /// Mirrors an editor update. Durable editors update in place; local
    /// editors defer the changes until migration resolves.
    pub async fn mirror_update_editor(&mut self, editor: &QueryEditor, changes: &UnsavedQueryEditor) {
        if !self.enabled() {
            return;
        }
        match editor.remote_id {
            Some(remote_id) => {
                if let Err(e) = self.api.update_editor(remote_id, changes).await {
                    warn!(editor_id = %editor.id, error = %e, "editor update mirror failed");
                }
            }
            None => {
                debug!(editor_id = %editor.id, "deferring update until migration");
                self.pending
                    .entry(editor.id.clone())
                    .or_default()
                    .push_back(changes.clone());
            }
        }
    }

    /// Flushes updates deferred while `old_id` awaited migration, in order,
    /// against the durable id.
    pub async fn flush_deferred(&mut self, old_id: &EditorId, remote_id: u64) {
        let Some(mut queue) = self.pending.remove(old_id) else {
            return;
        };
        while let Some(changes) = queue.pop_front() {
            if let Err(e) = self.api.update_editor(remote_id, &changes).await {
                warn!(%old_id, error = %e, "deferred editor update mirror failed");
            }
        }
    }

    /// Number of updates currently deferred for an editor.
    pub fn deferred_count(&self, id: &EditorId) -> usize {
        self.pending.get(id).map_or(0, VecDeque::len)
    }

    /// Mirrors an editor delete; purely local editors are dropped silently.
    pub async fn mirror_delete_editor(&mut self, editor: &QueryEditor) {
        self.pending.remove(&editor.id);
        if !self.enabled() {
            return;
        }
        let Some(remote_id) = editor.remote_id else {
            return;
        };
        if let Err(e) = self.api.delete_editor(remote_id).await {
            warn!(editor_id = %editor.id, error = %e, "editor delete mirror failed");
        }
    }

    /// Mirrors a table create under an already-durable editor. Returns the
    /// durable table id on success.
    pub async fn mirror_create_table(&self, table: &Table, editor_remote_id: u64) -> Option<u64> {
        if !self.enabled() {
            return None;
        }
        match self.api.create_table(table, editor_remote_id).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(table_id = %table.id, error = %e, "table create mirror failed");
                None
            }
        }
    }

    /// Mirrors a table expand/collapse for durable tables.
    pub async fn mirror_update_table(&self, table: &Table) {
        if !self.enabled() || !table.initialized {
            return;
        }
        let Some(remote_id) = durable_table_id(table) else {
            return;
        };
        if let Err(e) = self.api.update_table(remote_id, table.expanded).await {
            warn!(table_id = %table.id, error = %e, "table update mirror failed");
        }
    }

    /// Mirrors deletes for the durable tables among `tables`; purely local
    /// entries issue no network call. Returns the number of deletes sent.
    pub async fn mirror_delete_tables(&self, tables: &[Table]) -> usize {
        if !self.enabled() {
            return 0;
        }
        let mut issued = 0;
        for table in tables {
            if !table.initialized {
                continue;
            }
            let Some(remote_id) = durable_table_id(table) else {
                continue;
            };
            issued += 1;
            if let Err(e) = self.api.delete_table(remote_id).await {
                warn!(table_id = %table.id, error = %e, "table delete mirror failed");
            }
        }
        issued
    }
}

/// Durable table ids are stringified backend integers by construction.
fn durable_table_id(table: &Table) -> Option<u64> {
    table.id.as_str().parse().ok()
}
