//! Orchestration facade for the workbench.
//!
//! The operations host event handlers invoke. Each one mutates local state
//! synchronously (optimistic), then mirrors the change through the sync
//! gateway; a successful create triggers migration of the editor graph onto
//! durable backend identities.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};

use crate::api::{
    CapabilityFlags, ExecutionApi, FormatApi, NoticeLevel, Notifier, SavedQueryApi,
    SavedQueryPayload, TabStateApi,
};
use crate::config::Config;
use crate::error::{Result, SqldeckError};
use crate::events::{EventSink, WorkbenchEvent};
use crate::ids::{EditorId, QueryId, TableId};
use crate::lifecycle::{QueryLifecycle, RunOptions};
use crate::migrate::plan_migration;
use crate::model::{QueryEditor, Table, UnsavedQueryEditor};
use crate::store::Store;
use crate::sync::SyncGateway;
use crate::tabs::{self, Direction};

/// Backend collaborators injected into the facade.
pub struct Collaborators {
    pub execution: Arc<dyn ExecutionApi>,
    pub tab_state: Arc<dyn TabStateApi>,
    pub saved_queries: Arc<dyn SavedQueryApi>,
    pub format: Arc<dyn FormatApi>,
    pub flags: Arc<dyn CapabilityFlags>,
    pub notifier: Arc<dyn Notifier>,
}

/// The workbench engine: state store, lifecycle, and sync gateway composed
/// behind the operations the host calls.
pub struct Workbench {
    store: Store,
    lifecycle: QueryLifecycle,
    gateway: SyncGateway,
    saved_queries: Arc<dyn SavedQueryApi>,
    format: Arc<dyn FormatApi>,
    notifier: Arc<dyn Notifier>,
    events: EventSink,
}

impl Workbench {
    /// Creates a workbench over the given collaborators and event channel.
    pub fn new(
        config: &Config,
        collaborators: Collaborators,
        events: tokio::sync::mpsc::UnboundedSender<WorkbenchEvent>,
    ) -> Self {
        let sink = EventSink::new(events);
        Self {
            store: Store::new(),
            lifecycle: QueryLifecycle::new(
                collaborators.execution,
                sink.clone(),
                config.default_row_limit,
                config.preview_row_limit,
            ),
            gateway: SyncGateway::new(collaborators.tab_state, collaborators.flags),
            saved_queries: collaborators.saved_queries,
            format: collaborators.format,
            notifier: collaborators.notifier,
            events: sink,
        }
    }

    /// Read access to the state store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The editor's committed snapshot merged with its unsaved overlay,
    /// overlay fields taking precedence.
    pub fn up_to_date_editor(&self, id: &EditorId) -> Option<QueryEditor> {
        self.store.merged_editor(id)
    }

    // Editor creation

    /// Opens a new tab, deriving the next "Untitled Query N" name and
    /// seeding execution context from the active editor when present.
    pub async fn add_new_query_editor(&mut self) -> EditorId {
        let mut editor = QueryEditor::new_local(self.next_untitled_name());
        if let Some(active) = self
            .store
            .active_editor()
            .cloned()
            .and_then(|id| self.store.merged_editor(&id))
        {
            editor.sql = active.sql.clone();
            editor.database_id = active.database_id;
            editor.catalog = active.catalog.clone();
            editor.schema = active.schema.clone();
            editor.query_limit = active.query_limit;
        }
        self.open_editor(editor).await
    }

    /// Opens a new tab prefilled with the given query's SQL, named
    /// "Copy of <source editor name>".
    pub async fn clone_query_to_new_tab(
        &mut self,
        query_id: &QueryId,
        autorun: bool,
    ) -> Result<EditorId> {
        let query = self
            .store
            .query(query_id)
            .ok_or_else(|| SqldeckError::internal(format!("unknown query {query_id}")))?
            .clone();
        let source = self
            .store
            .merged_editor(&query.query_editor_id)
            .ok_or_else(|| {
                SqldeckError::internal(format!("unknown editor {}", query.query_editor_id))
            })?;

        let mut editor = QueryEditor::new_local(format!("Copy of {}", source.name));
        editor.sql = query.sql.clone();
        editor.database_id = source.database_id;
        editor.catalog = source.catalog.clone();
        editor.schema = source.schema.clone();
        editor.autorun = autorun;
        Ok(self.open_editor(editor).await)
    }

    /// Fetches a saved query and opens a tab prefilled from it. A fetch
    /// failure surfaces as a danger-level notification.
    pub async fn pop_saved_query(&mut self, id: u64) -> Option<EditorId> {
        match self.saved_queries.get(id).await {
            Ok(record) => {
                let mut editor = QueryEditor::new_local(record.label);
                editor.sql = record.sql;
                editor.database_id = record.database_id;
                editor.catalog = record.catalog;
                editor.schema = record.schema;
                editor.template_params = record.template_params;
                Some(self.open_editor(editor).await)
            }
            Err(e) => {
                warn!(saved_query_id = id, error = %e, "saved query fetch failed");
                self.notifier.notify(
                    NoticeLevel::Danger,
                    &format!("Could not load saved query: {e}"),
                );
                None
            }
        }
    }

    /// Inserts the editor, activates it, mirrors the create, and migrates
    /// on success. Returns the editor's id after any migration.
    async fn open_editor(&mut self, editor: QueryEditor) -> EditorId {
        let id = editor.id.clone();
        self.store.insert_editor(editor);
        self.activate(&id);
        self.migrate_if_created(&id).await
    }

    /// Mirrors the create for a local editor; on success applies the whole
    /// migration transaction as one state transition, then flushes updates
    /// deferred while it was pending.
    async fn migrate_if_created(&mut self, id: &EditorId) -> EditorId {
        let Some(editor) = self.store.editor(id).cloned() else {
            return id.clone();
        };
        if !editor.in_local_storage {
            return id.clone();
        }
        let Some(remote_id) = self.gateway.mirror_create_editor(&editor).await else {
            return id.clone();
        };

        let owned: Vec<Table> = self
            .store
            .tables_for_editor(id)
            .into_iter()
            .cloned()
            .collect();
        let mut table_ids = Vec::with_capacity(owned.len());
        for table in &owned {
            let durable = self.gateway.mirror_create_table(table, remote_id).await;
            table_ids.push((table.id.clone(), durable));
        }

        match plan_migration(&self.store, id, remote_id, &table_ids) {
            Ok(txn) => {
                let new_id = txn.new_editor.id.clone();
                self.store.apply_migration(&txn);
                self.gateway.flush_deferred(id, remote_id).await;
                info!(old_id = %id, %new_id, "editor migrated to durable identity");
                new_id
            }
            Err(e) => {
                warn!(%id, error = %e, "migration planning failed");
                id.clone()
            }
        }
    }

    /// Retries backend persistence for an editor still lacking a durable
    /// identity (e.g. after a failed create mirror). Returns the editor's
    /// id after any migration; no-op for already-durable editors.
    pub async fn persist_editor(&mut self, id: &EditorId) -> EditorId {
        self.migrate_if_created(id).await
    }

    // Editor mutation

    pub async fn set_editor_title(&mut self, id: &EditorId, name: &str) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_sql(&mut self, id: &EditorId, sql: &str) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                sql: Some(sql.to_string()),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_database(&mut self, id: &EditorId, database_id: u64) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                database_id: Some(database_id),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_catalog(&mut self, id: &EditorId, catalog: Option<String>) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                catalog,
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_schema(&mut self, id: &EditorId, schema: Option<String>) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                schema,
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_query_limit(&mut self, id: &EditorId, limit: u64) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                query_limit: Some(limit),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_template_params(&mut self, id: &EditorId, params: Option<String>) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                template_params: params,
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn set_autorun(&mut self, id: &EditorId, autorun: bool) {
        self.apply_editor_changes(
            id,
            UnsavedQueryEditor {
                autorun: Some(autorun),
                ..Default::default()
            },
        )
        .await;
    }

    /// Records the changes into the unsaved overlay, then mirrors them.
    async fn apply_editor_changes(&mut self, id: &EditorId, changes: UnsavedQueryEditor) {
        if changes.is_empty() {
            return;
        }
        self.store.record_unsaved(id, &changes);
        if let Some(editor) = self.store.editor(id).cloned() {
            self.gateway.mirror_update_editor(&editor, &changes).await;
        }
    }

    /// Replaces the editor's SQL with the remotely formatted text.
    pub async fn format_editor_sql(&mut self, id: &EditorId) {
        let Some(editor) = self.store.merged_editor(id) else {
            return;
        };
        match self.format.format_sql(&editor.sql).await {
            Ok(formatted) => self.set_sql(id, &formatted).await,
            Err(e) => {
                warn!(editor_id = %id, error = %e, "sql format failed");
                self.notifier
                    .notify(NoticeLevel::Danger, &format!("Could not format SQL: {e}"));
            }
        }
    }

    /// Closes an editor; the successor tab is chosen by cycling forward
    /// from the closed tab's history position.
    pub async fn remove_query_editor(&mut self, id: &EditorId) {
        let Some(editor) = self.store.editor(id).cloned() else {
            return;
        };

        let successor = if self.store.active_editor() == Some(id) {
            tabs::switch_target(&self.store, Direction::Next).filter(|s| s != id)
        } else {
            None
        };

        let removed_tables = self.store.remove_editor(id);
        self.gateway.mirror_delete_editor(&editor).await;
        self.gateway.mirror_delete_tables(&removed_tables).await;

        if let Some(successor) = successor {
            self.set_active_editor(&successor);
        }
    }

    // Tab switching

    /// Makes the editor active, committing the previously active editor's
    /// overlay first. Emits the merged up-to-date view.
    pub fn set_active_editor(&mut self, id: &EditorId) {
        if let Some(previous) = self.store.active_editor().cloned() {
            if &previous != id {
                self.store.commit_overlay(&previous);
            }
        }
        self.activate(id);
    }

    /// Cycles to the next or previous tab with wraparound.
    pub fn switch_tab(&mut self, direction: Direction) {
        if let Some(target) = tabs::switch_target(&self.store, direction) {
            self.set_active_editor(&target);
        }
    }

    fn activate(&mut self, id: &EditorId) {
        if let Some(merged) = self.store.merged_editor(id) {
            self.store.visit(id);
            self.events
                .emit(WorkbenchEvent::ActiveEditorChanged { editor: merged });
        }
    }

    // Tables

    /// Pins a table in the schema browser under the given editor.
    pub async fn add_table(
        &mut self,
        editor_id: &EditorId,
        name: &str,
        catalog: Option<String>,
        schema: Option<String>,
    ) -> Result<TableId> {
        let editor = self
            .store
            .merged_editor(editor_id)
            .ok_or_else(|| SqldeckError::internal(format!("unknown editor {editor_id}")))?;

        let table = Table::new_local(
            editor_id.clone(),
            name,
            catalog,
            schema,
            editor.database_id,
        );
        let table_id = table.id.clone();
        self.store.insert_table(table.clone());

        // Tables under a durable editor get their durable id directly;
        // under a local editor they migrate together with it.
        if let Some(remote_editor) = editor.remote_id {
            if let Some(durable) = self.gateway.mirror_create_table(&table, remote_editor).await {
                let new_id = TableId::from_durable(durable);
                self.store.promote_table(&table_id, durable);
                return Ok(new_id);
            }
        }
        Ok(table_id)
    }

    pub async fn expand_table(&mut self, id: &TableId) {
        self.set_table_expanded(id, true).await;
    }

    pub async fn collapse_table(&mut self, id: &TableId) {
        self.set_table_expanded(id, false).await;
    }

    async fn set_table_expanded(&mut self, id: &TableId, expanded: bool) {
        let Some(table) = self.store.table_mut(id) else {
            return;
        };
        table.expanded = expanded;
        let table = table.clone();
        self.gateway.mirror_update_table(&table).await;
    }

    /// Drops tables locally; backend deletes go out only for entities the
    /// backend knows about.
    pub async fn remove_tables(&mut self, ids: &[TableId]) {
        let removed = self.store.remove_tables(ids);
        self.gateway.mirror_delete_tables(&removed).await;
    }

    // Query execution

    /// Runs the editor's up-to-date SQL through the query lifecycle, then
    /// mirrors the new `latest_query_id` into tab state.
    pub async fn run_query(&mut self, editor_id: &EditorId, options: RunOptions) -> Result<QueryId> {
        let editor = self
            .store
            .merged_editor(editor_id)
            .ok_or_else(|| SqldeckError::internal(format!("unknown editor {editor_id}")))?;

        let query_id = self.lifecycle.run(&mut self.store, &editor, options).await;

        if let Some(committed) = self.store.editor(editor_id).cloned() {
            let changes = UnsavedQueryEditor {
                latest_query_id: Some(query_id.clone()),
                ..Default::default()
            };
            self.gateway.mirror_update_editor(&committed, &changes).await;
        }
        Ok(query_id)
    }

    /// Stops a running query; local state transitions immediately.
    pub async fn stop_query(&mut self, query_id: &QueryId) {
        self.lifecycle.stop(&mut self.store, query_id).await;
    }

    /// Re-fetches a results page for a submitted query.
    pub async fn fetch_query_results(&mut self, query_id: &QueryId, page: u64) {
        self.lifecycle
            .fetch_results(&mut self.store, query_id, page)
            .await;
    }

    /// Runs a bounded data preview for a schema-browser table. Previews are
    /// independent of the editor's main query slot and never mirrored.
    pub async fn run_table_preview(
        &mut self,
        table_id: &TableId,
        disable_preview: bool,
    ) -> Option<QueryId> {
        self.lifecycle
            .run_table_preview(&mut self.store, table_id, disable_preview)
            .await
    }

    // Saved queries

    /// Saves the editor's up-to-date state as a named backend query.
    pub async fn save_query(&mut self, editor_id: &EditorId, label: &str) -> Option<u64> {
        let payload = match self.saved_query_payload(editor_id, label) {
            Some(p) => p,
            None => return None,
        };
        match self.saved_queries.create(&payload).await {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!(editor_id = %editor_id, error = %e, "save query failed");
                self.notifier
                    .notify(NoticeLevel::Danger, &format!("Could not save query: {e}"));
                None
            }
        }
    }

    /// Updates an existing saved query from the editor's up-to-date state.
    pub async fn update_saved_query(&mut self, id: u64, editor_id: &EditorId, label: &str) -> bool {
        let Some(payload) = self.saved_query_payload(editor_id, label) else {
            return false;
        };
        match self.saved_queries.update(id, &payload).await {
            Ok(_) => true,
            Err(e) => {
                warn!(saved_query_id = id, error = %e, "saved query update failed");
                self.notifier
                    .notify(NoticeLevel::Danger, &format!("Could not update query: {e}"));
                false
            }
        }
    }

    /// Builds the outbound payload with every mapper field present.
    fn saved_query_payload(&self, editor_id: &EditorId, label: &str) -> Option<SavedQueryPayload> {
        let editor = self.store.merged_editor(editor_id)?;
        Some(SavedQueryPayload {
            label: label.to_string(),
            database_id: editor.database_id,
            catalog: editor.catalog,
            schema: editor.schema,
            sql: editor.sql,
            template_params: editor.template_params,
        })
    }

    /// Derives "Untitled Query N" by incrementing the highest existing
    /// suffix across committed and overlay names.
    fn next_untitled_name(&self) -> String {
        static UNTITLED: OnceLock<Regex> = OnceLock::new();
        let pattern = UNTITLED
            .get_or_init(|| Regex::new(r"^Untitled Query (\d+)$").expect("static pattern"));
        let max = self
            .store
            .merged_editors()
            .iter()
            .filter_map(|e| pattern.captures(&e.name))
            .filter_map(|c| c[1].parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("Untitled Query {}", max + 1)
    }
}
