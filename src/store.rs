//! Authoritative in-memory state for the workbench.
//!
//! A pure state layer separated from the async operations so the mutation
//! rules (terminal-state idempotence, atomic migration apply) can be tested
//! without any network collaborators. The sync gateway mirrors changes out
//! of this store; it never mutates it.

use std::collections::HashMap;

use crate::ids::{EditorId, QueryId, TableId};
use crate::migrate::MigrationTransaction;
use crate::model::{Query, QueryEditor, QueryStatus, ResultSet, Table, UnsavedQueryEditor};

/// In-memory store of editors, overlays, tables, queries, and tab history.
#[derive(Default)]
pub struct Store {
    editors: HashMap<EditorId, QueryEditor>,
    /// Tab order, as displayed; drives next/previous navigation.
    editor_order: Vec<EditorId>,
    unsaved: HashMap<EditorId, UnsavedQueryEditor>,
    tables: HashMap<TableId, Table>,
    table_order: Vec<TableId>,
    queries: HashMap<QueryId, Query>,
    /// Visit order of editor ids, most recent last.
    tab_history: Vec<EditorId>,
    active_editor: Option<EditorId>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // Editors

    /// Inserts a new editor at the end of the tab order.
    pub fn insert_editor(&mut self, editor: QueryEditor) {
        self.editor_order.push(editor.id.clone());
        self.editors.insert(editor.id.clone(), editor);
    }

    pub fn editor(&self, id: &EditorId) -> Option<&QueryEditor> {
        self.editors.get(id)
    }

    pub fn editor_mut(&mut self, id: &EditorId) -> Option<&mut QueryEditor> {
        self.editors.get_mut(id)
    }

    /// Returns the editor ids in tab order.
    pub fn editor_order(&self) -> &[EditorId] {
        &self.editor_order
    }

    /// Returns the committed snapshot merged with its unsaved overlay.
    pub fn merged_editor(&self, id: &EditorId) -> Option<QueryEditor> {
        let editor = self.editors.get(id)?;
        match self.unsaved.get(id) {
            Some(overlay) => Some(editor.merge_unsaved(overlay)),
            None => Some(editor.clone()),
        }
    }

    /// Iterates over all merged editor views in tab order.
    pub fn merged_editors(&self) -> Vec<QueryEditor> {
        self.editor_order
            .iter()
            .filter_map(|id| self.merged_editor(id))
            .collect()
    }

    /// Records changed fields into the editor's unsaved overlay.
    pub fn record_unsaved(&mut self, id: &EditorId, changes: &UnsavedQueryEditor) {
        self.unsaved.entry(id.clone()).or_default().absorb(changes);
    }

    /// Folds the unsaved overlay into the committed snapshot.
    pub fn commit_overlay(&mut self, id: &EditorId) {
        if let Some(overlay) = self.unsaved.remove(id) {
            if let Some(editor) = self.editors.get(id) {
                let merged = editor.merge_unsaved(&overlay);
                self.editors.insert(id.clone(), merged);
            }
        }
    }

    /// Removes an editor, its overlay, its tab-history entries, and all
    /// tables it owns. Returns the removed tables for mirroring decisions.
    pub fn remove_editor(&mut self, id: &EditorId) -> Vec<Table> {
        self.editors.remove(id);
        self.unsaved.remove(id);
        self.editor_order.retain(|e| e != id);
        self.tab_history.retain(|e| e != id);
        if self.active_editor.as_ref() == Some(id) {
            self.active_editor = None;
        }

        let owned: Vec<TableId> = self
            .table_order
            .iter()
            .filter(|t| {
                self.tables
                    .get(t)
                    .is_some_and(|table| &table.query_editor_id == id)
            })
            .cloned()
            .collect();
        self.remove_tables(&owned)
    }

    // Tables

    pub fn insert_table(&mut self, table: Table) {
        self.table_order.push(table.id.clone());
        self.tables.insert(table.id.clone(), table);
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn table_mut(&mut self, id: &TableId) -> Option<&mut Table> {
        self.tables.get_mut(id)
    }

    /// Tables owned by the given editor, in insertion order.
    pub fn tables_for_editor(&self, editor_id: &EditorId) -> Vec<&Table> {
        self.table_order
            .iter()
            .filter_map(|id| self.tables.get(id))
            .filter(|t| &t.query_editor_id == editor_id)
            .collect()
    }

    /// Rewrites a table onto its durable backend id in place. Used when a
    /// table is created under an editor that already migrated.
    pub fn promote_table(&mut self, old_id: &TableId, durable_id: u64) {
        if let Some(mut table) = self.tables.remove(old_id) {
            let new_id = TableId::from_durable(durable_id);
            for slot in self.table_order.iter_mut() {
                if slot == old_id {
                    *slot = new_id.clone();
                }
            }
            table.id = new_id.clone();
            table.initialized = true;
            self.tables.insert(new_id, table);
        }
    }

    /// Removes the given tables, returning those that existed.
    pub fn remove_tables(&mut self, ids: &[TableId]) -> Vec<Table> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(table) = self.tables.remove(id) {
                removed.push(table);
            }
        }
        self.table_order.retain(|t| self.tables.contains_key(t));
        removed
    }

    // Queries

    pub fn insert_query(&mut self, query: Query) {
        self.queries.insert(query.id.clone(), query);
    }

    pub fn query(&self, id: &QueryId) -> Option<&Query> {
        self.queries.get(id)
    }

    /// Queries belonging to the given editor.
    pub fn queries_for_editor(&self, editor_id: &EditorId) -> Vec<&Query> {
        self.queries
            .values()
            .filter(|q| &q.query_editor_id == editor_id)
            .collect()
    }

    /// Transitions a query to SUCCESS with its decoded results.
    ///
    /// Returns false (and leaves the query untouched) when the query is
    /// already terminal: a late completion signal is a no-op.
    pub fn complete_success(&mut self, id: &QueryId, results: ResultSet) -> bool {
        self.complete(id, |q| {
            q.status = QueryStatus::Success;
            q.progress = 100;
            q.results = Some(results);
        })
    }

    /// Transitions a query to FAILED with an error message.
    pub fn complete_failed(&mut self, id: &QueryId, error_message: String) -> bool {
        self.complete(id, |q| {
            q.status = QueryStatus::Failed;
            q.error_message = Some(error_message);
        })
    }

    /// Transitions a query to STOPPED.
    pub fn complete_stopped(&mut self, id: &QueryId) -> bool {
        self.complete(id, |q| q.status = QueryStatus::Stopped)
    }

    /// Replaces a query's result set without touching its status. Used for
    /// page re-fetches, which never re-record a terminal outcome.
    pub fn set_results(&mut self, id: &QueryId, results: ResultSet) -> bool {
        match self.queries.get_mut(id) {
            Some(query) => {
                query.results = Some(results);
                true
            }
            None => false,
        }
    }

    fn complete(&mut self, id: &QueryId, apply: impl FnOnce(&mut Query)) -> bool {
        match self.queries.get_mut(id) {
            Some(query) if !query.status.is_terminal() => {
                apply(query);
                true
            }
            _ => false,
        }
    }

    // Tab history / active editor

    /// Records a visit to the given editor and makes it active.
    pub fn visit(&mut self, id: &EditorId) {
        self.tab_history.retain(|e| e != id);
        self.tab_history.push(id.clone());
        self.active_editor = Some(id.clone());
    }

    /// The most recently visited editor id.
    pub fn last_visited(&self) -> Option<&EditorId> {
        self.tab_history.last()
    }

    pub fn tab_history(&self) -> &[EditorId] {
        &self.tab_history
    }

    pub fn active_editor(&self) -> Option<&EditorId> {
        self.active_editor.as_ref()
    }

    // Migration

    /// Applies a migration transaction as one state transition.
    ///
    /// After this returns, no editor, overlay, table, query, history entry,
    /// or active-editor reference names the pre-migration editor id.
    pub fn apply_migration(&mut self, txn: &MigrationTransaction) {
        let old_id = &txn.old_editor_id;
        let new_id = &txn.new_editor.id;

        self.editors.remove(old_id);
        self.editors
            .insert(new_id.clone(), txn.new_editor.clone());
        for slot in self.editor_order.iter_mut() {
            if slot == old_id {
                *slot = new_id.clone();
            }
        }

        if let Some(overlay) = self.unsaved.remove(old_id) {
            self.unsaved.insert(new_id.clone(), overlay);
        }

        for slot in self.tab_history.iter_mut() {
            if slot == old_id {
                *slot = new_id.clone();
            }
        }
        if self.active_editor.as_ref() == Some(old_id) {
            self.active_editor = Some(new_id.clone());
        }

        for rewrite in &txn.tables {
            self.tables.remove(&rewrite.old_id);
            for slot in self.table_order.iter_mut() {
                if *slot == rewrite.old_id {
                    *slot = rewrite.new_table.id.clone();
                }
            }
            self.tables
                .insert(rewrite.new_table.id.clone(), rewrite.new_table.clone());
        }

        for rewrite in &txn.queries {
            if let Some(query) = self.queries.get_mut(&rewrite.query_id) {
                query.query_editor_id = rewrite.new_editor_id.clone();
            }
        }
    }

    /// Counts references to an editor id across the whole store. Used to
    /// assert the all-or-nothing migration invariant.
    pub fn references_to(&self, id: &EditorId) -> usize {
        let mut count = 0;
        count += usize::from(self.editors.contains_key(id));
        count += usize::from(self.unsaved.contains_key(id));
        count += self.editor_order.iter().filter(|e| *e == id).count();
        count += self.tab_history.iter().filter(|e| *e == id).count();
        count += usize::from(self.active_editor.as_ref() == Some(id));
        count += self
            .tables
            .values()
            .filter(|t| &t.query_editor_id == id)
            .count();
        count += self
            .queries
            .values()
            .filter(|q| &q.query_editor_id == id)
            .count();
        count
    }
}
