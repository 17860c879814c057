//! Query editor tabs and their unsaved overlay.

use crate::ids::{EditorId, QueryId};
use serde::{Deserialize, Serialize};

/// A SQL workbench tab: one SQL buffer plus its execution context.
///
/// `id` is client-local until the editor is migrated; `remote_id` (when
/// present) is the authoritative backend key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEditor {
    pub id: EditorId,
    pub name: String,
    pub database_id: Option<u64>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub sql: String,
    pub autorun: bool,
    pub query_limit: Option<u64>,
    /// JSON-encoded template parameters forwarded verbatim to the backend.
    pub template_params: Option<String>,
    pub latest_query_id: Option<QueryId>,
    pub remote_id: Option<u64>,
    /// True while the editor has no durable backend identity.
    pub in_local_storage: bool,
    pub loaded: bool,
}

impl QueryEditor {
    /// Creates a new local-only editor with a fresh client id.
    pub fn new_local(name: impl Into<String>) -> Self {
        Self {
            id: EditorId::generate(),
            name: name.into(),
            database_id: None,
            catalog: None,
            schema: None,
            sql: String::new(),
            autorun: false,
            query_limit: None,
            template_params: None,
            latest_query_id: None,
            remote_id: None,
            in_local_storage: true,
            loaded: true,
        }
    }

    /// Applies the unsaved overlay, overlay fields taking precedence.
    ///
    /// Idempotent: merging an already-merged editor with the same overlay
    /// yields the same result.
    pub fn merge_unsaved(&self, unsaved: &UnsavedQueryEditor) -> QueryEditor {
        let mut merged = self.clone();
        if let Some(name) = &unsaved.name {
            merged.name = name.clone();
        }
        if let Some(sql) = &unsaved.sql {
            merged.sql = sql.clone();
        }
        if let Some(database_id) = unsaved.database_id {
            merged.database_id = Some(database_id);
        }
        if let Some(catalog) = &unsaved.catalog {
            merged.catalog = Some(catalog.clone());
        }
        if let Some(schema) = &unsaved.schema {
            merged.schema = Some(schema.clone());
        }
        if let Some(query_limit) = unsaved.query_limit {
            merged.query_limit = Some(query_limit);
        }
        if let Some(template_params) = &unsaved.template_params {
            merged.template_params = Some(template_params.clone());
        }
        if let Some(autorun) = unsaved.autorun {
            merged.autorun = autorun;
        }
        if let Some(latest_query_id) = &unsaved.latest_query_id {
            merged.latest_query_id = Some(latest_query_id.clone());
        }
        merged
    }
}

/// Partial overlay holding only fields changed since the last committed
/// snapshot. Doubles as the partial-update payload mirrored to the backend;
/// absent fields are omitted from the outbound JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnsavedQueryEditor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_params: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorun: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_query_id: Option<QueryId>,
}

impl UnsavedQueryEditor {
    /// Returns true when no field has been changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Folds another overlay into this one, the other taking precedence.
    pub fn absorb(&mut self, other: &UnsavedQueryEditor) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.sql.is_some() {
            self.sql = other.sql.clone();
        }
        if other.database_id.is_some() {
            self.database_id = other.database_id;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog.clone();
        }
        if other.schema.is_some() {
            self.schema = other.schema.clone();
        }
        if other.query_limit.is_some() {
            self.query_limit = other.query_limit;
        }
        if other.template_params.is_some() {
            self.template_params = other.template_params.clone();
        }
        if other.autorun.is_some() {
            self.autorun = other.autorun;
        }
        if other.latest_query_id.is_some() {
            self.latest_query_id = other.latest_query_id.clone();
        }
    }
}
