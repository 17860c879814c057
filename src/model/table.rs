//! Schema-browser table entries.

use crate::ids::{EditorId, QueryId, TableId};
use serde::{Deserialize, Serialize};

/// A table pinned in the schema browser, owned by one editor tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub database_id: Option<u64>,
    pub query_editor_id: EditorId,
    pub expanded: bool,
    /// True once the backend has a durable record for this entry.
    pub initialized: bool,
    pub data_preview_query_id: Option<QueryId>,
}

impl Table {
    /// Creates a new local-only table entry owned by the given editor.
    pub fn new_local(
        query_editor_id: EditorId,
        name: impl Into<String>,
        catalog: Option<String>,
        schema: Option<String>,
        database_id: Option<u64>,
    ) -> Self {
        Self {
            id: TableId::generate(),
            name: name.into(),
            catalog,
            schema,
            database_id,
            query_editor_id,
            expanded: true,
            initialized: false,
            data_preview_query_id: None,
        }
    }

    /// Fully-qualified name used in preview queries.
    pub fn qualified_name(&self) -> String {
        match (&self.catalog, &self.schema) {
            (Some(catalog), Some(schema)) => format!("{catalog}.{schema}.{}", self.name),
            (None, Some(schema)) => format!("{schema}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}
