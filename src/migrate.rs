//! Entity migration: promoting a local-only editor graph onto durable
//! backend identities.
//!
//! A migration is described as one explicit transaction value covering the
//! editor, its tab-history entry, and every owned table and query, so the
//! store can apply all rewrites as a single state transition. No
//! intermediate state ever references the pre-migration editor id after one
//! of its dependents has been rewritten.

use crate::error::{Result, SqldeckError};
use crate::ids::{EditorId, QueryId, TableId};
use crate::model::{QueryEditor, Table};
use crate::store::Store;

/// Rewrite of one owned table onto a durable identity.
#[derive(Debug, Clone)]
pub struct TableRewrite {
    pub old_id: TableId,
    pub new_table: Table,
}

/// Rewrite of one owned query; only the owning-editor reference changes.
#[derive(Debug, Clone)]
pub struct QueryRewrite {
    pub query_id: QueryId,
    pub new_editor_id: EditorId,
}

/// All rewrites for one migration, applied together.
#[derive(Debug, Clone)]
pub struct MigrationTransaction {
    pub old_editor_id: EditorId,
    pub new_editor: QueryEditor,
    pub tables: Vec<TableRewrite>,
    pub queries: Vec<QueryRewrite>,
}

/// Plans the migration of `old_editor_id` onto `durable_editor_id`.
///
/// `table_ids` pairs each owned table with the durable id the backend
/// assigned it, or `None` when that table's create call failed; such tables
/// keep a fresh client id and stay uninitialized, but are still repointed so
/// no reference to the old editor id survives.
pub fn plan_migration(
    store: &Store,
    old_editor_id: &EditorId,
    durable_editor_id: u64,
    table_ids: &[(TableId, Option<u64>)],
) -> Result<MigrationTransaction> {
    let old_editor = store
        .editor(old_editor_id)
        .ok_or_else(|| SqldeckError::internal(format!("unknown editor {old_editor_id}")))?;

    if !old_editor.in_local_storage {
        return Err(SqldeckError::internal(format!(
            "editor {old_editor_id} is already durable"
        )));
    }

    let new_editor_id = EditorId::from_durable(durable_editor_id);
    let mut new_editor = old_editor.clone();
    new_editor.id = new_editor_id.clone();
    new_editor.remote_id = Some(durable_editor_id);
    new_editor.in_local_storage = false;
    new_editor.loaded = true;

    let mut tables = Vec::with_capacity(table_ids.len());
    for (old_id, durable) in table_ids {
        let table = store
            .table(old_id)
            .ok_or_else(|| SqldeckError::internal(format!("unknown table {old_id}")))?;
        let mut new_table = table.clone();
        new_table.query_editor_id = new_editor_id.clone();
        match durable {
            Some(id) => {
                new_table.id = TableId::from_durable(*id);
                new_table.initialized = true;
            }
            None => {
                new_table.id = TableId::generate();
                new_table.initialized = false;
            }
        }
        tables.push(TableRewrite {
            old_id: old_id.clone(),
            new_table,
        });
    }

    let queries = store
        .queries_for_editor(old_editor_id)
        .into_iter()
        .map(|q| QueryRewrite {
            query_id: q.id.clone(),
            new_editor_id: new_editor_id.clone(),
        })
        .collect();

    Ok(MigrationTransaction {
        old_editor_id: old_editor_id.clone(),
        new_editor,
        tables,
        queries,
    })
}
