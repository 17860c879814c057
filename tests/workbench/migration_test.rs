//! Migration: local editor graphs promoted onto durable backend identities.

use pretty_assertions::assert_eq;

use sqldeck::api::mock::{BackendCall, FailureMode};
use sqldeck::ids::EditorId;
use sqldeck::lifecycle::RunOptions;

use super::common::harness;

#[tokio::test]
async fn new_editor_migrates_on_create_success() {
    let mut h = harness(true);

    let id = h.workbench.add_new_query_editor().await;

    // Mock backend assigns durable ids starting at 100
    assert_eq!(id, EditorId::from("100"));
    let editor = h.workbench.store().editor(&id).unwrap();
    assert!(!editor.in_local_storage);
    assert!(editor.loaded);
    assert_eq!(editor.remote_id, Some(100));
}

#[tokio::test]
async fn failed_create_leaves_editor_local() {
    let mut h = harness(true);
    h.backend.fail_tab_state(FailureMode::Backend);

    let id = h.workbench.add_new_query_editor().await;

    let editor = h.workbench.store().editor(&id).unwrap();
    assert!(editor.in_local_storage);
    assert_eq!(editor.remote_id, None);
}

#[tokio::test]
async fn migration_rewrites_tables_and_queries_atomically() {
    let mut h = harness(true);
    h.backend.fail_tab_state(FailureMode::Backend);

    // Build a local graph: editor + table + query
    let old_id = h.workbench.add_new_query_editor().await;
    h.workbench.set_database(&old_id, 1).await;
    let table_id = h
        .workbench
        .add_table(&old_id, "users", None, None)
        .await
        .unwrap();
    let query_id = h
        .workbench
        .run_query(&old_id, RunOptions::default())
        .await
        .unwrap();

    h.backend.clear_failures();
    let new_id = h.workbench.persist_editor(&old_id).await;

    assert_ne!(new_id, old_id);
    assert_eq!(h.workbench.store().references_to(&old_id), 0);

    let tables = h.workbench.store().tables_for_editor(&new_id);
    assert_eq!(tables.len(), 1);
    assert!(tables[0].initialized);
    assert_ne!(tables[0].id, table_id);

    // The query keeps its own id; only the owning-editor reference moved
    let query = h.workbench.store().query(&query_id).unwrap();
    assert_eq!(query.query_editor_id, new_id);
}

#[tokio::test]
async fn migration_with_no_dependents_still_rewrites_history() {
    let mut h = harness(true);
    h.backend.fail_tab_state(FailureMode::Backend);
    let old_id = h.workbench.add_new_query_editor().await;

    h.backend.clear_failures();
    let new_id = h.workbench.persist_editor(&old_id).await;

    assert_eq!(h.workbench.store().references_to(&old_id), 0);
    assert_eq!(h.workbench.store().tab_history().to_vec(), vec![new_id.clone()]);
    assert_eq!(h.workbench.store().active_editor(), Some(&new_id));
}

#[tokio::test]
async fn deferred_updates_flush_after_migration() {
    let mut h = harness(true);
    h.backend.fail_tab_state(FailureMode::Backend);
    let old_id = h.workbench.add_new_query_editor().await;

    // Updates against a local editor are deferred, not sent
    h.workbench.set_sql(&old_id, "SELECT 1").await;
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::UpdateEditor { .. })),
        0
    );

    h.backend.clear_failures();
    h.workbench.persist_editor(&old_id).await;

    let updates: Vec<_> = h
        .backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::UpdateEditor { id, changes } => Some((id, changes)),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, 100);
    assert_eq!(updates[0].1.sql.as_deref(), Some("SELECT 1"));
}

#[tokio::test]
async fn overlay_survives_migration() {
    let mut h = harness(true);
    h.backend.fail_tab_state(FailureMode::Backend);
    let old_id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&old_id, "SELECT 7").await;

    h.backend.clear_failures();
    let new_id = h.workbench.persist_editor(&old_id).await;

    let editor = h.workbench.up_to_date_editor(&new_id).unwrap();
    assert_eq!(editor.sql, "SELECT 7");
}

#[tokio::test]
async fn persist_editor_is_noop_for_durable_editor() {
    let mut h = harness(true);
    let id = h.workbench.add_new_query_editor().await;
    let creates_before = h
        .backend
        .count_calls(|c| matches!(c, BackendCall::CreateEditor { .. }));

    let same = h.workbench.persist_editor(&id).await;

    assert_eq!(same, id);
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::CreateEditor { .. })),
        creates_before
    );
}
