//! Best-effort backend mirroring through the facade.

use pretty_assertions::assert_eq;

use sqldeck::api::mock::{BackendCall, FailureMode};

use super::common::harness;

#[tokio::test]
async fn removing_mixed_tables_deletes_only_the_durable_one() {
    let mut h = harness(true);
    let editor_id = h.workbench.add_new_query_editor().await;

    // First table's create mirror fails, leaving it uninitialized
    h.backend.fail_tab_state(FailureMode::Network);
    let local_table = h
        .workbench
        .add_table(&editor_id, "staging", None, None)
        .await
        .unwrap();
    h.backend.clear_failures();
    let durable_table = h
        .workbench
        .add_table(&editor_id, "orders", None, None)
        .await
        .unwrap();

    h.workbench
        .remove_tables(&[local_table.clone(), durable_table.clone()])
        .await;

    assert!(h.workbench.store().table(&local_table).is_none());
    assert!(h.workbench.store().table(&durable_table).is_none());
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::DeleteTable { .. })),
        1
    );
}

#[tokio::test]
async fn disabled_persistence_never_touches_the_backend() {
    let mut h = harness(false);

    let editor_id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&editor_id, "SELECT 1").await;
    let table_id = h
        .workbench
        .add_table(&editor_id, "users", None, None)
        .await
        .unwrap();
    h.workbench.expand_table(&table_id).await;
    h.workbench.remove_tables(&[table_id]).await;
    h.workbench.remove_query_editor(&editor_id).await;

    let tab_state_calls = h.backend.count_calls(|c| {
        matches!(
            c,
            BackendCall::CreateEditor { .. }
                | BackendCall::UpdateEditor { .. }
                | BackendCall::DeleteEditor { .. }
                | BackendCall::CreateTable { .. }
                | BackendCall::UpdateTable { .. }
                | BackendCall::DeleteTable { .. }
        )
    });
    assert_eq!(tab_state_calls, 0);
}

#[tokio::test]
async fn update_mirror_failure_keeps_local_state() {
    let mut h = harness(true);
    let editor_id = h.workbench.add_new_query_editor().await;

    h.backend.fail_tab_state(FailureMode::Network);
    h.workbench.set_sql(&editor_id, "SELECT 42").await;

    let editor = h.workbench.up_to_date_editor(&editor_id).unwrap();
    assert_eq!(editor.sql, "SELECT 42");
    // The mirror was attempted exactly once, then given up on
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::UpdateEditor { .. })),
        1
    );
}

#[tokio::test]
async fn expand_mirrors_only_initialized_tables() {
    let mut h = harness(true);
    let editor_id = h.workbench.add_new_query_editor().await;

    h.backend.fail_tab_state(FailureMode::Backend);
    let local_table = h
        .workbench
        .add_table(&editor_id, "events", None, None)
        .await
        .unwrap();
    h.backend.clear_failures();

    h.workbench.expand_table(&local_table).await;

    let table = h.workbench.store().table(&local_table).unwrap();
    assert!(table.expanded);
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::UpdateTable { .. })),
        0
    );
}

#[tokio::test]
async fn deleting_a_durable_editor_mirrors_the_delete() {
    let mut h = harness(true);
    let first = h.workbench.add_new_query_editor().await;
    let second = h.workbench.add_new_query_editor().await;

    h.workbench.remove_query_editor(&second).await;

    assert!(h.workbench.store().editor(&second).is_none());
    assert!(h.workbench.store().editor(&first).is_some());
    assert_eq!(
        h.backend
            .count_calls(|c| matches!(c, BackendCall::DeleteEditor { .. })),
        1
    );
}
