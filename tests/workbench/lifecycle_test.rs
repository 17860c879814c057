//! Query lifecycle: event sequences, terminal idempotence, precision-safe
//! results.

use pretty_assertions::assert_eq;

use sqldeck::api::mock::FailureMode;
use sqldeck::events::{WorkbenchEvent, ISSUE_TIMEOUT, ISSUE_TRANSPORT};
use sqldeck::lifecycle::RunOptions;
use sqldeck::model::{decode_result_set, CellValue, QueryStatus};

use super::common::{drain, harness};

#[tokio::test]
async fn successful_run_emits_started_then_success() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT *\nFROM\nWHERE").await;
    drain(&mut h.events);

    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], WorkbenchEvent::QueryStarted { query }
        if query.id == qid && query.sql == "SELECT *\nFROM\nWHERE"));
    assert!(matches!(&events[1], WorkbenchEvent::QuerySuccess { query_id, .. }
        if *query_id == qid));
}

#[tokio::test]
async fn timeout_run_emits_started_then_failed_with_issue_codes() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT *\nFROM\nWHERE").await;
    h.backend.fail_execute(FailureMode::Timeout);
    drain(&mut h.events);

    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], WorkbenchEvent::QueryStarted { .. }));
    match &events[1] {
        WorkbenchEvent::QueryFailed { query_id, failure } => {
            assert_eq!(*query_id, qid);
            let codes: Vec<u32> = failure.issue_codes.iter().map(|c| c.code).collect();
            assert_eq!(codes, vec![ISSUE_TRANSPORT, ISSUE_TIMEOUT]);
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn exactly_one_terminal_state_per_query() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT 1").await;

    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(
        h.workbench.store().query(&qid).unwrap().status,
        QueryStatus::Success
    );

    // A stop after success must not re-mutate the recorded outcome
    h.workbench.stop_query(&qid).await;
    assert_eq!(
        h.workbench.store().query(&qid).unwrap().status,
        QueryStatus::Success
    );
}

#[tokio::test]
async fn stop_is_fire_and_forget() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT 1").await;
    h.backend.fail_execute(FailureMode::Network);

    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();
    // Query already failed; stop stays a no-op locally but the stop request
    // still goes out keyed by the client id
    drain(&mut h.events);
    h.workbench.stop_query(&qid).await;

    let events = drain(&mut h.events);
    assert!(events.is_empty());
}

#[tokio::test]
async fn large_integers_survive_the_result_pipeline() {
    let mut h = harness(false);
    let body = r#"{
        "query_id": "k1",
        "columns": [{"name": "big", "type": "BIGINT"}],
        "data": [[9223372036854775807]]
    }"#;
    h.backend.set_result(decode_result_set(body).unwrap());

    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT big FROM t").await;
    drain(&mut h.events);

    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();

    let events = drain(&mut h.events);
    match &events[1] {
        WorkbenchEvent::QuerySuccess { results, .. } => {
            assert_eq!(
                results.rows[0][0],
                CellValue::Number("9223372036854775807".to_string())
            );
        }
        other => panic!("expected QuerySuccess, got {other:?}"),
    }

    let stored = h.workbench.store().query(&qid).unwrap();
    let cell = &stored.results.as_ref().unwrap().rows[0][0];
    assert_eq!(cell.as_display(), "9223372036854775807");
}

#[tokio::test]
async fn preview_query_is_independent_of_editor_slot() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_database(&id, 1).await;

    let table_id = h
        .workbench
        .add_table(&id, "users", None, Some("public".to_string()))
        .await
        .unwrap();

    let preview_qid = h
        .workbench
        .run_table_preview(&table_id, false)
        .await
        .unwrap();

    let editor = h.workbench.store().editor(&id).unwrap();
    assert_eq!(editor.latest_query_id, None);

    let preview = h.workbench.store().query(&preview_qid).unwrap();
    assert!(preview.is_data_preview);
    assert!(preview.sql.starts_with("SELECT * FROM public.users LIMIT"));

    let table = h.workbench.store().table(&table_id).unwrap();
    assert_eq!(table.data_preview_query_id, Some(preview_qid));
}

#[tokio::test]
async fn preview_disabled_runs_nothing() {
    let mut h = harness(false);
    let id = h.workbench.add_new_query_editor().await;
    let table_id = h
        .workbench
        .add_table(&id, "users", None, None)
        .await
        .unwrap();

    let result = h.workbench.run_table_preview(&table_id, true).await;
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_results_pages_by_backend_key() {
    let mut h = harness(false);
    let body = r#"{
        "query_id": "page-key",
        "columns": [{"name": "n", "type": "INT"}],
        "data": [[1]]
    }"#;
    h.backend.set_result(decode_result_set(body).unwrap());

    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT n FROM t").await;
    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();
    drain(&mut h.events);

    h.workbench.fetch_query_results(&qid, 3).await;

    let events = drain(&mut h.events);
    assert!(matches!(&events[0], WorkbenchEvent::QuerySuccess { .. }));
    // Re-fetch never re-records the terminal state
    assert_eq!(
        h.workbench.store().query(&qid).unwrap().status,
        QueryStatus::Success
    );
}

#[tokio::test]
async fn failed_page_fetch_still_emits_failure() {
    let mut h = harness(false);
    let body = r#"{
        "query_id": "page-key",
        "columns": [{"name": "n", "type": "INT"}],
        "data": [[1]]
    }"#;
    h.backend.set_result(decode_result_set(body).unwrap());

    let id = h.workbench.add_new_query_editor().await;
    h.workbench.set_sql(&id, "SELECT n FROM t").await;
    let qid = h
        .workbench
        .run_query(&id, RunOptions::default())
        .await
        .unwrap();
    drain(&mut h.events);

    h.backend.fail_execute(FailureMode::Network);
    h.workbench.fetch_query_results(&qid, 2).await;

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        WorkbenchEvent::QueryFailed { query_id, failure } => {
            assert_eq!(*query_id, qid);
            assert!(failure.issue_codes.iter().any(|c| c.code == ISSUE_TRANSPORT));
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
    // The recorded outcome of the original run stays put
    assert_eq!(
        h.workbench.store().query(&qid).unwrap().status,
        QueryStatus::Success
    );
}
