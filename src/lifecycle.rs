//! Query execution lifecycle.
//!
//! Drives a single query through submit, pending, and exactly one terminal
//! outcome. The started event is emitted before the network call so hosts
//! can render the pending query immediately; failures are converted into
//! events at this boundary and never propagate to the caller.

use std::sync::Arc;

use tracing::error;

use crate::api::{ExecutePayload, ExecutionApi};
use crate::error::SqldeckError;
use crate::events::{EventSink, IssueCode, QueryFailure, WorkbenchEvent};
use crate::ids::{QueryId, TableId};
use crate::model::{Query, QueryEditor};
use crate::store::Store;

/// Per-run options supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Selected-text override; when present it is submitted instead of the
    /// editor's full SQL buffer.
    pub selected_sql: Option<String>,
    pub run_as_user: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    /// Query-string parameters from the current navigation context,
    /// forwarded verbatim to the execution endpoint.
    pub url_params: Vec<(String, String)>,
}

/// Controller for the submit → pending → terminal lifecycle.
pub struct QueryLifecycle {
    api: Arc<dyn ExecutionApi>,
    events: EventSink,
    default_row_limit: u64,
    preview_row_limit: u64,
}

impl QueryLifecycle {
    pub fn new(
        api: Arc<dyn ExecutionApi>,
        events: EventSink,
        default_row_limit: u64,
        preview_row_limit: u64,
    ) -> Self {
        Self {
            api,
            events,
            default_row_limit,
            preview_row_limit,
        }
    }

    /// Submits the editor's SQL for execution.
    ///
    /// Mutates local state synchronously (pending query recorded, editor's
    /// `latest_query_id` updated) before suspending at the network boundary.
    pub async fn run(
        &self,
        store: &mut Store,
        editor: &QueryEditor,
        options: RunOptions,
    ) -> QueryId {
        let sql = options
            .selected_sql
            .clone()
            .unwrap_or_else(|| editor.sql.clone());
        let query = Query::new(editor.id.clone(), sql.clone(), false);
        let query_id = query.id.clone();

        store.insert_query(query.clone());
        if let Some(e) = store.editor_mut(&editor.id) {
            e.latest_query_id = Some(query_id.clone());
        }
        self.events.emit(WorkbenchEvent::QueryStarted { query });

        let payload = ExecutePayload {
            client_id: query_id.clone(),
            database_id: editor.database_id,
            catalog: editor.catalog.clone(),
            schema: editor.schema.clone(),
            sql,
            query_limit: editor.query_limit.or(Some(self.default_row_limit)),
            template_params: editor.template_params.clone(),
            run_as_user: options.run_as_user.clone(),
            cache_ttl_secs: options.cache_ttl_secs,
        };

        match self.api.execute(&payload, &options.url_params).await {
            Ok(results) => {
                if store.complete_success(&query_id, results.clone()) {
                    self.events.emit(WorkbenchEvent::QuerySuccess {
                        query_id: query_id.clone(),
                        results,
                    });
                }
            }
            Err(e) => self.fail(store, &query_id, e),
        }
        // A completion arriving after the query went terminal (e.g. stopped
        // mid-flight) was ignored above.
        query_id
    }

    /// Re-fetches a results page for an already-submitted query.
    ///
    /// Neither outcome re-records a terminal state: success replaces the
    /// stored results, and a failed page fetch still emits `QueryFailed`
    /// even though the query's recorded outcome stays put.
    pub async fn fetch_results(&self, store: &mut Store, query_id: &QueryId, page: u64) {
        let Some(result_key) = store
            .query(query_id)
            .and_then(|q| q.results.as_ref())
            .and_then(|r| r.result_key.clone())
        else {
            self.report_failure(
                query_id,
                SqldeckError::internal("query has no backend result key"),
            );
            return;
        };

        match self.api.fetch_results(&result_key, page).await {
            Ok(results) => {
                store.set_results(query_id, results.clone());
                self.events.emit(WorkbenchEvent::QuerySuccess {
                    query_id: query_id.clone(),
                    results,
                });
            }
            Err(e) => {
                store.complete_failed(query_id, e.to_string());
                self.report_failure(query_id, e);
            }
        }
    }

    /// Stops a running query.
    ///
    /// The local transition to STOPPED happens immediately; the backend stop
    /// request is fire-and-forget and its response body carries no meaning.
    pub async fn stop(&self, store: &mut Store, query_id: &QueryId) {
        if store.complete_stopped(query_id) {
            self.events.emit(WorkbenchEvent::QueryStopped {
                query_id: query_id.clone(),
            });
        }
        if let Err(e) = self.api.stop(query_id).await {
            error!(%query_id, error = %e, "stop request failed");
        }
    }

    /// Runs a bounded data-preview query for a schema-browser table.
    ///
    /// With `disable_preview` set only the table's schema metadata is
    /// registered and no query executes. Preview queries never touch the
    /// editor's `latest_query_id`.
    pub async fn run_table_preview(
        &self,
        store: &mut Store,
        table_id: &TableId,
        disable_preview: bool,
    ) -> Option<QueryId> {
        let table = store.table(table_id)?.clone();
        if disable_preview {
            return None;
        }

        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            table.qualified_name(),
            self.preview_row_limit
        );
        let query = Query::new(table.query_editor_id.clone(), sql.clone(), true);
        let query_id = query.id.clone();

        store.insert_query(query.clone());
        if let Some(t) = store.table_mut(table_id) {
            t.data_preview_query_id = Some(query_id.clone());
        }
        self.events.emit(WorkbenchEvent::QueryStarted { query });

        let payload = ExecutePayload {
            client_id: query_id.clone(),
            database_id: table.database_id,
            catalog: table.catalog.clone(),
            schema: table.schema.clone(),
            sql,
            query_limit: Some(self.preview_row_limit),
            ..Default::default()
        };

        match self.api.execute(&payload, &[]).await {
            Ok(results) => {
                if store.complete_success(&query_id, results.clone()) {
                    self.events.emit(WorkbenchEvent::QuerySuccess {
                        query_id: query_id.clone(),
                        results,
                    });
                }
            }
            Err(e) => self.fail(store, &query_id, e),
        }
        Some(query_id)
    }

    /// Converts a run failure into a terminal FAILED transition plus the
    /// failure event; a completion for an already-terminal query is a no-op.
    fn fail(&self, store: &mut Store, query_id: &QueryId, e: SqldeckError) {
        if store.complete_failed(query_id, e.to_string()) {
            self.report_failure(query_id, e);
        }
    }

    /// Structured failure log plus the `QueryFailed` event.
    fn report_failure(&self, query_id: &QueryId, e: SqldeckError) {
        let issue_codes = match &e {
            SqldeckError::Network { timed_out, .. } => IssueCode::for_network_failure(*timed_out),
            _ => Vec::new(),
        };
        error!(
            %query_id,
            category = e.category(),
            issue_codes = ?issue_codes.iter().map(|c| c.code).collect::<Vec<_>>(),
            error = %e,
            "query failed"
        );
        self.events.emit(WorkbenchEvent::QueryFailed {
            query_id: query_id.clone(),
            failure: QueryFailure {
                message: e.to_string(),
                issue_codes,
            },
        });
    }
}
