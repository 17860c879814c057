//! Mock backend collaborators for testing.
//!
//! Deterministic implementations with call recording and failure injection,
//! used to exercise the engine without a real backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::api::{
    CapabilityFlags, ExecutePayload, ExecutionApi, FormatApi, NoticeLevel, Notifier,
    SavedQueryApi, SavedQueryPayload, SavedQueryRecord, TabStateApi,
};
use crate::error::{Result, SqldeckError};
use crate::ids::QueryId;
use crate::model::{CellValue, ColumnInfo, QueryEditor, ResultSet, Table, UnsavedQueryEditor};

/// How an injected failure presents itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Timeout,
    Network,
    Backend,
}

impl FailureMode {
    fn to_error(self) -> SqldeckError {
        match self {
            Self::Timeout => SqldeckError::timeout("mock deadline exceeded"),
            Self::Network => SqldeckError::network("mock connection refused"),
            Self::Backend => SqldeckError::backend("mock backend rejection"),
        }
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Execute {
        sql: String,
        url_params: Vec<(String, String)>,
    },
    FetchResults {
        key: String,
        page: u64,
    },
    Stop {
        client_id: String,
    },
    CreateEditor {
        name: String,
    },
    UpdateEditor {
        id: u64,
        changes: UnsavedQueryEditor,
    },
    DeleteEditor {
        id: u64,
    },
    CreateTable {
        name: String,
        editor_id: u64,
    },
    UpdateTable {
        id: u64,
        expanded: bool,
    },
    DeleteTable {
        id: u64,
    },
    SavedQueryGet {
        id: u64,
    },
    SavedQueryCreate {
        label: String,
    },
    SavedQueryUpdate {
        id: u64,
    },
    FormatSql {
        sql: String,
    },
}

/// Mock implementation of every backend endpoint family.
pub struct MockBackend {
    calls: Mutex<Vec<BackendCall>>,
    result: Mutex<ResultSet>,
    saved_queries: Mutex<HashMap<u64, SavedQueryRecord>>,
    execute_failure: Mutex<Option<FailureMode>>,
    tab_state_failure: Mutex<Option<FailureMode>>,
    saved_query_failure: Mutex<Option<FailureMode>>,
    next_editor_id: AtomicU64,
    next_table_id: AtomicU64,
}

impl MockBackend {
    /// Creates a mock backend with a one-row canned result.
    pub fn new() -> Self {
        let result = ResultSet::with_data(
            vec![ColumnInfo {
                name: "result".to_string(),
                data_type: "VARCHAR".to_string(),
            }],
            vec![vec![CellValue::Text("mock row".to_string())]],
        );
        Self {
            calls: Mutex::new(Vec::new()),
            result: Mutex::new(result),
            saved_queries: Mutex::new(HashMap::new()),
            execute_failure: Mutex::new(None),
            tab_state_failure: Mutex::new(None),
            saved_query_failure: Mutex::new(None),
            next_editor_id: AtomicU64::new(100),
            next_table_id: AtomicU64::new(500),
        }
    }

    /// Replaces the canned execution result.
    pub fn set_result(&self, result: ResultSet) {
        *self.result.lock().unwrap() = result;
    }

    /// Makes execution calls fail with the given mode.
    pub fn fail_execute(&self, mode: FailureMode) {
        *self.execute_failure.lock().unwrap() = Some(mode);
    }

    /// Makes tab-state and table-schema calls fail with the given mode.
    pub fn fail_tab_state(&self, mode: FailureMode) {
        *self.tab_state_failure.lock().unwrap() = Some(mode);
    }

    /// Makes saved-query calls fail with the given mode.
    pub fn fail_saved_query(&self, mode: FailureMode) {
        *self.saved_query_failure.lock().unwrap() = Some(mode);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        *self.execute_failure.lock().unwrap() = None;
        *self.tab_state_failure.lock().unwrap() = None;
        *self.saved_query_failure.lock().unwrap() = None;
    }

    /// Seeds a saved-query record.
    pub fn insert_saved_query(&self, record: SavedQueryRecord) {
        self.saved_queries.lock().unwrap().insert(record.id, record);
    }

    /// Returns a snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Counts recorded calls matching a predicate.
    pub fn count_calls(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, slot: &Mutex<Option<FailureMode>>) -> Result<()> {
        match *slot.lock().unwrap() {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionApi for MockBackend {
    async fn execute(
        &self,
        payload: &ExecutePayload,
        url_params: &[(String, String)],
    ) -> Result<ResultSet> {
        self.record(BackendCall::Execute {
            sql: payload.sql.clone(),
            url_params: url_params.to_vec(),
        });
        self.check(&self.execute_failure)?;
        Ok(self.result.lock().unwrap().clone())
    }

    async fn fetch_results(&self, result_key: &str, page: u64) -> Result<ResultSet> {
        self.record(BackendCall::FetchResults {
            key: result_key.to_string(),
            page,
        });
        self.check(&self.execute_failure)?;
        Ok(self.result.lock().unwrap().clone())
    }

    async fn stop(&self, client_query_id: &QueryId) -> Result<()> {
        self.record(BackendCall::Stop {
            client_id: client_query_id.as_str().to_string(),
        });
        // Stop acknowledgments are fire-and-forget; never fails
        Ok(())
    }
}

#[async_trait]
impl SavedQueryApi for MockBackend {
    async fn get(&self, id: u64) -> Result<SavedQueryRecord> {
        self.record(BackendCall::SavedQueryGet { id });
        self.check(&self.saved_query_failure)?;
        self.saved_queries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| SqldeckError::backend(format!("saved query {id} not found")))
    }

    async fn create(&self, payload: &SavedQueryPayload) -> Result<SavedQueryRecord> {
        self.record(BackendCall::SavedQueryCreate {
            label: payload.label.clone(),
        });
        self.check(&self.saved_query_failure)?;
        let id = self.next_editor_id.fetch_add(1, Ordering::Relaxed);
        let record = SavedQueryRecord {
            id,
            label: payload.label.clone(),
            database_id: payload.database_id,
            catalog: payload.catalog.clone(),
            schema: payload.schema.clone(),
            sql: payload.sql.clone(),
            template_params: payload.template_params.clone(),
        };
        self.insert_saved_query(record.clone());
        Ok(record)
    }

    async fn update(&self, id: u64, payload: &SavedQueryPayload) -> Result<SavedQueryRecord> {
        self.record(BackendCall::SavedQueryUpdate { id });
        self.check(&self.saved_query_failure)?;
        let record = SavedQueryRecord {
            id,
            label: payload.label.clone(),
            database_id: payload.database_id,
            catalog: payload.catalog.clone(),
            schema: payload.schema.clone(),
            sql: payload.sql.clone(),
            template_params: payload.template_params.clone(),
        };
        self.insert_saved_query(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl FormatApi for MockBackend {
    async fn format_sql(&self, sql: &str) -> Result<String> {
        self.record(BackendCall::FormatSql {
            sql: sql.to_string(),
        });
        // Normalizes whitespace, deterministic stand-in for the remote formatter
        Ok(sql.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

#[async_trait]
impl TabStateApi for MockBackend {
    async fn create_editor(&self, editor: &QueryEditor) -> Result<u64> {
        self.record(BackendCall::CreateEditor {
            name: editor.name.clone(),
        });
        self.check(&self.tab_state_failure)?;
        Ok(self.next_editor_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn update_editor(&self, id: u64, changes: &UnsavedQueryEditor) -> Result<()> {
        self.record(BackendCall::UpdateEditor {
            id,
            changes: changes.clone(),
        });
        self.check(&self.tab_state_failure)
    }

    async fn delete_editor(&self, id: u64) -> Result<()> {
        self.record(BackendCall::DeleteEditor { id });
        self.check(&self.tab_state_failure)
    }

    async fn create_table(&self, table: &Table, editor_id: u64) -> Result<u64> {
        self.record(BackendCall::CreateTable {
            name: table.name.clone(),
            editor_id,
        });
        self.check(&self.tab_state_failure)?;
        Ok(self.next_table_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn update_table(&self, id: u64, expanded: bool) -> Result<()> {
        self.record(BackendCall::UpdateTable { id, expanded });
        self.check(&self.tab_state_failure)
    }

    async fn delete_table(&self, id: u64) -> Result<()> {
        self.record(BackendCall::DeleteTable { id });
        self.check(&self.tab_state_failure)
    }
}

/// Capability-flag lookup backed by a fixed map.
#[derive(Debug, Default)]
pub struct StaticFlags {
    flags: HashMap<String, bool>,
}

impl StaticFlags {
    /// Creates an empty flag set (everything disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the named flag.
    pub fn with_enabled(mut self, name: &str) -> Self {
        self.flags.insert(name.to_string(), true);
        self
    }
}

impl CapabilityFlags for StaticFlags {
    fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Notifier that records notices for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded notices.
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
