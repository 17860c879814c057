//! Backend collaborator interfaces.
//!
//! Trait seams for everything the engine consumes over the wire, so hosts
//! and tests can substitute implementations deterministically. `http`
//! provides the reqwest-backed implementations; `mock` the test doubles.

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use crate::error::Result;
use crate::ids::QueryId;
use crate::model::{QueryEditor, ResultSet, Table, UnsavedQueryEditor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload submitted to the execution endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutePayload {
    /// Client-visible id of the submitting query.
    pub client_id: QueryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_params: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

/// A saved-query record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQueryRecord {
    pub id: u64,
    pub label: String,
    pub database_id: Option<u64>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub sql: String,
    pub template_params: Option<String>,
}

/// Outbound payload for creating or updating a saved query.
///
/// Every mapper field is present on the wire even when null, matching the
/// backend's internal-to-external field contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQueryPayload {
    pub label: String,
    pub database_id: Option<u64>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub sql: String,
    pub template_params: Option<String>,
}

/// SQL execution endpoints: submit, re-fetch result pages, stop.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Submits SQL for execution. `url_params` are the navigation context's
    /// query-string parameters, forwarded verbatim.
    async fn execute(
        &self,
        payload: &ExecutePayload,
        url_params: &[(String, String)],
    ) -> Result<ResultSet>;

    /// Fetches a results page for a previously submitted query.
    async fn fetch_results(&self, result_key: &str, page: u64) -> Result<ResultSet>;

    /// Requests the backend stop a running query. The response body is not
    /// load-bearing; callers treat any acknowledgment as success.
    async fn stop(&self, client_query_id: &QueryId) -> Result<()>;
}

/// Saved-query read/create/update endpoints.
#[async_trait]
pub trait SavedQueryApi: Send + Sync {
    async fn get(&self, id: u64) -> Result<SavedQueryRecord>;
    async fn create(&self, payload: &SavedQueryPayload) -> Result<SavedQueryRecord>;
    async fn update(&self, id: u64, payload: &SavedQueryPayload) -> Result<SavedQueryRecord>;
}

/// Remote SQL formatting endpoint.
#[async_trait]
pub trait FormatApi: Send + Sync {
    /// Returns the formatted SQL, applied by callers as a full replacement.
    async fn format_sql(&self, sql: &str) -> Result<String>;
}

/// Tab-state and table-schema persistence endpoints.
///
/// Only invoked when backend persistence is enabled; create calls return the
/// durable backend id used for migration.
#[async_trait]
pub trait TabStateApi: Send + Sync {
    async fn create_editor(&self, editor: &QueryEditor) -> Result<u64>;
    async fn update_editor(&self, id: u64, changes: &UnsavedQueryEditor) -> Result<()>;
    async fn delete_editor(&self, id: u64) -> Result<()>;

    async fn create_table(&self, table: &Table, editor_id: u64) -> Result<u64>;
    async fn update_table(&self, id: u64, expanded: bool) -> Result<()>;
    async fn delete_table(&self, id: u64) -> Result<()>;
}

/// Boolean capability-flag lookup, consulted before every mirrored write.
pub trait CapabilityFlags: Send + Sync {
    fn is_enabled(&self, name: &str) -> bool;
}

/// Severity for user-visible notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Danger,
}

/// User-visible notification collaborator (toast presentation lives in the
/// host UI).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}
