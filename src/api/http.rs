//! reqwest-backed implementations of the backend collaborator traits.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::api::{
    ExecutePayload, ExecutionApi, FormatApi, SavedQueryApi, SavedQueryPayload, SavedQueryRecord,
    TabStateApi,
};
use crate::config::Config;
use crate::error::{Result, SqldeckError};
use crate::ids::QueryId;
use crate::model::{decode_result_set, QueryEditor, ResultSet, Table, UnsavedQueryEditor};

/// HTTP client for the workbench backend API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SqldeckError::config(format!("Invalid base_url: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SqldeckError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SqldeckError::internal(format!("Invalid endpoint path {path}: {e}")))
    }

    /// Maps a reqwest transport error, classifying timeouts.
    fn transport_error(e: reqwest::Error) -> SqldeckError {
        if e.is_timeout() {
            SqldeckError::timeout(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            SqldeckError::network(format!("Failed to connect to backend: {e}"))
        } else {
            SqldeckError::network(format!("Request failed: {e}"))
        }
    }

    /// Parses an API error response body.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> SqldeckError {
        if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) {
            return SqldeckError::backend(format!("{} ({status})", error_response.message));
        }
        SqldeckError::backend(format!("Backend error ({status}): {body}"))
    }

    /// Sends a request and returns the response body on 2xx.
    async fn read_body(request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(Self::transport_error)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SqldeckError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl ExecutionApi for HttpBackend {
    async fn execute(
        &self,
        payload: &ExecutePayload,
        url_params: &[(String, String)],
    ) -> Result<ResultSet> {
        let mut url = self.endpoint("api/v1/workbench/execute/")?;
        // Navigation-context parameters are forwarded untouched
        for (key, value) in url_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        let body = Self::read_body(self.client.post(url).json(payload)).await?;
        decode_result_set(&body)
    }

    async fn fetch_results(&self, result_key: &str, page: u64) -> Result<ResultSet> {
        let mut url = self.endpoint("api/v1/workbench/results/")?;
        url.query_pairs_mut()
            .append_pair("key", result_key)
            .append_pair("page", &page.to_string());

        let body = Self::read_body(self.client.get(url)).await?;
        decode_result_set(&body)
    }

    async fn stop(&self, client_query_id: &QueryId) -> Result<()> {
        let url = self.endpoint("api/v1/workbench/stop/")?;
        let payload = StopPayload {
            client_id: client_query_id.as_str(),
        };
        // Body content is not load-bearing; any 2xx is an acknowledgment
        Self::read_body(self.client.post(url).json(&payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl SavedQueryApi for HttpBackend {
    async fn get(&self, id: u64) -> Result<SavedQueryRecord> {
        let url = self.endpoint(&format!("api/v1/saved_query/{id}"))?;
        let body = Self::read_body(self.client.get(url)).await?;
        decode_wrapped(&body)
    }

    async fn create(&self, payload: &SavedQueryPayload) -> Result<SavedQueryRecord> {
        let url = self.endpoint("api/v1/saved_query/")?;
        let body = Self::read_body(self.client.post(url).json(payload)).await?;
        decode_wrapped(&body)
    }

    async fn update(&self, id: u64, payload: &SavedQueryPayload) -> Result<SavedQueryRecord> {
        let url = self.endpoint(&format!("api/v1/saved_query/{id}"))?;
        let body = Self::read_body(self.client.put(url).json(payload)).await?;
        decode_wrapped(&body)
    }
}

#[async_trait]
impl FormatApi for HttpBackend {
    async fn format_sql(&self, sql: &str) -> Result<String> {
        let url = self.endpoint("api/v1/workbench/format_sql/")?;
        let body = Self::read_body(self.client.post(url).json(&FormatPayload { sql })).await?;

        let response: FormatResponse = serde_json::from_str(&body)
            .map_err(|e| SqldeckError::decode(format!("Invalid format response: {e}")))?;
        Ok(response.result)
    }
}

#[async_trait]
impl TabStateApi for HttpBackend {
    async fn create_editor(&self, editor: &QueryEditor) -> Result<u64> {
        let url = self.endpoint("api/v1/tab_state/")?;
        let body = Self::read_body(self.client.post(url).json(editor)).await?;
        decode_created_id(&body)
    }

    async fn update_editor(&self, id: u64, changes: &UnsavedQueryEditor) -> Result<()> {
        let url = self.endpoint(&format!("api/v1/tab_state/{id}"))?;
        Self::read_body(self.client.put(url).json(changes)).await?;
        Ok(())
    }

    async fn delete_editor(&self, id: u64) -> Result<()> {
        let url = self.endpoint(&format!("api/v1/tab_state/{id}"))?;
        Self::read_body(self.client.delete(url)).await?;
        Ok(())
    }

    async fn create_table(&self, table: &Table, editor_id: u64) -> Result<u64> {
        let url = self.endpoint("api/v1/table_schema/")?;
        let payload = CreateTablePayload { table, editor_id };
        let body = Self::read_body(self.client.post(url).json(&payload)).await?;
        decode_created_id(&body)
    }

    async fn update_table(&self, id: u64, expanded: bool) -> Result<()> {
        let url = self.endpoint(&format!("api/v1/table_schema/{id}"))?;
        let payload = UpdateTablePayload { expanded };
        Self::read_body(self.client.put(url).json(&payload)).await?;
        Ok(())
    }

    async fn delete_table(&self, id: u64) -> Result<()> {
        let url = self.endpoint(&format!("api/v1/table_schema/{id}"))?;
        Self::read_body(self.client.delete(url)).await?;
        Ok(())
    }
}

/// Records wrapped as `{"result": ...}` by the backend.
fn decode_wrapped<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    #[derive(Deserialize)]
    struct Wrapped<T> {
        result: T,
    }
    let wrapped: Wrapped<T> = serde_json::from_str(body)
        .map_err(|e| SqldeckError::decode(format!("Invalid response shape: {e}")))?;
    Ok(wrapped.result)
}

fn decode_created_id(body: &str) -> Result<u64> {
    #[derive(Deserialize)]
    struct Created {
        id: u64,
    }
    let created: Created = serde_json::from_str(body)
        .map_err(|e| SqldeckError::decode(format!("Invalid create response: {e}")))?;
    Ok(created.id)
}

// Backend API wire types

#[derive(Debug, Serialize)]
struct StopPayload<'a> {
    client_id: &'a str,
}

#[derive(Debug, Serialize)]
struct FormatPayload<'a> {
    sql: &'a str,
}

#[derive(Debug, Deserialize)]
struct FormatResponse {
    result: String,
}

#[derive(Debug, Serialize)]
struct CreateTablePayload<'a> {
    #[serde(flatten)]
    table: &'a Table,
    editor_id: u64,
}

#[derive(Debug, Serialize)]
struct UpdateTablePayload {
    expanded: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
}
