//! o2r platform API client (jobs and compendia)

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// o2r client errors
#[derive(Debug, Error)]
pub enum O2rError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl O2rError {
    /// 5xx from the platform
    pub fn is_server_error(&self) -> bool {
        matches!(self, O2rError::ApiError(status, _) if *status >= 500)
    }
}

/// Response of `GET /api/v1/job?compendium_id=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    /// Job ids, newest first
    #[serde(default)]
    pub results: Vec<String>,
    /// Set when the platform has no jobs for the compendium
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /api/v1/job/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// o2r API client
#[derive(Debug, Clone)]
pub struct O2rClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl O2rClient {
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Jobs executed for a compendium
    pub async fn jobs_for_compendium(&self, compendium_id: &str) -> Result<JobList, O2rError> {
        let url = format!("{}/api/v1/job", self.base_url);
        tracing::debug!(compendium_id = %compendium_id, url = %url, "Querying o2r jobs");

        let request = self
            .http_client
            .get(&url)
            .query(&[("compendium_id", compendium_id)]);
        let body = self.fetch(request, compendium_id).await?;
        serde_json::from_str(&body).map_err(|e| O2rError::ParseError(e.to_string()))
    }

    /// Single job with its execution status
    pub async fn job(&self, job_id: &str) -> Result<Job, O2rError> {
        let url = format!("{}/api/v1/job/{}", self.base_url, urlencoding::encode(job_id));
        tracing::debug!(job_id = %job_id, url = %url, "Querying o2r job");

        let body = self.fetch(self.http_client.get(&url), job_id).await?;
        serde_json::from_str(&body).map_err(|e| O2rError::ParseError(e.to_string()))
    }

    /// Compendium metadata document
    pub async fn compendium(&self, compendium_id: &str) -> Result<Value, O2rError> {
        let url = format!(
            "{}/api/v1/compendium/{}",
            self.base_url,
            urlencoding::encode(compendium_id)
        );
        tracing::debug!(compendium_id = %compendium_id, url = %url, "Querying o2r compendium");

        let body = self.fetch(self.http_client.get(&url), compendium_id).await?;
        serde_json::from_str(&body).map_err(|e| O2rError::ParseError(e.to_string()))
    }

    async fn fetch(&self, request: reqwest::RequestBuilder, id: &str) -> Result<String, O2rError> {
        let response = request
            .send()
            .await
            .map_err(|e| O2rError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(O2rError::NotFound(id.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(O2rError::ApiError(status.as_u16(), error_text));
        }

        response
            .text()
            .await
            .map_err(|e| O2rError::NetworkError(e.to_string()))
    }
}
