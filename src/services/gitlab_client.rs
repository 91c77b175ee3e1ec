//! GitLab API client.
//!
//! HTTP client for GitLab API v4 with token authentication. Implements the
//! [`MergeRequestGateway`] reads and maps every failure onto the small set
//! of [`AppError`] variants the refresh pipeline reasons about.

use crate::error::AppError;
use crate::models::{ApprovalState, Discussion, GitLabUser, MergeRequestSummary, PipelineRef};
use crate::services::gateway::{MergeRequestGateway, MergeRequestsQuery};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Discussions are read from a single page of this size.
const DISCUSSIONS_PER_PAGE: u32 = 100;

/// GitLab API client configuration.
#[derive(Debug, Clone)]
pub struct GitLabClientConfig {
    /// Base URL of the GitLab instance (e.g., `https://gitlab.com`).
    pub base_url: String,

    /// Personal access token for authentication.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitLabClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// GitLab API client.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    config: GitLabClientConfig,
}

impl GitLabClient {
    /// Create a new GitLab client.
    pub fn new(config: GitLabClientConfig) -> Result<Self, AppError> {
        if config.base_url.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "GitLab URL is required",
                "base_url",
            ));
        }

        let mut headers = header::HeaderMap::new();
        let mut token_value = header::HeaderValue::from_str(config.token.trim())
            .map_err(|_| AppError::invalid_input_field("Invalid token format", "token"))?;
        token_value.set_sensitive(true);
        headers.insert("PRIVATE-TOKEN", token_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Base URL of the instance this client talks to.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url(), path)
    }

    /// GET an endpoint and decode its JSON body.
    async fn get<T, Q>(&self, endpoint: &str, query: Option<&Q>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut request = self.client.get(self.api_url(endpoint));
        if let Some(q) = query {
            request = request.query(q);
        }

        log::debug!("[gitlab] GET {}", endpoint);
        let response = request.send().await?;
        Self::handle_response(response, endpoint).await
    }

    /// Map the status, then decode the body.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if !status.is_success() {
            let error = error_for_status(status, retry_after_secs(response.headers()), endpoint);
            log::debug!("[gitlab] {} -> {}", endpoint, status);
            return Err(error);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::decoding(format!("{}: {}", endpoint, e)))
    }

    /// The user the token belongs to. Used to validate a token.
    pub async fn current_user(&self) -> Result<GitLabUser, AppError> {
        self.get("/user", None::<&()>).await
    }
}

#[async_trait]
impl MergeRequestGateway for GitLabClient {
    async fn list_merge_requests(
        &self,
        project_id: i64,
        query: &MergeRequestsQuery,
    ) -> Result<Vec<MergeRequestSummary>, AppError> {
        let endpoint = format!("/projects/{}/merge_requests", project_id);
        self.get(&endpoint, Some(query)).await
    }

    async fn get_approval_state(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<ApprovalState, AppError> {
        let endpoint = format!(
            "/projects/{}/merge_requests/{}/approval_state",
            project_id, mr_iid
        );
        self.get(&endpoint, None::<&()>).await
    }

    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<Discussion>, AppError> {
        let endpoint = format!(
            "/projects/{}/merge_requests/{}/discussions",
            project_id, mr_iid
        );
        self.get(&endpoint, Some(&[("per_page", DISCUSSIONS_PER_PAGE)]))
            .await
    }

    async fn list_pipelines(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<PipelineRef>, AppError> {
        let endpoint = format!(
            "/projects/{}/merge_requests/{}/pipelines",
            project_id, mr_iid
        );
        self.get(&endpoint, None::<&()>).await
    }
}

/// Classify an unsuccessful HTTP status.
fn error_for_status(status: StatusCode, retry_after: Option<u64>, endpoint: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized,
        StatusCode::NOT_FOUND => AppError::not_found(endpoint),
        StatusCode::TOO_MANY_REQUESTS => AppError::rate_limited(retry_after),
        _ => AppError::server_error(status.as_u16()),
    }
}

/// `Retry-After` in seconds. The HTTP-date form is ignored.
fn retry_after_secs(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
