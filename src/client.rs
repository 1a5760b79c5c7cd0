//! HTTP client for the opus and git endpoints.

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

use crate::types::{GitStatus, GitSyncResult, Opus, OpusTypeConfig};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Body of `POST /api/git/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opus_id: Option<String>,
    pub repository_path: String,
    pub commit_message: String,
    pub push: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRequest<'a> {
    repository_path: &'a str,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    /// GET /api/opuses, optionally filtered by type key
    pub async fn list_opuses(&self, opus_type: Option<&str>) -> Result<Vec<Opus>, ClientError> {
        let mut request = self.http.get(self.url("/api/opuses"));
        if let Some(opus_type) = opus_type {
            request = request.query(&[("opusType", opus_type)]);
        }
        self.send(request).await
    }

    /// GET /api/opus-types
    pub async fn list_type_configs(&self) -> Result<Vec<OpusTypeConfig>, ClientError> {
        self.send(self.http.get(self.url("/api/opus-types"))).await
    }

    /// POST /api/git/status
    pub async fn git_status(&self, repository_path: &Path) -> Result<GitStatus, ClientError> {
        let path = repository_path.to_string_lossy();
        let request = self
            .http
            .post(self.url("/api/git/status"))
            .json(&StatusRequest {
                repository_path: &path,
            });
        self.send(request).await
    }

    /// POST /api/git/sync
    pub async fn git_sync(&self, request: &SyncRequest) -> Result<GitSyncResult, ClientError> {
        self.send(self.http.post(self.url("/api/git/sync")).json(request))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        response.json().await.map_err(ClientError::Decode)
    }
}
