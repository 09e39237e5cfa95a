//! HTTP client for the dashboard's task endpoints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use taskdash_core::{NetworkError, ReqwestErrorExt, ServiceConfig};
use url::Url;

use crate::cookie::get_cookie;
use crate::task::{Task, TaskCreateRequest, TaskId, ToggleResponse};

/// Header the dashboard reads the CSRF token from.
pub const CSRF_HEADER: &str = "X-CSRFToken";

const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote task store operations.
///
/// `TaskClient` is the HTTP implementation; the synchronizer only depends on
/// this trait so it can be driven by a scripted store in tests.
///
/// `TaskClient` bounds every request by `service.request_timeout_secs`
/// (30s unless configured), so a hung request resolves as
/// `NetworkError::Timeout` instead of pending forever.
pub trait TaskRemote: Send + Sync {
    /// `GET /api/todos/`
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, NetworkError>> + Send;

    /// `POST /api/todos/add/`
    fn add_task(
        &self,
        request: TaskCreateRequest,
    ) -> impl Future<Output = Result<Task, NetworkError>> + Send;

    /// `POST /api/todos/toggle/{id}/`
    fn toggle_task(
        &self,
        id: &TaskId,
    ) -> impl Future<Output = Result<ToggleResponse, NetworkError>> + Send;

    /// `POST /api/todos/delete/{id}/`
    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), NetworkError>> + Send;
}

/// Task API client
#[derive(Debug, Clone)]
pub struct TaskClient {
    base_url: Url,
    client: Arc<Client>,
    cookie: Option<String>,
    csrf_token: Option<String>,
}

impl TaskClient {
    /// Create a client for the dashboard at `base_url`.
    ///
    /// `cookie` is the raw `Cookie` header; the CSRF token is read from its
    /// `csrftoken` entry.
    pub fn new(base_url: &str, cookie: Option<String>) -> Result<Self> {
        Self::build(base_url, cookie, DEFAULT_CSRF_COOKIE, DEFAULT_TIMEOUT)
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::build(
            &config.base_url,
            config.cookie.clone(),
            &config.csrf_cookie_name,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn build(
        base_url: &str,
        cookie: Option<String>,
        csrf_cookie_name: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        // Url::join drops the last path segment unless it ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let csrf_token = cookie
            .as_deref()
            .and_then(|c| get_cookie(c, csrf_cookie_name));
        if csrf_token.is_none() {
            tracing::warn!(
                "No '{}' cookie available; mutating requests will be sent without a CSRF token",
                csrf_cookie_name
            );
        }

        Ok(Self {
            base_url,
            client: Arc::new(client),
            cookie,
            csrf_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|e| NetworkError::InvalidResponse(format!("Bad endpoint {}: {}", path, e)))
    }

    /// Endpoint for one task; the id is percent-encoded as a single segment.
    fn task_endpoint(&self, action: &str, id: &TaskId) -> Result<Url, NetworkError> {
        let mut url = self.endpoint(&format!("api/todos/{}/", action))?;
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidResponse(format!("Bad base URL {}", self.base_url)))?
            .pop_if_empty()
            .push(id.as_str())
            .push("");
        Ok(url)
    }

    /// Attach session cookie and JSON accept header
    fn build_request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(header::ACCEPT, "application/json");
        match &self.cookie {
            Some(cookie) => req.header(header::COOKIE, cookie),
            None => req,
        }
    }

    /// POST with the CSRF header when a token is known
    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        let req = self.build_request(self.client.post(url));
        match &self.csrf_token {
            Some(token) => req.header(CSRF_HEADER, token),
            None => req,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, NetworkError> {
        let response = request
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        if !status.is_success() {
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, NetworkError> {
        serde_json::from_str(body).map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }
}

impl TaskRemote for TaskClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, NetworkError> {
        tracing::debug!("Fetching tasks");

        let url = self.endpoint("api/todos/")?;
        let body = self.send(self.build_request(self.client.get(url))).await?;
        let tasks: Vec<Task> = Self::parse(&body)?;

        tracing::info!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn add_task(&self, request: TaskCreateRequest) -> Result<Task, NetworkError> {
        tracing::debug!("Creating task: {}", request.text);

        let url = self.endpoint("api/todos/add/")?;
        let body = self.send(self.post(url).json(&request)).await?;
        let task: Task = Self::parse(&body)?;

        tracing::info!("Created task {}", task.id);
        Ok(task)
    }

    async fn toggle_task(&self, id: &TaskId) -> Result<ToggleResponse, NetworkError> {
        tracing::debug!("Toggling task {}", id);

        let url = self.task_endpoint("toggle", id)?;
        let body = self.send(self.post(url)).await?;

        // Only success matters; an unreadable body means "flip locally".
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::debug!("Ignoring unreadable toggle body for {}: {}", id, e);
            ToggleResponse::default()
        }))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), NetworkError> {
        tracing::debug!("Deleting task {}", id);

        let url = self.task_endpoint("delete", id)?;
        self.send(self.post(url)).await?;

        tracing::info!("Deleted task {}", id);
        Ok(())
    }
}
