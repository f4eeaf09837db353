//! HTTP client for the remote task service.
//!
//! Speaks JSON to a REST collection rooted at `{base_url}/tasks`:
//!
//! | operation | request                                  |
//! |-----------|------------------------------------------|
//! | list      | `GET /tasks?page=..&per_page=..&<filters>` |
//! | create    | `POST /tasks`                            |
//! | update    | `PUT /tasks/{id}`                        |
//! | delete    | `DELETE /tasks/{id}`                     |
//!
//! Non-success responses carry a `{"detail": ...}` document which is
//! surfaced as [`ApiError::Status`].

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use taskdeck_proto::api::{ApiErrorBody, ErrorDetail, PageRequest, Paginated};
use taskdeck_proto::task::{CreateTaskRequest, Task, TaskFilters, TaskId, UpdateTaskRequest};
use url::Url;

use super::{ApiError, TaskApi};

/// `reqwest`-backed [`TaskApi`].
#[derive(Clone)]
pub struct HttpTaskApi {
    http: Client,
    /// Always ends with `/` so relative joins stay under it.
    base_url: Url,
    /// Bearer token sent with every request, if any.
    token: Option<String>,
}

impl fmt::Debug for HttpTaskApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTaskApi")
            .field("http", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpTaskApi {
    /// Request timeout used when the caller has no preference.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `base_url` is not an absolute
    /// URL that can carry a path, or [`ApiError::Transport`] if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Base URL every request is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn tasks_url(&self) -> Result<Url, ApiError> {
        self.base_url
            .join("tasks")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }

    fn task_url(&self, id: &TaskId) -> Result<Url, ApiError> {
        let mut url = self.tasks_url()?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest(format!("cannot address task {id}")))?
            .push(id.as_str());
        Ok(url)
    }

    /// Builds the list URL. Filter keys named `page` or `per_page` are
    /// dropped in favour of the explicit page request.
    fn list_url(&self, filters: &TaskFilters, page: PageRequest) -> Result<Url, ApiError> {
        let mut url = self.tasks_url()?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in filters.iter() {
                if key == "page" || key == "per_page" {
                    continue;
                }
                query.append_pair(key, value);
            }
            query.append_pair("page", &page.page.to_string());
            query.append_pair("per_page", &page.per_page.to_string());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body).map_or_else(
            |_| {
                ErrorDetail::Message(if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body.clone()
                })
            },
            |doc| doc.detail,
        );
        tracing::warn!(
            status = status.as_u16(),
            detail = %detail,
            "task service returned error"
        );
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        Self::send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl TaskApi for HttpTaskApi {
    async fn list(
        &self,
        filters: &TaskFilters,
        page: PageRequest,
    ) -> Result<Paginated<Task>, ApiError> {
        let url = self.list_url(filters, page)?;
        tracing::debug!(url = %url, "listing tasks");
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        let url = self.tasks_url()?;
        tracing::debug!(url = %url, "creating task");
        Self::send_json(self.request(Method::POST, url).json(request)).await
    }

    async fn update(&self, id: &TaskId, request: &UpdateTaskRequest) -> Result<Task, ApiError> {
        let url = self.task_url(id)?;
        tracing::debug!(url = %url, "updating task");
        Self::send_json(self.request(Method::PUT, url).json(request)).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let url = self.task_url(id)?;
        tracing::debug!(url = %url, "deleting task");
        Self::send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Unreachable(e.to_string())
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}
