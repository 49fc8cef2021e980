//! Reqwest-based client for the backend REST API.

use std::sync::Arc;
use std::time::Instant;

use datadock_core::{Error as CoreError, Result};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::connections::ConnectionsApi;
use crate::error::{self, Error};
use crate::pipelines::PipelinesApi;
use crate::schedules::SchedulesApi;

/// Tracing target for the request pipeline.
pub const TRACING_TARGET: &str = "datadock_client::client";

/// Path prefix of every backend endpoint.
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Inner client that holds the HTTP client and configuration.
struct ApiClientInner {
    http: Client,
    base_url: Url,
    config: ApiConfig,
}

impl std::fmt::Debug for ApiClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientInner")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Client for the backend API.
///
/// Cloning is cheap; clones share the connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use datadock_client::{ApiClient, ApiConfig};
///
/// let client = ApiClient::new(ApiConfig::new("http://localhost:8000"))?;
/// let connections = client.connections().list().await?;
/// ```
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

impl ApiClient {
    /// Creates a new API client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating API client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(Error::from)?;

        let inner = ApiClientInner {
            http,
            base_url,
            config,
        };

        tracing::info!(
            target: TRACING_TARGET,
            base_url = %inner.base_url,
            "API client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Connection endpoints.
    pub fn connections(&self) -> ConnectionsApi<'_> {
        ConnectionsApi::new(self)
    }

    /// ETL pipeline endpoints.
    pub fn pipelines(&self) -> PipelinesApi<'_> {
        PipelinesApi::new(self)
    }

    /// Scheduler endpoints.
    pub fn schedules(&self) -> SchedulesApi<'_> {
        SchedulesApi::new(self)
    }

    /// Builds the absolute URL of an endpoint below `/api/v1`.
    ///
    /// Segments are percent-encoded, so string ids cannot escape the path.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CoreError::configuration().with_message("API base URL cannot carry a path")
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Resolves the bearer token.
    ///
    /// The token file is read on every call so a rotated token is picked up
    /// without restarting. It takes precedence over the inline token.
    async fn bearer_token(&self) -> Result<Option<String>> {
        let config = &self.inner.config;

        if let Some(path) = config.token_file.as_deref() {
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(Error::from)?;
            let token = contents.trim();
            if !token.is_empty() {
                return Ok(Some(token.to_owned()));
            }
        }

        Ok(config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned))
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint(segments)?;
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            method = %method,
            url = %url,
            "Sending API request"
        );

        let mut request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();
        let text = response.text().await.map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            method = %method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "API request completed"
        );

        if !status.is_success() {
            let error = error::from_response(status, &text);
            tracing::debug!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                kind = %error.kind(),
                "API request failed"
            );
            return Err(error);
        }

        Ok((status, text))
    }

    /// Sends a request and decodes its JSON response.
    async fn request<T, B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::from)?;
        let (status, text) = self.execute(method, segments, body).await?;
        decode(status, &text)
    }

    /// `GET` an endpoint.
    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.request::<T, ()>(Method::GET, segments, None).await
    }

    /// `POST` a JSON body to an endpoint.
    pub(crate) async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, segments, Some(body)).await
    }

    /// `POST` to an action endpoint without a body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.request::<T, ()>(Method::POST, segments, None).await
    }

    /// `PATCH` an endpoint with a JSON body.
    pub(crate) async fn patch<T, B>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, segments, Some(body)).await
    }

    /// `DELETE` an endpoint. Any response body is discarded.
    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.execute(Method::DELETE, segments, None).await?;
        Ok(())
    }
}

/// Decodes a 2xx body. Empty bodies (including `204 No Content`) decode as
/// JSON `null`, which yields `()` or `None`.
fn decode<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T> {
    let text = if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        "null"
    } else {
        text
    };
    serde_json::from_str(text).map_err(|e| Error::from(e).into())
}

/// List responses: a bare array, or an object wrapping it.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "connections",
            alias = "pipelines",
            alias = "schedules",
            alias = "data",
            alias = "results"
        )]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}
