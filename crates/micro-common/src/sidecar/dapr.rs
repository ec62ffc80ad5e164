//! Sidecar client speaking the Dapr HTTP API (v1.0).
//!
//! Endpoints used:
//! - `{verb} /v1.0/invoke/{app_id}/method/{method}` for service invocation
//! - `POST /v1.0/state/{store}` with `[{"key", "value"}]` to save state
//! - `GET /v1.0/state/{store}/{key}` to read state (204 when absent)
//! - `DELETE /v1.0/state/{store}/{key}` to delete state

use super::client::{SidecarClient, SidecarResponse};
use crate::config::{SidecarArgs, SidecarConfig};
use crate::{MicroError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "v1.0";

/// HTTP client for a local Dapr sidecar.
#[derive(Debug, Clone)]
pub struct DaprHttpClient {
    base_url: Url,
    client: Client,
    api_token: Option<String>,
}

impl DaprHttpClient {
    /// Create a client for the sidecar at `base_url`, e.g. `http://127.0.0.1:3500`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| MicroError::Config {
            message: format!("Invalid sidecar URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MicroError::Config {
                message: format!("Sidecar URL '{}' cannot be used as a base", base_url),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("micro-services/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MicroError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url,
            client,
            api_token: None,
        })
    }

    /// Create a client from command-line sidecar settings.
    pub fn from_args(args: &SidecarArgs) -> Result<Self> {
        Ok(Self::new(&args.base_url(), args.timeout())?.with_api_token(args.dapr_api_token.clone()))
    }

    /// Send `token` in the `dapr-api-token` header of every request.
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/v1.0/{segments...}`; each segment is percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(API_VERSION).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.header(SidecarConfig::API_TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Turn a non-2xx response into a sidecar error carrying the body text.
    async fn check(operation: &'static str, target: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MicroError::Sidecar {
            operation,
            target: target.to_string(),
            status: Some(status.as_u16()),
            message: format!("sidecar returned {}: {}", status, body),
        })
    }

    async fn send(
        &self,
        operation: &'static str,
        target: &str,
        builder: RequestBuilder,
    ) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| MicroError::from_reqwest(operation, target, e))?;
        Self::check(operation, target, response).await
    }

    fn require(name: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(MicroError::InvalidParams {
                message: format!("{} must not be empty", name),
            });
        }
        Ok(())
    }

    async fn read_body(operation: &'static str, target: &str, response: Response) -> Result<Bytes> {
        response
            .bytes()
            .await
            .map_err(|e| MicroError::from_reqwest(operation, target, e))
    }
}

#[async_trait]
impl SidecarClient for DaprHttpClient {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Bytes,
        verb: Method,
    ) -> Result<SidecarResponse> {
        Self::require("app_id", app_id)?;
        let url = self.endpoint(
            ["invoke", app_id, "method"]
                .into_iter()
                .chain(method.split('/').filter(|s| !s.is_empty())),
        );
        debug!(app_id, method, %verb, "Invoking via sidecar");

        let builder = self
            .request(verb, url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);
        let response = self.send("invoke", app_id, builder).await?;
        let data = Self::read_body("invoke", app_id, response).await?;
        Ok(SidecarResponse { data })
    }

    async fn save_state(&self, store: &str, key: &str, value: Bytes) -> Result<()> {
        Self::require("store", store)?;
        Self::require("key", key)?;
        let target = format!("{}/{}", store, key);
        // The state API takes the value as JSON; fall back to a string for non-JSON payloads.
        let value: Value = serde_json::from_slice(&value)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&value).into_owned()));
        let body = json!([{ "key": key, "value": value }]);

        let builder = self.request(Method::POST, self.endpoint(["state", store])).json(&body);
        self.send("save_state", &target, builder).await?;
        debug!(store, key, "State saved via sidecar");
        Ok(())
    }

    async fn get_state(&self, store: &str, key: &str) -> Result<SidecarResponse> {
        Self::require("store", store)?;
        Self::require("key", key)?;
        let target = format!("{}/{}", store, key);
        let builder = self.request(Method::GET, self.endpoint(["state", store, key]));
        let response = self.send("get_state", &target, builder).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(SidecarResponse::empty());
        }
        let data = Self::read_body("get_state", &target, response).await?;
        Ok(SidecarResponse { data })
    }

    async fn delete_state(&self, store: &str, key: &str) -> Result<()> {
        Self::require("store", store)?;
        Self::require("key", key)?;
        let target = format!("{}/{}", store, key);
        let builder = self.request(Method::DELETE, self.endpoint(["state", store, key]));
        self.send("delete_state", &target, builder).await?;
        debug!(store, key, "State deleted via sidecar");
        Ok(())
    }
}
