//! Proxmox VE API client implementation.
//!
//! Authenticates every call with a static API token header:
//! `Authorization: PVEAPIToken=<token id>=<token secret>`.
//! Token authentication needs no ticket or CSRF step.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ClusterApi, RequestBody};
use crate::config::MapperConfig;
use crate::error::MapperError;

/// Proxmox VE API client.
#[derive(Clone)]
pub struct ProxmoxClient {
    /// HTTP client.
    client: Client,
    /// API base URL without a trailing slash.
    base_url: String,
    /// Pre-rendered `Authorization` header value.
    auth_header: String,
}

impl ProxmoxClient {
    /// Create a new client from the run configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &MapperConfig) -> Result<Self, MapperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| MapperError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_header: format!("PVEAPIToken={}={}", config.token_id, config.token_value),
        })
    }

    /// Absolute URL for a relative API path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Take the `data` member out of a response envelope.
    fn unwrap_envelope(envelope: Value) -> Value {
        match envelope {
            Value::Object(mut map) => map
                .remove("data")
                .unwrap_or_else(|| Value::Object(Map::new())),
            _ => Value::Object(Map::new()),
        }
    }
}

/// Build the error for a failed call.
fn request_failed(
    method: &Method,
    path: &str,
    status: Option<u16>,
    cause: String,
    body: Option<String>,
) -> MapperError {
    MapperError::RequestFailed {
        method: method.to_string(),
        path: path.to_string(),
        status,
        cause,
        body,
    }
}

#[async_trait]
impl ClusterApi for ProxmoxClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, MapperError> {
        info!(method = %method, path = %path, "Making API request");

        let builder = self
            .client
            .request(method.clone(), self.url(path))
            .header(AUTHORIZATION, &self.auth_header);

        let builder = match &body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| request_failed(&method, path, None, e.to_string(), None))?;

        let status = response.status();
        let code = Some(status.as_u16());
        debug!(method = %method, path = %path, status = %status, "Response status");

        let text = response
            .text()
            .await
            .map_err(|e| request_failed(&method, path, code, e.to_string(), None))?;

        if !status.is_success() {
            warn!(method = %method, path = %path, status = %status, body = %text, "Error response");
            return Err(request_failed(
                &method,
                path,
                code,
                format!("HTTP status {status}"),
                Some(text),
            ));
        }

        let envelope: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            request_failed(
                &method,
                path,
                code,
                format!("invalid JSON response: {e}"),
                Some(text.clone()),
            )
        })?;

        Ok(Self::unwrap_envelope(envelope))
    }
}
