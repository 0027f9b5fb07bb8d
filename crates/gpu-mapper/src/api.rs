//! Cluster API trait and request body type.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::MapperError;

/// Body of an API request. JSON and form bodies are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// A JSON document (`Content-Type: application/json`).
    Json(Value),
    /// Ordered form fields; keys may repeat
    /// (`Content-Type: application/x-www-form-urlencoded`).
    Form(Vec<(String, String)>),
}

/// A cluster management API that answers one authenticated call at a time.
///
/// Implementations return the unwrapped `data` payload of the response
/// envelope and report every failure as [`MapperError::RequestFailed`].
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Perform one API call.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, MapperError>;

    /// `GET path`.
    async fn get(&self, path: &str) -> Result<Value, MapperError> {
        self.request(Method::GET, path, RequestBody::Empty).await
    }

    /// `DELETE path`.
    async fn delete(&self, path: &str) -> Result<Value, MapperError> {
        self.request(Method::DELETE, path, RequestBody::Empty).await
    }

    /// `POST path` with a form-encoded body.
    async fn post_form(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<Value, MapperError> {
        self.request(Method::POST, path, RequestBody::Form(fields))
            .await
    }
}
