//! Error types shared by the API client, discovery and mapping code.

use thiserror::Error;

/// Errors that can occur while talking to the cluster API.
#[derive(Error, Debug)]
pub enum MapperError {
    /// An API call failed in transport, returned a non-2xx status, or
    /// returned a body that was not a JSON envelope.
    #[error(
        "API request failed: {method} {path}: {cause}{}",
        body_suffix(.body.as_deref())
    )]
    RequestFailed {
        /// HTTP method of the failed call.
        method: String,
        /// Relative API path of the failed call.
        path: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Underlying cause (transport error or status line).
        cause: String,
        /// Response body text, when available.
        body: Option<String>,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn body_suffix(body: Option<&str>) -> String {
    body.map(|b| format!(" - {b}")).unwrap_or_default()
}

impl MapperError {
    /// HTTP status carried by a [`MapperError::RequestFailed`], if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => *status,
            Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display_includes_body() {
        let err = MapperError::RequestFailed {
            method: "DELETE".to_string(),
            path: "cluster/mapping/pci/gpu-x".to_string(),
            status: Some(500),
            cause: "HTTP status 500 Internal Server Error".to_string(),
            body: Some("no such resource".to_string()),
        };

        assert_eq!(
            err.to_string(),
            "API request failed: DELETE cluster/mapping/pci/gpu-x: \
             HTTP status 500 Internal Server Error - no such resource"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_request_failed_display_without_body() {
        let err = MapperError::RequestFailed {
            method: "GET".to_string(),
            path: "nodes".to_string(),
            status: None,
            cause: "connection refused".to_string(),
            body: None,
        };

        assert_eq!(
            err.to_string(),
            "API request failed: GET nodes: connection refused"
        );
        assert_eq!(err.status(), None);
    }
}
