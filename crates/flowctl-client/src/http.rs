//! Shared HTTP plumbing for the versioned clients
//!
//! Owns the request/response cycle: attaching credentials, decoding
//! success payloads, and translating failure responses into the
//! `ClientError` taxonomy. The versioned modules only describe routes and
//! wire shapes.

use crate::auth::Credentials;
use flowctl_engine::ClientError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// RFC 7807 style problem document returned by both API generations.
/// Only v2 fills in `code`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProblemDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Map a non-success response onto the error taxonomy.
///
/// 404 is always `NotFound`. A problem document carrying the v2
/// `INVALID_STATE` code becomes `InvalidState`; anything else keeps its
/// status and best-effort message as an `Api` error.
pub(crate) fn flow_error(status: StatusCode, body: &str) -> ClientError {
    if status == StatusCode::NOT_FOUND {
        return ClientError::NotFound;
    }
    if let Ok(problem) = serde_json::from_str::<ProblemDocument>(body) {
        let message = problem
            .detail
            .or(problem.title)
            .unwrap_or_else(|| body.to_string());
        if problem.code.as_deref() == Some("INVALID_STATE") {
            return ClientError::InvalidState { message };
        }
        return ClientError::Api {
            status: status.as_u16(),
            message,
        };
    }
    ClientError::Api {
        status: status.as_u16(),
        message: body.to_string(),
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport {
        message: err.to_string(),
    }
}

/// Credential-aware request executor shared by the versioned clients
pub(crate) struct Http {
    client: reqwest::Client,
    credentials: Credentials,
}

impl Http {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ClientError> {
        trace!(%url, "GET");
        let request = self.credentials.authorize(self.client.get(&url)).await?;
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ClientError> {
        trace!(%url, "POST");
        let request = self
            .credentials
            .authorize(self.client.post(&url).json(body))
            .await?;
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }

    /// POST whose success response carries no payload of interest.
    pub async fn post_unit<B: Serialize>(&self, url: String, body: &B) -> Result<(), ClientError> {
        trace!(%url, "POST");
        let request = self
            .credentials
            .authorize(self.client.post(&url).json(body))
            .await?;
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(flow_error(status, &body))
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ClientError> {
        trace!(%url, "DELETE");
        let request = self.credentials.authorize(self.client.delete(&url)).await?;
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(flow_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|err| ClientError::Malformed {
        message: format!("{err}; body={body}"),
    })
}

/// Trim a configured base URL so route formatting can always add one slash.
pub(crate) fn base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_maps_to_not_found() {
        let err = flow_error(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, ClientError::NotFound));
    }

    #[test]
    fn test_problem_code_maps_to_invalid_state() {
        let body = r#"{"title":"Bad Request","detail":"instance is still ACTIVE","code":"INVALID_STATE"}"#;
        match flow_error(StatusCode::BAD_REQUEST, body) {
            ClientError::InvalidState { message } => {
                assert_eq!(message, "instance is still ACTIVE")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_plain_body_keeps_status_and_text() {
        match flow_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
