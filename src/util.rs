use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct HttpClient {
    pub client: reqwest::Client,
}

#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(e) => e.status(),
            HttpError::Decode(_) => None,
        }
    }
}

impl HttpClient {
    pub fn new() -> reqwest::Result<HttpClient> {
        HttpClient::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> reqwest::Result<HttpClient> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(HttpClient { client })
    }

    /// Sends the request and decodes a JSON body. Any non-success status is
    /// turned into [`HttpError::Status`], carrying the remote's own message
    /// when the body has one.
    pub async fn send_json<T>(&self, request: RequestBuilder) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(HttpError::Status {
                status,
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(HttpError::Decode)
    }

    /// Like [`HttpClient::send_json`], for endpoints whose body we don't need.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), HttpError> {
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status,
                message: error_message(&body),
            });
        }

        Ok(())
    }
}

/// Pulls a human readable message out of an error body.
///
/// Google APIs nest it under `error.message`, HubSpot puts it at the top
/// level. Anything else is returned trimmed, or as a placeholder if empty.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "<empty body>".to_string()
    } else {
        body.to_string()
    }
}
