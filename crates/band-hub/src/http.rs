//! Shared ureq plumbing for the Google REST clients.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::RemoteError;

pub(crate) type HttpResponse = ureq::http::Response<ureq::Body>;

const ERROR_BODY_LIMIT: usize = 512;

/// OAuth bearer token obtained by the caller.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Agent that reports HTTP error statuses as responses so callers can read them.
pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .user_agent(concat!("band-hub/", env!("CARGO_PKG_VERSION")))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map transport failures and non-success statuses into [`RemoteError`].
pub(crate) fn check_response(
    operation: &'static str,
    result: Result<HttpResponse, ureq::Error>,
) -> Result<HttpResponse, RemoteError> {
    let mut resp = result.map_err(|err| RemoteError::Transport {
        operation,
        message: err.to_string(),
    })?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .body_mut()
        .read_to_string()
        .ok()
        .map(|text| truncate(text.trim(), ERROR_BODY_LIMIT))
        .filter(|text| !text.is_empty());
    tracing::warn!(
        operation,
        status = status.as_u16(),
        body = body.as_deref().unwrap_or(""),
        "google api request failed"
    );
    Err(RemoteError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Read and decode a JSON response body.
pub(crate) fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    mut resp: HttpResponse,
) -> Result<T, RemoteError> {
    let body = resp
        .body_mut()
        .read_to_string()
        .map_err(|err| RemoteError::InvalidResponse {
            operation,
            message: err.to_string(),
        })?;
    parse_json(operation, &body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    operation: &'static str,
    body: &str,
) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|err| RemoteError::InvalidResponse {
        operation,
        message: err.to_string(),
    })
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
