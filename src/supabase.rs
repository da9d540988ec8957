//! Pieces shared by the auth and table clients talking to the hosted
//! Supabase project.

use reqwest::{Response, StatusCode};
use serde::Deserialize;

pub const API_KEY_HEADER: &str = "apikey";

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("Request to supabase failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Supabase responded with {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Malformed supabase response: {0}")]
    Malformed(String),
}

impl SupabaseError {
    /// Upstream rejected the caller (bad credentials, expired token, ...)
    /// rather than failing on its own.
    pub fn client_status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } if status.is_client_error() => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The different error shapes GoTrue and PostgREST reply with.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        })
}

/// Passes successful responses through and turns the rest into
/// [`SupabaseError::Api`].
pub async fn check(response: Response) -> Result<Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Api {
        status,
        message: error_message(status, &body),
    })
}
