use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::config::OwnerType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("webhook signature rejected: {0}")]
    AuthenticationFailure(String),

    #[error("project owner type `{0}` is not supported")]
    UnsupportedOwnerType(OwnerType),

    #[error("no project {number} found for {owner_type} `{owner}`")]
    ProjectNotFound {
        owner: String,
        owner_type: OwnerType,
        number: u32,
    },

    #[error("GitHub API call failed: {0}")]
    RemoteCall(String),

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            Error::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Error::RemoteCall(_) => StatusCode::BAD_GATEWAY,
            Error::UnsupportedOwnerType(_)
            | Error::ProjectNotFound { .. }
            | Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable name of the failure. This is all a caller ever sees.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthenticationFailure(_) => "authentication_failure",
            Error::UnsupportedOwnerType(_) => "unsupported_owner_type",
            Error::ProjectNotFound { .. } => "project_not_found",
            Error::RemoteCall(_) => "remote_call_failure",
            Error::MalformedPayload(_) => "malformed_payload",
            Error::Configuration(_) => "configuration",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RemoteCall(err.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error: &'static str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            status_code: status.as_u16(),
            error: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
