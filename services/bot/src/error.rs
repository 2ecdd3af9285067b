use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Bot service domain error variants.
///
/// Every business-rule rejection has its own variant so the dispatcher can
/// render a distinct reply; store failures collapse into `Internal`.
#[derive(Debug, thiserror::Error)]
pub enum BotServiceError {
    #[error("invalid invite code format")]
    InvalidFormat,
    #[error("invite code is invalid or already used")]
    InvalidOrUsed,
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),
    #[error("user already has a media server account")]
    AlreadyBound,
    #[error("user has no media server account")]
    NotBound,
    #[error("account is already banned")]
    AlreadyBanned,
    #[error("account is not banned")]
    NotBanned,
    #[error("registration is closed")]
    RegistrationClosed,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("remote service failure: {0}")]
    RemoteFailure(String),
    #[error("registration config missing")]
    ConfigMissing,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl BotServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidOrUsed => "INVALID_OR_USED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::AlreadyBound => "ALREADY_BOUND",
            Self::NotBound => "NOT_BOUND",
            Self::AlreadyBanned => "ALREADY_BANNED",
            Self::NotBanned => "NOT_BANNED",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::RemoteFailure(_) => "REMOTE_FAILURE",
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn remote(context: &str, err: impl std::fmt::Display) -> Self {
        Self::RemoteFailure(format!("{context}: {err}"))
    }
}

impl IntoResponse for BotServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidFormat | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied(_) | Self::RegistrationClosed => StatusCode::FORBIDDEN,
            Self::InvalidOrUsed | Self::NotBound => StatusCode::NOT_FOUND,
            Self::AlreadyBound | Self::AlreadyBanned | Self::NotBanned => StatusCode::CONFLICT,
            Self::RemoteFailure(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigMissing | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            Self::Internal(e) => tracing::error!(error = %e, kind = "INTERNAL", "internal error"),
            Self::ConfigMissing => {
                tracing::error!(kind = "CONFIG_MISSING", "registration config missing")
            }
            Self::RemoteFailure(detail) => {
                tracing::warn!(detail = %detail, kind = "REMOTE_FAILURE", "remote call failed")
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
