use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use hrdesk_core::errors::{ApplicationError, InterfaceError, InterfaceErrorKind};

/// HTTP-facing failure. Always carries the request's correlation id.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
    pub user_message: &'static str,
    pub correlation_id: String,
}

impl ApiError {
    pub fn new(error: impl Into<ApplicationError>, correlation_id: &str) -> Self {
        Self(error.into().into_interface(correlation_id))
    }

    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            InterfaceErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            InterfaceErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            InterfaceErrorKind::Forbidden => StatusCode::FORBIDDEN,
            InterfaceErrorKind::NotFound => StatusCode::NOT_FOUND,
            InterfaceErrorKind::Conflict => StatusCode::CONFLICT,
            InterfaceErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn kind_label(kind: InterfaceErrorKind) -> &'static str {
    match kind {
        InterfaceErrorKind::BadRequest => "bad_request",
        InterfaceErrorKind::Unauthorized => "unauthorized",
        InterfaceErrorKind::Forbidden => "forbidden",
        InterfaceErrorKind::NotFound => "not_found",
        InterfaceErrorKind::Conflict => "conflict",
        InterfaceErrorKind::ServiceUnavailable => "service_unavailable",
        InterfaceErrorKind::Internal => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %self.0.correlation_id(),
                error_kind = kind_label(kind),
                error = %self.0.message(),
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %self.0.correlation_id(),
                error_kind = kind_label(kind),
                error = %self.0.message(),
                "request rejected"
            );
        }

        // Storage and configuration details stay in the logs.
        let message = if status.is_server_error() {
            self.0.user_message().to_string()
        } else {
            self.0.message().to_string()
        };
        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind_label(kind),
                message,
                user_message: self.0.user_message(),
                correlation_id: self.0.correlation_id().to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
