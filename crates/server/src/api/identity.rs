//! Identity asserted by the upstream proxy.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use secrecy::ExposeSecret;
use uuid::Uuid;

use hrdesk_core::domain::identity::{Actor, Role};
use hrdesk_core::errors::ApplicationError;

use super::{error::ApiError, AppState};

pub const USER_EMAIL_HEADER: &str = "x-hrdesk-user-email";
pub const USER_NAME_HEADER: &str = "x-hrdesk-user-name";
pub const USER_ROLE_HEADER: &str = "x-hrdesk-user-role";
pub const PROXY_SECRET_HEADER: &str = "x-hrdesk-proxy-secret";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// The acting identity plus the correlation id used in logs, audit events and errors.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub actor: Actor,
    pub correlation_id: String,
}

impl RequestContext {
    pub fn fail(&self, error: impl Into<ApplicationError>) -> ApiError {
        ApiError::new(error, &self.correlation_id)
    }

    pub fn forbid(&self, action: &str) -> ApiError {
        self.fail(ApplicationError::Forbidden(format!(
            "role `{}` may not {action}",
            self.actor.role.as_str()
        )))
    }

    /// Administrators and HR.
    pub fn require_staff(&self, action: &str) -> Result<(), ApiError> {
        if self.actor.role.sees_all_records() {
            Ok(())
        } else {
            Err(self.forbid(action))
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn resolve(headers: &HeaderMap, state: &AppState) -> Result<RequestContext, ApiError> {
    let correlation_id = header(headers, CORRELATION_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let unauthorized =
        |message: &str| ApiError::new(ApplicationError::Unauthorized(message.to_string()), &correlation_id);

    if let Some(secret) = &state.proxy_secret {
        match header(headers, PROXY_SECRET_HEADER) {
            Some(provided) if provided == secret.expose_secret() => {}
            Some(_) => return Err(unauthorized("invalid proxy secret")),
            None => return Err(unauthorized("missing proxy secret")),
        }
    }

    let email = header(headers, USER_EMAIL_HEADER)
        .filter(|email| email.contains('@'))
        .ok_or_else(|| unauthorized("missing or malformed user email header"))?;
    let name = header(headers, USER_NAME_HEADER).unwrap_or(email);
    let role = match header(headers, USER_ROLE_HEADER) {
        Some(raw) => Role::parse(raw).ok_or_else(|| unauthorized("unknown user role"))?,
        None => Role::Employee,
    };

    Ok(RequestContext { actor: Actor::new(email, name, role), correlation_id })
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(&parts.headers, state)
    }
}
