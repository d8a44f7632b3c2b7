//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint returns the
//! same `{code, message, field, reason}` shape.
//!
//! # Key invariants and assumptions
//! - Error responses carry a stable `code` and a human-readable `message`.
//! - Access denials are `403 forbidden` with the deny reason in `reason`.
//! - Grant validation failures are `400 validation_error` naming the field;
//!   duplicates are `409 duplicate_grant`.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use precedent_authz::{DenyReason, GrantError};

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use practice::api::error::api_not_found;
///
/// let err = api_not_found("case not found");
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// assert_eq!(err.body.code, "not_found");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            field: None,
            reason: None,
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 409 Conflict error with a caller-provided code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    error(StatusCode::CONFLICT, code, message)
}

/// Build a 500 Internal Server Error from a store error.
///
/// Logs the store error and returns a generic message.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "practice storage error");
    error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error for an access-control deny.
pub fn api_denied(reason: DenyReason) -> ApiError {
    let message = match reason {
        DenyReason::AccountInactive => "account is inactive",
        DenyReason::CrossTenant => "record belongs to another organization",
        DenyReason::InsufficientRank => "role does not permit this action",
        DenyReason::NotAuthorized => "not authorized for this record",
    };
    let mut err = error(StatusCode::FORBIDDEN, "forbidden", message);
    err.body.reason = Some(reason.code().to_string());
    err
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Validation error attached to one request field.
pub fn api_field_error(field: &str, message: &str) -> ApiError {
    let mut err = api_validation_error(message);
    err.body.field = Some(field.to_string());
    err
}

/// Map a rejected grant to its HTTP shape.
pub fn api_grant_error(err: &GrantError) -> ApiError {
    let message = err.to_string();
    let mut api = match err {
        GrantError::DuplicateGrant => api_conflict("duplicate_grant", &message),
        _ => api_validation_error(&message),
    };
    api.body.field = Some(err.field().to_string());
    api.body.reason = Some(err.code().to_string());
    api
}

/// Map store failures that every handler treats the same way.
pub fn api_store_error(what: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_not_found(&format!("{what} not found")),
        StoreError::Conflict(message) => api_conflict("already_exists", &message),
        StoreError::Grant(grant) => api_grant_error(&grant),
        other => api_internal(&format!("failed to access {what}"), &other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precedent_authz::{GrantParty, Role};

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.code, "not_found");

        let conflict = api_conflict("already_exists", "conflict");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "already_exists");

        let unauthorized = api_unauthorized("nope");
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.body.code, "unauthorized");

        let validation = api_field_error("email", "bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
        assert_eq!(validation.body.field.as_deref(), Some("email"));
    }

    #[test]
    fn denials_carry_reason_code() {
        let denied = api_denied(DenyReason::InsufficientRank);
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.body.code, "forbidden");
        assert_eq!(denied.body.reason.as_deref(), Some("insufficient_rank"));
    }

    #[test]
    fn grant_errors_map_to_validation_or_conflict() {
        let incompatible = api_grant_error(&GrantError::RoleIncompatible {
            grantee_role: Role::Practitioner,
            target_role: Role::ManagingPractitioner,
        });
        assert_eq!(incompatible.status, StatusCode::BAD_REQUEST);
        assert_eq!(incompatible.body.field.as_deref(), Some("can_access_user"));
        assert_eq!(incompatible.body.reason.as_deref(), Some("role_incompatible"));

        let inactive = api_grant_error(&GrantError::InactiveAccount {
            party: GrantParty::GrantedTo,
        });
        assert_eq!(inactive.body.field.as_deref(), Some("granted_to"));

        let duplicate = api_grant_error(&GrantError::DuplicateGrant);
        assert_eq!(duplicate.status, StatusCode::CONFLICT);
        assert_eq!(duplicate.body.code, "duplicate_grant");
    }

    #[test]
    fn store_errors_map_by_kind() {
        let missing = api_store_error("case", StoreError::NotFound("case".into()));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.body.message, "case not found");

        let internal = api_store_error("case", StoreError::Unexpected(anyhow::anyhow!("boom")));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body.code, "internal");
    }
}
