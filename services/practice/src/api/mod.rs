//! Practice HTTP API module.
//!
//! # Purpose
//! Route handler modules plus helpers that resolve the organization and
//! members referenced by request bodies.
pub mod audit;
pub mod cases;
pub mod contacts;
pub mod courts;
pub mod deadlines;
pub mod error;
pub mod grants;
pub mod me;
pub mod openapi;
pub mod organizations;
pub mod subscriptions;
pub mod system;
pub mod types;
pub mod users;

use crate::api::error::{ApiError, api_denied, api_field_error, api_store_error};
use crate::app::AppState;
use crate::auth::AccessContext;
use crate::model::{Organization, User};
use crate::store::StoreError;
use precedent_authz::{DenyReason, Role};
use uuid::Uuid;

/// Organization a new record is created in.
///
/// Platform administrators must name one; everyone else creates inside their
/// own firm.
pub(crate) async fn target_organization(
    state: &AppState,
    ctx: &AccessContext,
    requested: Option<Uuid>,
) -> Result<Organization, ApiError> {
    let own = ctx.user.organization_id;
    if ctx.actor.role != Role::PlatformAdmin {
        if let (Some(requested), Some(own)) = (requested, own) {
            if requested != own {
                return Err(api_denied(DenyReason::CrossTenant));
            }
        }
    }
    let id = requested
        .or(own)
        .ok_or_else(|| api_field_error("organization_id", "organization_id is required"))?;
    let organization = state.store.get_organization(id).await.map_err(|err| match err {
        StoreError::NotFound(_) => api_field_error("organization_id", "unknown organization"),
        other => api_store_error("organization", other),
    })?;
    if !organization.is_active {
        return Err(api_field_error("organization_id", "organization is inactive"));
    }
    Ok(organization)
}

/// Load a user referenced by `field` and check it is an active member of
/// `organization_id`.
pub(crate) async fn member_of(
    state: &AppState,
    user_id: Uuid,
    organization_id: Uuid,
    field: &str,
) -> Result<User, ApiError> {
    let user = state.store.get_user(user_id).await.map_err(|err| match err {
        StoreError::NotFound(_) => api_field_error(field, "unknown user"),
        other => api_store_error("user", other),
    })?;
    if user.organization_id != Some(organization_id) {
        return Err(api_field_error(field, "user belongs to another organization"));
    }
    if !user.is_active {
        return Err(api_field_error(field, "user is inactive"));
    }
    Ok(user)
}

/// Default owner for records created by the caller; platform accounts own
/// nothing inside a firm.
pub(crate) fn default_owner(ctx: &AccessContext) -> Option<Uuid> {
    (ctx.actor.role != Role::PlatformAdmin).then_some(ctx.user.id)
}
