//! Access-grant API handlers.
//!
//! # Purpose
//! Administrators let one member see another member's records. Creation
//! validates the grant against the role hierarchy and tenant boundary,
//! persists it under the store's active-pair uniqueness, then notifies the
//! grantee in the background. Revocation is soft and idempotent. Listings
//! return active grants unless `include_inactive` is set.
//!
//! # Key invariants
//! - A party outside the caller's tenant is reported as an unknown user,
//!   so grant creation does not disclose accounts of other firms.
//! - Creating and revoking a grant both append an audit event.
use crate::api::error::{
    ApiError, api_field_error, api_grant_error, api_not_found, api_store_error,
};
use crate::api::audit;
use crate::api::types::{GrantListQuery, GrantListResponse};
use crate::app::AppState;
use crate::auth::{AccessContext, authenticate};
use crate::model::{AccessGrant, AuditAction, AuditEvent, GrantCreateRequest, User};
use crate::notify::dispatch_grant_created;
use crate::observability::{GRANTS_CREATED_TOTAL, GRANTS_REVOKED_TOTAL};
use crate::store::{GrantFilter, StoreError};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use precedent_authz::{
    Action, OwnedRecord, RecordRef, ResourceKind, Role, same_tenant, validate_grant,
};
use uuid::Uuid;

pub(crate) const GRANTS_TABLE: &str = "access_grants";

/// Load a grant party; accounts outside the caller's tenant read as unknown.
async fn grant_party(
    state: &AppState,
    ctx: &AccessContext,
    user_id: Uuid,
    field: &str,
) -> Result<User, ApiError> {
    let user = state.store.get_user(user_id).await.map_err(|err| match err {
        StoreError::NotFound(_) => api_field_error(field, "unknown user"),
        other => api_store_error("user", other),
    })?;
    if !same_tenant(&ctx.actor, &user.record_ref()) {
        return Err(api_field_error(field, "unknown user"));
    }
    Ok(user)
}

/// Keep only grants in organizations the caller administers.
fn visible_grants(ctx: &AccessContext, grants: Vec<AccessGrant>) -> Vec<AccessGrant> {
    grants
        .into_iter()
        .filter(|grant| {
            same_tenant(
                &ctx.actor,
                &RecordRef::organization(grant.organization_id.into()),
            )
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/v1/access-grants",
    tag = "access-grants",
    params(GrantListQuery),
    responses(
        (status = 200, description = "Grants in the caller's organization", body = GrantListResponse),
        (status = 403, description = "Caller is not an administrator", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_grants(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GrantListQuery>,
) -> Result<Json<GrantListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::ManageGrants, ResourceKind::User)?;
    let organization_id = match ctx.actor.role {
        Role::PlatformAdmin => None,
        _ => ctx.user.organization_id,
    };
    let items = state
        .store
        .list_grants(GrantFilter {
            organization_id,
            include_inactive: query.include_inactive,
            ..GrantFilter::default()
        })
        .await
        .map_err(|err| api_store_error("access grants", err))?;
    Ok(Json(GrantListResponse {
        items: visible_grants(&ctx, items),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/access-grants",
    tag = "access-grants",
    request_body = GrantCreateRequest,
    responses(
        (status = 201, description = "Grant created", body = AccessGrant),
        (status = 400, description = "Grant rejected by validation", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Active grant already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_grant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GrantCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::ManageGrants, ResourceKind::User)?;
    let grantee = grant_party(&state, &ctx, body.granted_to, "granted_to").await?;
    let target = grant_party(&state, &ctx, body.can_access_user, "can_access_user").await?;

    let organization_id = validate_grant(&ctx.actor, &grantee.actor(), &target.actor())
        .map_err(|err| api_grant_error(&err))?;
    ctx.require(Action::ManageGrants, &target.record_ref())?;

    let grant = AccessGrant::new(
        organization_id.as_uuid(),
        ctx.user.id,
        grantee.id,
        target.id,
    );
    let grant = state
        .store
        .create_grant(grant)
        .await
        .map_err(|err| api_store_error("access grant", err))?;
    metrics::counter!(GRANTS_CREATED_TOTAL).increment(1);
    tracing::info!(
        grant_id = %grant.id,
        granted_by = %grant.granted_by,
        granted_to = %grant.granted_to,
        can_access_user = %grant.can_access_user,
        "access grant created"
    );
    audit::record(
        &state,
        AuditEvent::new(
            &ctx.user,
            Some(grant.organization_id),
            GRANTS_TABLE,
            grant.id,
            AuditAction::Create,
        )
        .after(&grant),
    )
    .await?;
    dispatch_grant_created(state.notifier.clone(), grant.clone(), grantee, target);
    Ok((StatusCode::CREATED, Json(grant)))
}

#[utoipa::path(
    delete,
    path = "/v1/access-grants/{grant_id}",
    tag = "access-grants",
    params(("grant_id" = Uuid, Path, description = "Grant identifier")),
    responses(
        (status = 200, description = "Grant revoked (or already inactive)", body = AccessGrant),
        (status = 403, description = "Caller is not an administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Grant not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn revoke_grant(
    Path(grant_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessGrant>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::ManageGrants, ResourceKind::User)?;
    let existing = state
        .store
        .get_grant(grant_id)
        .await
        .map_err(|err| api_store_error("access grant", err))?;
    if visible_grants(&ctx, vec![existing.clone()]).is_empty() {
        return Err(api_not_found("access grant not found"));
    }
    let revoked = state
        .store
        .revoke_grant(grant_id)
        .await
        .map_err(|err| api_store_error("access grant", err))?;
    if existing.is_active {
        metrics::counter!(GRANTS_REVOKED_TOTAL).increment(1);
        tracing::info!(%grant_id, revoked_by = %ctx.user.id, "access grant revoked");
        audit::record(
            &state,
            AuditEvent::new(
                &ctx.user,
                Some(revoked.organization_id),
                GRANTS_TABLE,
                revoked.id,
                AuditAction::Update,
            )
            .before(&existing)
            .after(&revoked),
        )
        .await?;
    }
    Ok(Json(revoked))
}

#[utoipa::path(
    get,
    path = "/v1/access-grants/granted-by/{user_id}",
    tag = "access-grants",
    params(
        ("user_id" = Uuid, Path, description = "Granting administrator"),
        GrantListQuery
    ),
    responses(
        (status = 200, description = "Grants issued by the user", body = GrantListResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_granted_by(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GrantListQuery>,
) -> Result<Json<GrantListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::ManageGrants, ResourceKind::User)?;
    let granter = state
        .store
        .get_user(user_id)
        .await
        .map_err(|err| api_store_error("user", err))?;
    ctx.require_record(Action::View, &granter, "user")?;
    let items = state
        .store
        .list_grants(GrantFilter {
            include_inactive: query.include_inactive,
            ..GrantFilter::issued_by(granter.id)
        })
        .await
        .map_err(|err| api_store_error("access grants", err))?;
    Ok(Json(GrantListResponse {
        items: visible_grants(&ctx, items),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/access-grants/for-user/{user_id}",
    tag = "access-grants",
    params(
        ("user_id" = Uuid, Path, description = "Grantee"),
        GrantListQuery
    ),
    responses(
        (status = 200, description = "Grants received by the user", body = GrantListResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_received_by(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GrantListQuery>,
) -> Result<Json<GrantListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    if user_id != ctx.user.id {
        ctx.require(Action::ManageGrants, ResourceKind::User)?;
    }
    let grantee = state
        .store
        .get_user(user_id)
        .await
        .map_err(|err| api_store_error("user", err))?;
    ctx.require_record(Action::View, &grantee, "user")?;
    let items = state
        .store
        .list_grants(GrantFilter {
            include_inactive: query.include_inactive,
            ..GrantFilter::received_by(grantee.id)
        })
        .await
        .map_err(|err| api_store_error("access grants", err))?;
    Ok(Json(GrantListResponse {
        items: visible_grants(&ctx, items),
    }))
}
