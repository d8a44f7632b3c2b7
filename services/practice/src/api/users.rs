//! User API handlers.
//!
//! # Purpose
//! Account management under the role hierarchy: administrators create and
//! retire accounts of strictly lower rank inside their firm, members edit
//! their own profile, and a subscription's seat count caps active accounts.
//!
//! # Key invariants
//! - A tenant administrator never creates, promotes to, or edits an
//!   administrator account other than its own.
//! - Accounts are deactivated, never removed.
//! - A role change revokes, in the same store operation, every active grant
//!   the new role no longer permits.
use crate::api::error::{
    ApiError, api_conflict, api_denied, api_field_error, api_store_error, api_validation_error,
};
use crate::api::audit;
use crate::api::grants::GRANTS_TABLE;
use crate::api::target_organization;
use crate::api::types::{TokenResponse, UserListResponse};
use crate::app::AppState;
use crate::auth::token::issue_token;
use crate::auth::{AccessContext, authenticate};
use crate::model::{AuditAction, AuditEvent, User, UserCreateRequest, UserPatchRequest};
use crate::observability::GRANTS_REVOKED_TOTAL;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use precedent_authz::{Action, DenyReason, OwnedRecord, ResourceKind, Role};
use uuid::Uuid;

/// Only a platform administrator may hand out a role it does not outrank.
fn ensure_can_assign(ctx: &AccessContext, role: Role) -> Result<(), ApiError> {
    if ctx.actor.role == Role::PlatformAdmin || ctx.actor.role.outranks(role) {
        return Ok(());
    }
    Err(api_denied(DenyReason::InsufficientRank))
}

async fn ensure_seat_available(state: &AppState, organization_id: Uuid) -> Result<(), ApiError> {
    let Some(subscription) = state
        .store
        .subscription_for(organization_id)
        .await
        .map_err(|err| api_store_error("subscription", err))?
    else {
        return Ok(());
    };
    let active = state
        .store
        .count_active_users(organization_id)
        .await
        .map_err(|err| api_store_error("users", err))?;
    if !subscription.can_add_user(active) {
        return Err(api_conflict(
            "license_limit",
            &format!(
                "organization has reached its limit of {} licensed users",
                subscription.licensed_users
            ),
        ));
    }
    Ok(())
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    state
        .store
        .get_user(user_id)
        .await
        .map_err(|err| api_store_error("user", err))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users visible to the caller", body = UserListResponse)
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::User)?;
    let items = state
        .store
        .list_users(&ctx.scope(ResourceKind::User))
        .await
        .map_err(|err| api_store_error("users", err))?;
    Ok(Json(UserListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Role does not permit this account", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Email taken or license limit reached", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::User)?;
    ensure_can_assign(&ctx, body.role)?;

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(api_field_error("email", "a valid email is required"));
    }
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(api_field_error("display_name", "display_name is required"));
    }

    let organization_id = if body.role == Role::PlatformAdmin {
        None
    } else {
        Some(target_organization(&state, &ctx, body.organization_id).await?.id)
    };
    if let Some(organization_id) = organization_id {
        ensure_seat_available(&state, organization_id).await?;
    }

    let user = User::new(
        email,
        display_name,
        organization_id,
        body.role,
        Some(ctx.user.id),
    );
    ctx.require(Action::Create, &user.record_ref())?;
    let user = state
        .store
        .create_user(user)
        .await
        .map_err(|err| api_store_error("user", err))?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_user(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let user = load_user(&state, user_id).await?;
    ctx.require_record(Action::View, &user, "user")?;
    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    request_body = UserPatchRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Change not permitted", body = crate::api::types::ErrorResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_user(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UserPatchRequest>,
) -> Result<Json<User>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let mut user = load_user(&state, user_id).await?;
    ctx.require_record(Action::Update, &user, "user")?;
    let admin = ctx.actor.role.is_admin();
    let before = user.clone();

    if let Some(role) = body.role.filter(|role| *role != user.role) {
        if !admin {
            return Err(api_denied(DenyReason::InsufficientRank));
        }
        if role == Role::PlatformAdmin || user.role == Role::PlatformAdmin {
            return Err(api_field_error("role", "platform accounts cannot change role"));
        }
        ensure_can_assign(&ctx, role)?;
        user.role = role;
    }

    if let Some(active) = body.is_active.filter(|active| *active != user.is_active) {
        if !admin {
            return Err(api_denied(DenyReason::InsufficientRank));
        }
        if !active && user.id == ctx.user.id {
            return Err(api_field_error("is_active", "cannot deactivate your own account"));
        }
        if let (true, Some(organization_id)) = (active, user.organization_id) {
            ensure_seat_available(&state, organization_id).await?;
        }
        user.is_active = active;
    }

    if let Some(display_name) = body.display_name {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(api_field_error("display_name", "display_name is required"));
        }
        user.display_name = display_name.to_string();
    }

    ctx.require(Action::Update, &user.record_ref())?;
    if user.role == before.role {
        let user = state
            .store
            .update_user(user)
            .await
            .map_err(|err| api_store_error("user", err))?;
        return Ok(Json(user));
    }

    let (user, revoked) = state
        .store
        .update_user_role(user)
        .await
        .map_err(|err| api_store_error("user", err))?;
    tracing::info!(
        %user_id,
        from = %before.role,
        to = %user.role,
        revoked_grants = revoked.len(),
        "user role changed"
    );
    audit::record(
        &state,
        AuditEvent::new(
            &ctx.user,
            user.organization_id,
            "users",
            user.id,
            AuditAction::Update,
        )
        .before(&before)
        .after(&user),
    )
    .await?;
    for grant in &revoked {
        metrics::counter!(GRANTS_REVOKED_TOTAL).increment(1);
        let mut was = grant.clone();
        was.is_active = true;
        audit::record(
            &state,
            AuditEvent::new(
                &ctx.user,
                Some(grant.organization_id),
                GRANTS_TABLE,
                grant.id,
                AuditAction::Update,
            )
            .before(&was)
            .after(grant),
        )
        .await?;
    }
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Caller may not deactivate this account", body = crate::api::types::ErrorResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_user(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let mut user = load_user(&state, user_id).await?;
    ctx.require_record(Action::Delete, &user, "user")?;
    if user.id == ctx.user.id {
        return Err(api_validation_error("cannot deactivate your own account"));
    }
    if user.is_active {
        user.is_active = false;
        state
            .store
            .update_user(user)
            .await
            .map_err(|err| api_store_error("user", err))?;
        tracing::info!(%user_id, "user deactivated");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/tokens",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 201, description = "Token issued; shown once", body = TokenResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn issue_user_token(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let user = load_user(&state, user_id).await?;
    ctx.require_record(Action::Update, &user, "user")?;
    if !user.is_active {
        return Err(api_validation_error("account is inactive"));
    }
    let token = issue_token(state.store.as_ref(), user.id)
        .await
        .map_err(|err| api_store_error("token", err))?;
    tracing::info!(%user_id, issued_by = %ctx.user.id, "api token issued");
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            user_id: user.id,
            token,
        }),
    ))
}
