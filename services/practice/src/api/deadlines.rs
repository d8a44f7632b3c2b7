//! Deadline API handlers.
//!
//! # Purpose
//! A deadline belongs to its case's organization and is owned by its
//! assignee. Creating one requires seeing the case and being allowed to
//! create a deadline for the chosen owner. Creates and edits are audited.
use crate::api::error::{ApiError, api_field_error, api_store_error};
use crate::api::audit;
use crate::api::types::{DeadlineListQuery, DeadlineListResponse};
use crate::api::{default_owner, member_of};
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{
    AuditAction, AuditEvent, Deadline, DeadlineCreateRequest, DeadlinePatchRequest,
    DeadlineStatus,
};
use crate::store::{DeadlineFilter, StoreError};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use precedent_authz::{Action, OwnedRecord, ResourceKind};
use uuid::Uuid;

const DEFAULT_PRIORITY: i16 = 3;
const DEADLINES_TABLE: &str = "deadlines";

fn check_priority(priority: i16) -> Result<i16, ApiError> {
    if (1..=5).contains(&priority) {
        Ok(priority)
    } else {
        Err(api_field_error("priority", "priority must be between 1 and 5"))
    }
}

async fn load_deadline(state: &AppState, deadline_id: Uuid) -> Result<Deadline, ApiError> {
    state
        .store
        .get_deadline(deadline_id)
        .await
        .map_err(|err| api_store_error("deadline", err))
}

#[utoipa::path(
    get,
    path = "/v1/deadlines",
    tag = "deadlines",
    params(DeadlineListQuery),
    responses(
        (status = 200, description = "Deadlines visible to the caller, soonest first", body = DeadlineListResponse)
    )
)]
pub(crate) async fn list_deadlines(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeadlineListQuery>,
) -> Result<Json<DeadlineListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Deadline)?;
    let items = state
        .store
        .list_deadlines(
            &ctx.scope(ResourceKind::Deadline),
            DeadlineFilter {
                case_id: query.case_id,
                status: query.status,
            },
        )
        .await
        .map_err(|err| api_store_error("deadlines", err))?;
    Ok(Json(DeadlineListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/deadlines",
    tag = "deadlines",
    request_body = DeadlineCreateRequest,
    responses(
        (status = 201, description = "Deadline created", body = Deadline),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Case not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DeadlineCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Deadline)?;
    let title = body.title.trim();
    if title.is_empty() {
        return Err(api_field_error("title", "title is required"));
    }
    let priority = check_priority(body.priority.unwrap_or(DEFAULT_PRIORITY))?;
    let case = state.store.get_case(body.case_id).await.map_err(|err| match err {
        StoreError::NotFound(_) => api_field_error("case_id", "unknown case"),
        other => api_store_error("case", other),
    })?;
    ctx.require_record(Action::View, &case, "case")?;

    let owner_id = body.owner_id.or_else(|| default_owner(&ctx));
    if let Some(owner) = owner_id {
        member_of(&state, owner, case.organization_id, "owner_id").await?;
    }

    let now = Utc::now();
    let deadline = Deadline {
        id: Uuid::new_v4(),
        case_id: case.id,
        organization_id: case.organization_id,
        title: title.to_string(),
        due_at: body.due_at,
        owner_id,
        status: DeadlineStatus::Open,
        priority,
        created_by: Some(ctx.user.id),
        created_at: now,
        updated_at: now,
    };
    ctx.require(Action::Create, &deadline.record_ref())?;
    let deadline = state
        .store
        .create_deadline(deadline)
        .await
        .map_err(|err| api_store_error("deadline", err))?;
    audit::record(
        &state,
        AuditEvent::new(
            &ctx.user,
            Some(deadline.organization_id),
            DEADLINES_TABLE,
            deadline.id,
            AuditAction::Create,
        )
        .after(&deadline),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(deadline)))
}

#[utoipa::path(
    get,
    path = "/v1/deadlines/{deadline_id}",
    tag = "deadlines",
    params(("deadline_id" = Uuid, Path, description = "Deadline identifier")),
    responses(
        (status = 200, description = "Deadline", body = Deadline),
        (status = 404, description = "Deadline not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_deadline(
    Path(deadline_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Deadline>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let deadline = load_deadline(&state, deadline_id).await?;
    ctx.require_record(Action::View, &deadline, "deadline")?;
    Ok(Json(deadline))
}

#[utoipa::path(
    patch,
    path = "/v1/deadlines/{deadline_id}",
    tag = "deadlines",
    params(("deadline_id" = Uuid, Path, description = "Deadline identifier")),
    request_body = DeadlinePatchRequest,
    responses(
        (status = 200, description = "Deadline updated", body = Deadline),
        (status = 404, description = "Deadline not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_deadline(
    Path(deadline_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DeadlinePatchRequest>,
) -> Result<Json<Deadline>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let mut deadline = load_deadline(&state, deadline_id).await?;
    ctx.require_record(Action::Update, &deadline, "deadline")?;
    let before = deadline.clone();

    if let Some(title) = body.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(api_field_error("title", "title is required"));
        }
        deadline.title = title.to_string();
    }
    if let Some(due_at) = body.due_at {
        deadline.due_at = due_at;
    }
    if let Some(status) = body.status {
        deadline.status = status;
    }
    if let Some(priority) = body.priority {
        deadline.priority = check_priority(priority)?;
    }
    if let Some(owner) = body.owner_id {
        member_of(&state, owner, deadline.organization_id, "owner_id").await?;
        deadline.owner_id = Some(owner);
        ctx.require(Action::Update, &deadline.record_ref())?;
    }

    let deadline = state
        .store
        .update_deadline(deadline)
        .await
        .map_err(|err| api_store_error("deadline", err))?;
    audit::record(
        &state,
        AuditEvent::new(
            &ctx.user,
            Some(deadline.organization_id),
            DEADLINES_TABLE,
            deadline.id,
            AuditAction::Update,
        )
        .before(&before)
        .after(&deadline),
    )
    .await?;
    Ok(Json(deadline))
}
