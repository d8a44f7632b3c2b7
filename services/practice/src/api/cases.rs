//! Case API handlers.
//!
//! # Purpose
//! Listings are narrowed by the caller's scope before the status filter;
//! single-case operations go through the evaluator with the lead
//! practitioner as owner.
use crate::api::error::{ApiError, api_field_error, api_store_error};
use crate::api::types::{CaseListQuery, CaseListResponse};
use crate::api::{default_owner, member_of, target_organization};
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{Case, CaseCreateRequest, CasePatchRequest};
use crate::store::CaseFilter;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use precedent_authz::{Action, OwnedRecord, ResourceKind};
use uuid::Uuid;

async fn load_case(state: &AppState, case_id: Uuid) -> Result<Case, ApiError> {
    state
        .store
        .get_case(case_id)
        .await
        .map_err(|err| api_store_error("case", err))
}

#[utoipa::path(
    get,
    path = "/v1/cases",
    tag = "cases",
    params(CaseListQuery),
    responses(
        (status = 200, description = "Cases visible to the caller", body = CaseListResponse)
    )
)]
pub(crate) async fn list_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<CaseListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Case)?;
    let items = state
        .store
        .list_cases(
            &ctx.scope(ResourceKind::Case),
            CaseFilter {
                status: query.status,
            },
        )
        .await
        .map_err(|err| api_store_error("cases", err))?;
    Ok(Json(CaseListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/cases",
    tag = "cases",
    request_body = CaseCreateRequest,
    responses(
        (status = 201, description = "Case created", body = Case),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller may not create this case", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CaseCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Case)?;
    let caption = body.caption.trim();
    if caption.is_empty() {
        return Err(api_field_error("caption", "caption is required"));
    }
    let organization = target_organization(&state, &ctx, body.organization_id).await?;
    let lead_practitioner_id = body.lead_practitioner_id.or_else(|| default_owner(&ctx));
    if let Some(lead) = lead_practitioner_id {
        member_of(&state, lead, organization.id, "lead_practitioner_id").await?;
    }

    let now = Utc::now();
    let case = Case {
        id: Uuid::new_v4(),
        organization_id: organization.id,
        caption: caption.to_string(),
        case_number: body.case_number,
        status: body.status.unwrap_or_default(),
        lead_practitioner_id,
        created_at: now,
        updated_at: now,
    };
    ctx.require(Action::Create, &case.record_ref())?;
    let case = state
        .store
        .create_case(case)
        .await
        .map_err(|err| api_store_error("case", err))?;
    Ok((StatusCode::CREATED, Json(case)))
}

#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}",
    tag = "cases",
    params(("case_id" = Uuid, Path, description = "Case identifier")),
    responses(
        (status = 200, description = "Case", body = Case),
        (status = 404, description = "Case not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_case(
    Path(case_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Case>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let case = load_case(&state, case_id).await?;
    ctx.require_record(Action::View, &case, "case")?;
    Ok(Json(case))
}

#[utoipa::path(
    patch,
    path = "/v1/cases/{case_id}",
    tag = "cases",
    params(("case_id" = Uuid, Path, description = "Case identifier")),
    request_body = CasePatchRequest,
    responses(
        (status = 200, description = "Case updated", body = Case),
        (status = 404, description = "Case not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_case(
    Path(case_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CasePatchRequest>,
) -> Result<Json<Case>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let mut case = load_case(&state, case_id).await?;
    ctx.require_record(Action::Update, &case, "case")?;

    if let Some(caption) = body.caption {
        let caption = caption.trim();
        if caption.is_empty() {
            return Err(api_field_error("caption", "caption is required"));
        }
        case.caption = caption.to_string();
    }
    if let Some(case_number) = body.case_number {
        case.case_number = Some(case_number);
    }
    if let Some(status) = body.status {
        case.status = status;
    }
    if let Some(lead) = body.lead_practitioner_id {
        member_of(&state, lead, case.organization_id, "lead_practitioner_id").await?;
        case.lead_practitioner_id = Some(lead);
        // Handing a case to someone the caller cannot see is refused.
        ctx.require(Action::Update, &case.record_ref())?;
    }

    let case = state
        .store
        .update_case(case)
        .await
        .map_err(|err| api_store_error("case", err))?;
    Ok(Json(case))
}

#[utoipa::path(
    delete,
    path = "/v1/cases/{case_id}",
    tag = "cases",
    params(("case_id" = Uuid, Path, description = "Case identifier")),
    responses(
        (status = 204, description = "Case and its deadlines deleted"),
        (status = 404, description = "Case not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_case(
    Path(case_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let case = load_case(&state, case_id).await?;
    ctx.require_record(Action::Delete, &case, "case")?;
    state
        .store
        .delete_case(case_id)
        .await
        .map_err(|err| api_store_error("case", err))?;
    tracing::info!(%case_id, deleted_by = %ctx.user.id, "case deleted");
    Ok(StatusCode::NO_CONTENT)
}
