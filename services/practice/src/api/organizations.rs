//! Organization API handlers.
//!
//! # Purpose
//! Firms are created and retired by platform administrators; every member
//! can read their own firm.
use crate::api::error::{ApiError, api_store_error, api_validation_error};
use crate::api::types::OrganizationListResponse;
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{Organization, OrganizationCreateRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use precedent_authz::{Action, ResourceKind};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/organizations",
    tag = "organizations",
    responses(
        (status = 200, description = "Organizations visible to the caller", body = OrganizationListResponse)
    )
)]
pub(crate) async fn list_organizations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OrganizationListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Organization)?;
    let items = state
        .store
        .list_organizations(&ctx.scope(ResourceKind::Organization))
        .await
        .map_err(|err| api_store_error("organizations", err))?;
    Ok(Json(OrganizationListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/organizations",
    tag = "organizations",
    request_body = OrganizationCreateRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OrganizationCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Organization)?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(api_validation_error("name is required"));
    }
    let organization = state
        .store
        .create_organization(Organization::new(name))
        .await
        .map_err(|err| api_store_error("organization", err))?;
    tracing::info!(organization_id = %organization.id, "organization created");
    Ok((StatusCode::CREATED, Json(organization)))
}

#[utoipa::path(
    get,
    path = "/v1/organizations/{organization_id}",
    tag = "organizations",
    params(("organization_id" = Uuid, Path, description = "Organization identifier")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 404, description = "Organization not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_organization(
    Path(organization_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Organization>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let organization = state
        .store
        .get_organization(organization_id)
        .await
        .map_err(|err| api_store_error("organization", err))?;
    ctx.require_record(Action::View, &organization, "organization")?;
    Ok(Json(organization))
}

#[utoipa::path(
    delete,
    path = "/v1/organizations/{organization_id}",
    tag = "organizations",
    params(("organization_id" = Uuid, Path, description = "Organization identifier")),
    responses(
        (status = 204, description = "Organization deactivated"),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_organization(
    Path(organization_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let organization = state
        .store
        .get_organization(organization_id)
        .await
        .map_err(|err| api_store_error("organization", err))?;
    ctx.require_record(Action::Delete, &organization, "organization")?;
    state
        .store
        .deactivate_organization(organization_id)
        .await
        .map_err(|err| api_store_error("organization", err))?;
    tracing::info!(%organization_id, "organization deactivated");
    Ok(StatusCode::NO_CONTENT)
}
