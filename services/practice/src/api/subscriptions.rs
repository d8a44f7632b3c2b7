//! Subscription API handlers.
//!
//! # Purpose
//! Platform administrators manage each firm's license; tenant administrators
//! can read their own firm's subscription. Subscriptions have no owning
//! member, so practitioners never see them.
use crate::api::error::{ApiError, api_field_error, api_store_error};
use crate::api::types::SubscriptionListResponse;
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{Subscription, SubscriptionUpsertRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use precedent_authz::{Action, OwnedRecord, ResourceKind};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscriptions visible to the caller", body = SubscriptionListResponse)
    )
)]
pub(crate) async fn list_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SubscriptionListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Subscription)?;
    let items = state
        .store
        .list_subscriptions(&ctx.scope(ResourceKind::Subscription))
        .await
        .map_err(|err| api_store_error("subscriptions", err))?;
    Ok(Json(SubscriptionListResponse { items }))
}

#[utoipa::path(
    put,
    path = "/v1/organizations/{organization_id}/subscription",
    tag = "subscriptions",
    params(("organization_id" = Uuid, Path, description = "Organization identifier")),
    request_body = SubscriptionUpsertRequest,
    responses(
        (status = 200, description = "Subscription stored", body = Subscription),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn upsert_subscription(
    Path(organization_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SubscriptionUpsertRequest>,
) -> Result<Json<Subscription>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let organization = state
        .store
        .get_organization(organization_id)
        .await
        .map_err(|err| api_store_error("organization", err))?;
    ctx.require_record(Action::View, &organization, "organization")?;

    if body.licensed_users < 0 {
        return Err(api_field_error("licensed_users", "licensed_users must not be negative"));
    }
    if let Some(end) = body.contract_end_date {
        if end < body.contract_start_date {
            return Err(api_field_error(
                "contract_end_date",
                "contract_end_date must not precede contract_start_date",
            ));
        }
    }

    let existing = state
        .store
        .subscription_for(organization_id)
        .await
        .map_err(|err| api_store_error("subscription", err))?;
    let now = Utc::now();
    let subscription = Subscription {
        id: existing.as_ref().map(|s| s.id).unwrap_or_else(Uuid::new_v4),
        organization_id,
        licensed_users: body.licensed_users,
        status: body.status.unwrap_or_default(),
        contract_start_date: body.contract_start_date,
        contract_end_date: body.contract_end_date,
        created_at: existing.as_ref().map(|s| s.created_at).unwrap_or(now),
        updated_at: now,
    };
    let action = if existing.is_some() {
        Action::Update
    } else {
        Action::Create
    };
    ctx.require(action, &subscription.record_ref())?;
    let subscription = state
        .store
        .upsert_subscription(subscription)
        .await
        .map_err(|err| api_store_error("subscription", err))?;
    tracing::info!(
        %organization_id,
        licensed_users = subscription.licensed_users,
        "subscription stored"
    );
    Ok(Json(subscription))
}
