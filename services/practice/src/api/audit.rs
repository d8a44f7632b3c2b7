//! Audit trail handlers.
//!
//! # Purpose
//! Grant changes, role changes, and deadline edits are appended to the
//! audit trail through [`record`]. Administrators read the trail of their
//! own firm; platform administrators read all of it.
//!
//! # Key invariants
//! - A mutation whose audit write fails is reported as failed.
//! - Events are never edited or removed.
use crate::api::error::{ApiError, api_store_error};
use crate::api::types::{AuditEventListResponse, AuditListQuery};
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::AuditEvent;
use crate::observability::AUDIT_EVENTS_TOTAL;
use crate::store::AuditFilter;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use precedent_authz::{Action, ResourceKind};

/// Append `event` to the audit trail.
pub(crate) async fn record(state: &AppState, event: AuditEvent) -> Result<AuditEvent, ApiError> {
    let event = state
        .store
        .record_audit_event(event)
        .await
        .map_err(|err| api_store_error("audit event", err))?;
    metrics::counter!(
        AUDIT_EVENTS_TOTAL,
        "entity" => event.entity_table.clone(),
        "action" => event.action.as_str()
    )
    .increment(1);
    tracing::info!(
        audit_id = %event.id,
        entity_table = %event.entity_table,
        entity_id = %event.entity_id,
        action = event.action.as_str(),
        actor = ?event.actor_user_id,
        "audit event recorded"
    );
    Ok(event)
}

#[utoipa::path(
    get,
    path = "/v1/audit-events",
    tag = "audit",
    params(AuditListQuery),
    responses(
        (status = 200, description = "Audit events visible to the caller, newest first", body = AuditEventListResponse)
    )
)]
pub(crate) async fn list_audit_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<AuditEventListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::AuditEvent)?;
    let filter = AuditFilter {
        entity_table: query.entity_table,
        entity_id: query.entity_id,
    };
    let items = state
        .store
        .list_audit_events(&ctx.scope(ResourceKind::AuditEvent), filter)
        .await
        .map_err(|err| api_store_error("audit events", err))?;
    Ok(Json(AuditEventListResponse { items }))
}
