//! Contact API handlers. Contacts are owned by whoever created them.
use crate::api::error::{ApiError, api_field_error, api_store_error};
use crate::api::target_organization;
use crate::api::types::ContactListResponse;
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{Contact, ContactCreateRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use precedent_authz::{Action, OwnedRecord, ResourceKind};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/contacts",
    tag = "contacts",
    responses(
        (status = 200, description = "Contacts visible to the caller", body = ContactListResponse)
    )
)]
pub(crate) async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ContactListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Contact)?;
    let items = state
        .store
        .list_contacts(&ctx.scope(ResourceKind::Contact))
        .await
        .map_err(|err| api_store_error("contacts", err))?;
    Ok(Json(ContactListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/contacts",
    tag = "contacts",
    request_body = ContactCreateRequest,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ContactCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Contact)?;
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(api_field_error("display_name", "display_name is required"));
    }
    if let Some(email) = body.email.as_deref() {
        if !email.contains('@') {
            return Err(api_field_error("email", "a valid email is required"));
        }
    }
    let organization = target_organization(&state, &ctx, body.organization_id).await?;
    let now = Utc::now();
    let contact = Contact {
        id: Uuid::new_v4(),
        organization_id: organization.id,
        kind: body.kind,
        display_name: display_name.to_string(),
        email: body.email,
        phone: body.phone,
        created_by: Some(ctx.user.id),
        created_at: now,
        updated_at: now,
    };
    ctx.require(Action::Create, &contact.record_ref())?;
    let contact = state
        .store
        .create_contact(contact)
        .await
        .map_err(|err| api_store_error("contact", err))?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[utoipa::path(
    get,
    path = "/v1/contacts/{contact_id}",
    tag = "contacts",
    params(("contact_id" = Uuid, Path, description = "Contact identifier")),
    responses(
        (status = 200, description = "Contact", body = Contact),
        (status = 404, description = "Contact not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_contact(
    Path(contact_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Contact>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let contact = state
        .store
        .get_contact(contact_id)
        .await
        .map_err(|err| api_store_error("contact", err))?;
    ctx.require_record(Action::View, &contact, "contact")?;
    Ok(Json(contact))
}
