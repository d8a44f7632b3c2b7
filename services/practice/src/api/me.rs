use crate::api::error::ApiError;
use crate::api::types::MeResponse;
use crate::app::AppState;
use crate::auth::authenticate;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use precedent_authz::GrantLookup;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "users",
    responses(
        (status = 200, description = "Caller and the owners it can see", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let visible_user_ids: Vec<Uuid> = ctx
        .grants
        .visible_to(ctx.actor.id)
        .into_iter()
        .map(|id| id.as_uuid())
        .collect();
    Ok(Json(MeResponse {
        user: ctx.user,
        visible_user_ids,
    }))
}
