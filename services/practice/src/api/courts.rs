//! Court reference data handlers.
//!
//! # Purpose
//! Courts, judges, and court holiday calendars are shared by every firm.
//! Any active member reads them; only platform administrators change them.
use crate::api::error::{ApiError, api_conflict, api_field_error, api_store_error};
use crate::api::types::{
    CourtListResponse, HolidayCalendarListResponse, JudgeListQuery, JudgeListResponse,
};
use crate::app::AppState;
use crate::auth::authenticate;
use crate::model::{
    Court, CourtCreateRequest, Holiday, HolidayCalendar, HolidayCalendarCreateRequest, Judge,
    JudgeCreateRequest,
};
use crate::store::StoreError;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use precedent_authz::{Action, ResourceKind};
use uuid::Uuid;

const DEFAULT_TIMEZONE: &str = "America/New_York";

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(api_field_error(field, &format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn timezone_or_default(value: &str) -> String {
    match value.trim() {
        "" => DEFAULT_TIMEZONE.to_string(),
        zone => zone.to_string(),
    }
}

/// Map a missing referenced record to a validation error on `field`.
fn unknown_reference(what: &str, field: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_field_error(field, &format!("unknown {what}")),
        other => api_store_error(what, other),
    }
}

#[utoipa::path(
    get,
    path = "/v1/courts",
    tag = "courts",
    responses(
        (status = 200, description = "All courts", body = CourtListResponse)
    )
)]
pub(crate) async fn list_courts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CourtListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Court)?;
    let items = state
        .store
        .list_courts(&ctx.scope(ResourceKind::Court))
        .await
        .map_err(|err| api_store_error("courts", err))?;
    Ok(Json(CourtListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/courts",
    tag = "courts",
    request_body = CourtCreateRequest,
    responses(
        (status = 201, description = "Court created", body = Court),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_court(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CourtCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Court)?;
    let now = Utc::now();
    let court = Court {
        id: Uuid::new_v4(),
        name: required("name", &body.name)?,
        district: body.district,
        division: body.division,
        location: body.location,
        timezone: timezone_or_default(&body.timezone),
        website_url: body.website_url,
        created_at: now,
        updated_at: now,
    };
    let court = state
        .store
        .create_court(court)
        .await
        .map_err(|err| api_store_error("court", err))?;
    tracing::info!(court_id = %court.id, "court created");
    Ok((StatusCode::CREATED, Json(court)))
}

#[utoipa::path(
    get,
    path = "/v1/courts/{court_id}",
    tag = "courts",
    params(("court_id" = Uuid, Path, description = "Court identifier")),
    responses(
        (status = 200, description = "Court", body = Court),
        (status = 404, description = "Court not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_court(
    Path(court_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Court>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let court = state
        .store
        .get_court(court_id)
        .await
        .map_err(|err| api_store_error("court", err))?;
    ctx.require_record(Action::View, &court, "court")?;
    Ok(Json(court))
}

/// Judges of a removed court stay on file without a court.
#[utoipa::path(
    delete,
    path = "/v1/courts/{court_id}",
    tag = "courts",
    params(("court_id" = Uuid, Path, description = "Court identifier")),
    responses(
        (status = 204, description = "Court removed"),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Court not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_court(
    Path(court_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let court = state
        .store
        .get_court(court_id)
        .await
        .map_err(|err| api_store_error("court", err))?;
    ctx.require_record(Action::Delete, &court, "court")?;
    state
        .store
        .delete_court(court_id)
        .await
        .map_err(|err| api_store_error("court", err))?;
    tracing::info!(%court_id, "court removed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/judges",
    tag = "courts",
    params(JudgeListQuery),
    responses(
        (status = 200, description = "Judges, optionally of one court", body = JudgeListResponse)
    )
)]
pub(crate) async fn list_judges(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<JudgeListQuery>,
) -> Result<Json<JudgeListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::Judge)?;
    let items = state
        .store
        .list_judges(&ctx.scope(ResourceKind::Judge), query.court_id)
        .await
        .map_err(|err| api_store_error("judges", err))?;
    Ok(Json(JudgeListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/judges",
    tag = "courts",
    request_body = JudgeCreateRequest,
    responses(
        (status = 201, description = "Judge created", body = Judge),
        (status = 400, description = "Invalid payload or unknown court", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_judge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<JudgeCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::Judge)?;
    if let Some(court_id) = body.court_id {
        state
            .store
            .get_court(court_id)
            .await
            .map_err(|err| unknown_reference("court", "court_id", err))?;
    }
    if let Some(calendar_id) = body.holiday_calendar_id {
        state
            .store
            .get_holiday_calendar(calendar_id)
            .await
            .map_err(|err| unknown_reference("holiday calendar", "holiday_calendar_id", err))?;
    }
    let now = Utc::now();
    let judge = Judge {
        id: Uuid::new_v4(),
        full_name: required("full_name", &body.full_name)?,
        court_id: body.court_id,
        courtroom: body.courtroom,
        chambers_url: body.chambers_url,
        contact_email: body.contact_email,
        contact_phone: body.contact_phone,
        holiday_calendar_id: body.holiday_calendar_id,
        created_at: now,
        updated_at: now,
    };
    let judge = state
        .store
        .create_judge(judge)
        .await
        .map_err(|err| unknown_reference("court", "court_id", err))?;
    tracing::info!(judge_id = %judge.id, court_id = ?judge.court_id, "judge created");
    Ok((StatusCode::CREATED, Json(judge)))
}

#[utoipa::path(
    get,
    path = "/v1/judges/{judge_id}",
    tag = "courts",
    params(("judge_id" = Uuid, Path, description = "Judge identifier")),
    responses(
        (status = 200, description = "Judge", body = Judge),
        (status = 404, description = "Judge not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_judge(
    Path(judge_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Judge>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let judge = state
        .store
        .get_judge(judge_id)
        .await
        .map_err(|err| api_store_error("judge", err))?;
    ctx.require_record(Action::View, &judge, "judge")?;
    Ok(Json(judge))
}

#[utoipa::path(
    delete,
    path = "/v1/judges/{judge_id}",
    tag = "courts",
    params(("judge_id" = Uuid, Path, description = "Judge identifier")),
    responses(
        (status = 204, description = "Judge removed"),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Judge not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_judge(
    Path(judge_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let judge = state
        .store
        .get_judge(judge_id)
        .await
        .map_err(|err| api_store_error("judge", err))?;
    ctx.require_record(Action::Delete, &judge, "judge")?;
    state
        .store
        .delete_judge(judge_id)
        .await
        .map_err(|err| api_store_error("judge", err))?;
    tracing::info!(%judge_id, "judge removed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/holiday-calendars",
    tag = "courts",
    responses(
        (status = 200, description = "Court holiday calendars", body = HolidayCalendarListResponse)
    )
)]
pub(crate) async fn list_holiday_calendars(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HolidayCalendarListResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::View, ResourceKind::HolidayCalendar)?;
    let items = state
        .store
        .list_holiday_calendars(&ctx.scope(ResourceKind::HolidayCalendar))
        .await
        .map_err(|err| api_store_error("holiday calendars", err))?;
    Ok(Json(HolidayCalendarListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/holiday-calendars",
    tag = "courts",
    request_body = HolidayCalendarCreateRequest,
    responses(
        (status = 201, description = "Calendar created", body = HolidayCalendar),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_holiday_calendar(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<HolidayCalendarCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    ctx.require(Action::Create, ResourceKind::HolidayCalendar)?;
    let now = Utc::now();
    let calendar = HolidayCalendar {
        id: Uuid::new_v4(),
        name: required("name", &body.name)?,
        jurisdiction: body.jurisdiction,
        timezone: timezone_or_default(&body.timezone),
        source_url: body.source_url,
        holidays: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    let calendar = state
        .store
        .create_holiday_calendar(calendar)
        .await
        .map_err(|err| api_store_error("holiday calendar", err))?;
    tracing::info!(calendar_id = %calendar.id, "holiday calendar created");
    Ok((StatusCode::CREATED, Json(calendar)))
}

#[utoipa::path(
    get,
    path = "/v1/holiday-calendars/{calendar_id}",
    tag = "courts",
    params(("calendar_id" = Uuid, Path, description = "Calendar identifier")),
    responses(
        (status = 200, description = "Calendar with its holidays", body = HolidayCalendar),
        (status = 404, description = "Calendar not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_holiday_calendar(
    Path(calendar_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HolidayCalendar>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let calendar = state
        .store
        .get_holiday_calendar(calendar_id)
        .await
        .map_err(|err| api_store_error("holiday calendar", err))?;
    ctx.require_record(Action::View, &calendar, "holiday calendar")?;
    Ok(Json(calendar))
}

#[utoipa::path(
    post,
    path = "/v1/holiday-calendars/{calendar_id}/holidays",
    tag = "courts",
    params(("calendar_id" = Uuid, Path, description = "Calendar identifier")),
    request_body = Holiday,
    responses(
        (status = 200, description = "Calendar with the new holiday", body = HolidayCalendar),
        (status = 403, description = "Caller is not a platform administrator", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Calendar not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "A holiday already falls on this date", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn add_holiday(
    Path(calendar_id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Holiday>,
) -> Result<Json<HolidayCalendar>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    let calendar = state
        .store
        .get_holiday_calendar(calendar_id)
        .await
        .map_err(|err| api_store_error("holiday calendar", err))?;
    ctx.require_record(Action::Update, &calendar, "holiday calendar")?;
    let holiday = Holiday {
        date: body.date,
        name: required("name", &body.name)?,
    };
    let calendar = state
        .store
        .add_holiday(calendar_id, holiday)
        .await
        .map_err(|err| match err {
            StoreError::Conflict(message) => api_conflict("duplicate_holiday", &message),
            other => api_store_error("holiday calendar", other),
        })?;
    tracing::info!(%calendar_id, date = %body.date, "holiday added");
    Ok(Json(calendar))
}
