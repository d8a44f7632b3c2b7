//! Practice HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::notify::GrantNotifier;
use crate::observability;
use crate::store::PracticeStore;
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub store: Arc<dyn PracticeStore>,
    pub notifier: Arc<dyn GrantNotifier>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/v1/system/health", get(api::system::system_health))
        .route("/v1/openapi.json", get(api::system::openapi_json))
        .route("/v1/me", get(api::me::me))
        .route(
            "/v1/organizations",
            get(api::organizations::list_organizations)
                .post(api::organizations::create_organization),
        )
        .route(
            "/v1/organizations/:organization_id",
            get(api::organizations::get_organization)
                .delete(api::organizations::delete_organization),
        )
        .route(
            "/v1/organizations/:organization_id/subscription",
            put(api::subscriptions::upsert_subscription),
        )
        .route(
            "/v1/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/v1/users/:user_id",
            get(api::users::get_user)
                .patch(api::users::patch_user)
                .delete(api::users::delete_user),
        )
        .route(
            "/v1/users/:user_id/tokens",
            post(api::users::issue_user_token),
        )
        .route(
            "/v1/access-grants",
            get(api::grants::list_grants).post(api::grants::create_grant),
        )
        .route(
            "/v1/access-grants/:grant_id",
            axum::routing::delete(api::grants::revoke_grant),
        )
        .route(
            "/v1/access-grants/granted-by/:user_id",
            get(api::grants::list_granted_by),
        )
        .route(
            "/v1/access-grants/for-user/:user_id",
            get(api::grants::list_received_by),
        )
        .route(
            "/v1/cases",
            get(api::cases::list_cases).post(api::cases::create_case),
        )
        .route(
            "/v1/cases/:case_id",
            get(api::cases::get_case)
                .patch(api::cases::patch_case)
                .delete(api::cases::delete_case),
        )
        .route(
            "/v1/deadlines",
            get(api::deadlines::list_deadlines).post(api::deadlines::create_deadline),
        )
        .route(
            "/v1/deadlines/:deadline_id",
            get(api::deadlines::get_deadline).patch(api::deadlines::patch_deadline),
        )
        .route(
            "/v1/contacts",
            get(api::contacts::list_contacts).post(api::contacts::create_contact),
        )
        .route("/v1/contacts/:contact_id", get(api::contacts::get_contact))
        .route(
            "/v1/subscriptions",
            get(api::subscriptions::list_subscriptions),
        )
        .route(
            "/v1/courts",
            get(api::courts::list_courts).post(api::courts::create_court),
        )
        .route(
            "/v1/courts/:court_id",
            get(api::courts::get_court).delete(api::courts::delete_court),
        )
        .route(
            "/v1/judges",
            get(api::courts::list_judges).post(api::courts::create_judge),
        )
        .route(
            "/v1/judges/:judge_id",
            get(api::courts::get_judge).delete(api::courts::delete_judge),
        )
        .route(
            "/v1/holiday-calendars",
            get(api::courts::list_holiday_calendars).post(api::courts::create_holiday_calendar),
        )
        .route(
            "/v1/holiday-calendars/:calendar_id",
            get(api::courts::get_holiday_calendar),
        )
        .route(
            "/v1/holiday-calendars/:calendar_id/holidays",
            post(api::courts::add_holiday),
        )
        .route("/v1/audit-events", get(api::audit::list_audit_events))
        .layer(trace_layer)
        .with_state(state)
}
