//! HTTP API request/response types.
//!
//! # Purpose
//! Shared payload shapes for the practice REST API and OpenAPI schema
//! generation. Record payloads live in [`crate::model`].
use crate::model::{
    AccessGrant, AuditEvent, Case, CaseStatus, Contact, Court, Deadline, DeadlineStatus,
    HolidayCalendar, Judge, Organization, Subscription, User,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Offending request field for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Machine-readable deny or validation reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct MeResponse {
    pub user: User,
    /// Owners whose records the caller can see through ownership or grants.
    /// Administrators see more than this list.
    pub visible_user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrganizationListResponse {
    pub items: Vec<Organization>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserListResponse {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GrantListResponse {
    pub items: Vec<AccessGrant>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CaseListResponse {
    pub items: Vec<Case>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DeadlineListResponse {
    pub items: Vec<Deadline>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ContactListResponse {
    pub items: Vec<Contact>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SubscriptionListResponse {
    pub items: Vec<Subscription>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CourtListResponse {
    pub items: Vec<Court>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct JudgeListResponse {
    pub items: Vec<Judge>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HolidayCalendarListResponse {
    pub items: Vec<HolidayCalendar>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuditEventListResponse {
    /// Newest first.
    pub items: Vec<AuditEvent>,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct GrantListQuery {
    /// Also return revoked grants.
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct JudgeListQuery {
    pub court_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct AuditListQuery {
    pub entity_table: Option<String>,
    pub entity_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct DeadlineListQuery {
    pub case_id: Option<Uuid>,
    pub status: Option<DeadlineStatus>,
}
