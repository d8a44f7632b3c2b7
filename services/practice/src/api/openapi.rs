//! OpenAPI schema aggregation for the practice API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document served
//! at `/v1/openapi.json`.
use crate::api::{
    audit, cases, contacts, courts, deadlines, grants, me, organizations, subscriptions, system,
    types::{
        AuditEventListResponse, CaseListResponse, ContactListResponse, CourtListResponse,
        DeadlineListResponse, ErrorResponse, GrantListResponse, HealthStatus,
        HolidayCalendarListResponse, JudgeListResponse, MeResponse, OrganizationListResponse,
        SubscriptionListResponse, TokenResponse, UserListResponse,
    },
    users,
};
use crate::model::{
    AccessGrant, AuditAction, AuditEvent, Case, CaseCreateRequest, CasePatchRequest, CaseStatus,
    Contact, ContactCreateRequest, ContactKind, Court, CourtCreateRequest, Deadline,
    DeadlineCreateRequest, DeadlinePatchRequest, DeadlineStatus, GrantCreateRequest, Holiday,
    HolidayCalendar, HolidayCalendarCreateRequest, Judge, JudgeCreateRequest, Organization,
    OrganizationCreateRequest, Subscription, SubscriptionStatus, SubscriptionUpsertRequest, User,
    UserCreateRequest, UserPatchRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "precedent-practice",
        version = "v1",
        description = "Precedent practice-management HTTP API"
    ),
    paths(
        system::system_health,
        me::me,
        organizations::list_organizations,
        organizations::create_organization,
        organizations::get_organization,
        organizations::delete_organization,
        users::list_users,
        users::create_user,
        users::get_user,
        users::patch_user,
        users::delete_user,
        users::issue_user_token,
        grants::list_grants,
        grants::create_grant,
        grants::revoke_grant,
        grants::list_granted_by,
        grants::list_received_by,
        cases::list_cases,
        cases::create_case,
        cases::get_case,
        cases::patch_case,
        cases::delete_case,
        deadlines::list_deadlines,
        deadlines::create_deadline,
        deadlines::get_deadline,
        deadlines::patch_deadline,
        contacts::list_contacts,
        contacts::create_contact,
        contacts::get_contact,
        subscriptions::list_subscriptions,
        subscriptions::upsert_subscription,
        courts::list_courts,
        courts::create_court,
        courts::get_court,
        courts::delete_court,
        courts::list_judges,
        courts::create_judge,
        courts::get_judge,
        courts::delete_judge,
        courts::list_holiday_calendars,
        courts::create_holiday_calendar,
        courts::get_holiday_calendar,
        courts::add_holiday,
        audit::list_audit_events
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        MeResponse,
        TokenResponse,
        Organization,
        OrganizationCreateRequest,
        OrganizationListResponse,
        User,
        UserCreateRequest,
        UserPatchRequest,
        UserListResponse,
        AccessGrant,
        GrantCreateRequest,
        GrantListResponse,
        Case,
        CaseStatus,
        CaseCreateRequest,
        CasePatchRequest,
        CaseListResponse,
        Deadline,
        DeadlineStatus,
        DeadlineCreateRequest,
        DeadlinePatchRequest,
        DeadlineListResponse,
        Contact,
        ContactKind,
        ContactCreateRequest,
        ContactListResponse,
        Subscription,
        SubscriptionStatus,
        SubscriptionUpsertRequest,
        SubscriptionListResponse,
        Court,
        CourtCreateRequest,
        CourtListResponse,
        Judge,
        JudgeCreateRequest,
        JudgeListResponse,
        Holiday,
        HolidayCalendar,
        HolidayCalendarCreateRequest,
        HolidayCalendarListResponse,
        AuditAction,
        AuditEvent,
        AuditEventListResponse
    )),
    tags(
        (name = "system", description = "Health and discovery"),
        (name = "organizations", description = "Firms"),
        (name = "users", description = "Accounts and API tokens"),
        (name = "access-grants", description = "Delegated visibility between members"),
        (name = "cases", description = "Matters"),
        (name = "deadlines", description = "Case deadlines"),
        (name = "contacts", description = "Firm contacts"),
        (name = "subscriptions", description = "Firm licensing"),
        (name = "courts", description = "Courts, judges, and court holidays"),
        (name = "audit", description = "Audit trail of mutations")
    )
)]
pub struct ApiDoc;
