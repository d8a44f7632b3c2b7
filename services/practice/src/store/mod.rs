//! Persistence for the practice service.
//!
//! # Purpose
//! Defines the [`PracticeStore`] trait the HTTP layer talks to and the error
//! type shared by both backends. List operations take a
//! [`precedent_authz::Scope`] so visibility filtering happens inside the
//! store (in memory, or pushed down into SQL) before caller filters apply.
//!
//! # Key invariants
//! - At most one active access grant exists per (grantee, target) pair; the
//!   backend enforces this atomically and reports
//!   [`GrantError::DuplicateGrant`].
//! - Users, organizations, and grants are soft-deleted.
//! - A role change and the revocation of the grants it invalidates commit
//!   together.
//! - Audit events are append-only.
use crate::model::{
    AccessGrant, AuditEvent, Case, CaseStatus, Contact, Court, Deadline, DeadlineStatus, Holiday,
    HolidayCalendar, Judge, Organization, Subscription, User,
};
use async_trait::async_trait;
use precedent_authz::{GrantError, Scope};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Grant(#[from] GrantError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".into()),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlineFilter {
    pub case_id: Option<Uuid>,
    pub status: Option<DeadlineStatus>,
}

/// Which grants a listing returns. Revoked grants are left out unless
/// `include_inactive` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantFilter {
    pub organization_id: Option<Uuid>,
    pub granted_by: Option<Uuid>,
    pub granted_to: Option<Uuid>,
    pub include_inactive: bool,
}

impl GrantFilter {
    pub fn received_by(grantee: Uuid) -> Self {
        Self {
            granted_to: Some(grantee),
            ..Self::default()
        }
    }

    pub fn issued_by(granter: Uuid) -> Self {
        Self {
            granted_by: Some(granter),
            ..Self::default()
        }
    }

    pub fn matches(&self, grant: &AccessGrant) -> bool {
        (self.include_inactive || grant.is_active)
            && self
                .organization_id
                .is_none_or(|org| grant.organization_id == org)
            && self.granted_by.is_none_or(|id| grant.granted_by == id)
            && self.granted_to.is_none_or(|id| grant.granted_to == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_table: Option<String>,
    pub entity_id: Option<Uuid>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        self.entity_table
            .as_deref()
            .is_none_or(|table| event.entity_table == table)
            && self.entity_id.is_none_or(|id| event.entity_id == id)
    }
}

#[async_trait]
pub trait PracticeStore: Send + Sync {
    async fn list_organizations(&self, scope: &Scope) -> StoreResult<Vec<Organization>>;
    async fn get_organization(&self, id: Uuid) -> StoreResult<Organization>;
    async fn create_organization(&self, organization: Organization) -> StoreResult<Organization>;
    async fn deactivate_organization(&self, id: Uuid) -> StoreResult<Organization>;

    async fn list_users(&self, scope: &Scope) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
    /// Persist `user` (whose role changed) and, atomically with it, revoke
    /// every active grant the new role makes role-incompatible. Returns the
    /// stored user and the grants that were revoked.
    async fn update_user_role(&self, user: User) -> StoreResult<(User, Vec<AccessGrant>)>;
    async fn count_active_users(&self, organization_id: Uuid) -> StoreResult<u64>;

    /// Attach a hashed bearer token to a user.
    async fn insert_api_token(&self, token_hash: &str, user_id: Uuid) -> StoreResult<()>;
    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>>;

    /// Persist a new active grant; fails with `DuplicateGrant` when the pair
    /// already has one.
    async fn create_grant(&self, grant: AccessGrant) -> StoreResult<AccessGrant>;
    /// Deactivate a grant. Revoking an inactive grant is a no-op.
    async fn revoke_grant(&self, id: Uuid) -> StoreResult<AccessGrant>;
    async fn get_grant(&self, id: Uuid) -> StoreResult<AccessGrant>;
    /// Grants matching `filter`, oldest first.
    async fn list_grants(&self, filter: GrantFilter) -> StoreResult<Vec<AccessGrant>>;

    async fn list_cases(&self, scope: &Scope, filter: CaseFilter) -> StoreResult<Vec<Case>>;
    async fn get_case(&self, id: Uuid) -> StoreResult<Case>;
    async fn create_case(&self, case: Case) -> StoreResult<Case>;
    async fn update_case(&self, case: Case) -> StoreResult<Case>;
    async fn delete_case(&self, id: Uuid) -> StoreResult<()>;

    async fn list_deadlines(
        &self,
        scope: &Scope,
        filter: DeadlineFilter,
    ) -> StoreResult<Vec<Deadline>>;
    async fn get_deadline(&self, id: Uuid) -> StoreResult<Deadline>;
    async fn create_deadline(&self, deadline: Deadline) -> StoreResult<Deadline>;
    async fn update_deadline(&self, deadline: Deadline) -> StoreResult<Deadline>;

    async fn list_contacts(&self, scope: &Scope) -> StoreResult<Vec<Contact>>;
    async fn get_contact(&self, id: Uuid) -> StoreResult<Contact>;
    async fn create_contact(&self, contact: Contact) -> StoreResult<Contact>;

    async fn list_subscriptions(&self, scope: &Scope) -> StoreResult<Vec<Subscription>>;
    async fn subscription_for(&self, organization_id: Uuid) -> StoreResult<Option<Subscription>>;
    /// Insert or replace the subscription of `subscription.organization_id`.
    async fn upsert_subscription(&self, subscription: Subscription) -> StoreResult<Subscription>;

    async fn list_courts(&self, scope: &Scope) -> StoreResult<Vec<Court>>;
    async fn get_court(&self, id: Uuid) -> StoreResult<Court>;
    async fn create_court(&self, court: Court) -> StoreResult<Court>;
    /// Remove a court; its judges keep their records with no court.
    async fn delete_court(&self, id: Uuid) -> StoreResult<()>;

    async fn list_judges(&self, scope: &Scope, court_id: Option<Uuid>) -> StoreResult<Vec<Judge>>;
    async fn get_judge(&self, id: Uuid) -> StoreResult<Judge>;
    async fn create_judge(&self, judge: Judge) -> StoreResult<Judge>;
    async fn delete_judge(&self, id: Uuid) -> StoreResult<()>;

    async fn list_holiday_calendars(&self, scope: &Scope) -> StoreResult<Vec<HolidayCalendar>>;
    async fn get_holiday_calendar(&self, id: Uuid) -> StoreResult<HolidayCalendar>;
    async fn create_holiday_calendar(
        &self,
        calendar: HolidayCalendar,
    ) -> StoreResult<HolidayCalendar>;
    /// Add a holiday; a second holiday on the same date is a conflict.
    async fn add_holiday(
        &self,
        calendar_id: Uuid,
        holiday: Holiday,
    ) -> StoreResult<HolidayCalendar>;

    async fn record_audit_event(&self, event: AuditEvent) -> StoreResult<AuditEvent>;
    /// Newest first.
    async fn list_audit_events(
        &self,
        scope: &Scope,
        filter: AuditFilter,
    ) -> StoreResult<Vec<AuditEvent>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
