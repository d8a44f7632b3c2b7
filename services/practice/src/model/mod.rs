//! Practice data model.
//!
//! # Purpose
//! Stored records and their request payloads. Every owned record converts to
//! a [`precedent_authz::RecordRef`] so handlers never hand raw fields to the
//! access-control engine.
mod audit;
mod case;
mod contact;
mod court;
mod deadline;
mod grant;
mod organization;
mod subscription;
mod user;

pub use audit::{AuditAction, AuditEvent};
pub use case::{Case, CaseCreateRequest, CasePatchRequest, CaseStatus};
pub use contact::{Contact, ContactCreateRequest, ContactKind};
pub use court::{
    Court, CourtCreateRequest, Holiday, HolidayCalendar, HolidayCalendarCreateRequest, Judge,
    JudgeCreateRequest,
};
pub use deadline::{Deadline, DeadlineCreateRequest, DeadlinePatchRequest, DeadlineStatus};
pub use grant::{AccessGrant, GrantCreateRequest};
pub use organization::{Organization, OrganizationCreateRequest};
pub use subscription::{Subscription, SubscriptionStatus, SubscriptionUpsertRequest};
pub use user::{User, UserCreateRequest, UserPatchRequest};

use precedent_authz::{OrganizationId, UserId};
use uuid::Uuid;

pub(crate) fn org_id(id: Uuid) -> OrganizationId {
    OrganizationId::from(id)
}

pub(crate) fn user_id(id: Option<Uuid>) -> Option<UserId> {
    id.map(UserId::from)
}
