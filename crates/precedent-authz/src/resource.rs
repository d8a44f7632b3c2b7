//! Resource kinds and the ownership view of a target record.
//!
//! # Purpose
//! Every resource type declares exactly one canonical ownership attribute.
//! The evaluator and the scoper never inspect record fields; they see only a
//! [`RecordRef`]: the owning user, the owning organization, and (for user
//! accounts) the account's role.
//!
//! # Key invariants
//! - `Ownership::column()` names the storage column used for owner-id-in-set
//!   push-down; kinds without an owner column return `None`.
//! - Organization, subscription, court reference and audit records are
//!   platform-managed: only the platform tier may create, change, or delete
//!   them.
//! - Court reference data (courts, judges, holiday calendars) belongs to no
//!   tenant and is readable by every active account.
//!
//! # Examples
//! ```rust
//! use precedent_authz::{Ownership, RecordRef, ResourceKind, UserId, OrganizationId};
//!
//! assert_eq!(ResourceKind::Case.ownership(), Ownership::LeadPractitioner);
//! let record = RecordRef::owned(ResourceKind::Case, OrganizationId::new(), Some(UserId::new()));
//! assert!(record.owner_id.is_some());
//! ```
use crate::{AuthzError, AuthzResult, OrganizationId, Role, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Case,
    Deadline,
    Contact,
    User,
    Subscription,
    Organization,
    Court,
    Judge,
    HolidayCalendar,
    AuditEvent,
}

/// How a resource kind resolves to a single owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    LeadPractitioner,
    Owner,
    CreatedBy,
    /// A user account is owned by itself.
    Account,
    /// Every member of the organization counts as an owner.
    Members,
    /// Only tenant and platform administrators see these records.
    Unowned,
    /// Shared reference data outside every tenant.
    Reference,
}

impl Ownership {
    pub fn column(self) -> Option<&'static str> {
        match self {
            Ownership::LeadPractitioner => Some("lead_practitioner_id"),
            Ownership::Owner => Some("owner_id"),
            Ownership::CreatedBy => Some("created_by"),
            Ownership::Account => Some("id"),
            Ownership::Members | Ownership::Unowned | Ownership::Reference => None,
        }
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Case,
        ResourceKind::Deadline,
        ResourceKind::Contact,
        ResourceKind::User,
        ResourceKind::Subscription,
        ResourceKind::Organization,
        ResourceKind::Court,
        ResourceKind::Judge,
        ResourceKind::HolidayCalendar,
        ResourceKind::AuditEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Case => "case",
            ResourceKind::Deadline => "deadline",
            ResourceKind::Contact => "contact",
            ResourceKind::User => "user",
            ResourceKind::Subscription => "subscription",
            ResourceKind::Organization => "organization",
            ResourceKind::Court => "court",
            ResourceKind::Judge => "judge",
            ResourceKind::HolidayCalendar => "holiday_calendar",
            ResourceKind::AuditEvent => "audit_event",
        }
    }

    pub fn ownership(self) -> Ownership {
        match self {
            ResourceKind::Case => Ownership::LeadPractitioner,
            ResourceKind::Deadline => Ownership::Owner,
            ResourceKind::Contact => Ownership::CreatedBy,
            ResourceKind::User => Ownership::Account,
            ResourceKind::Subscription | ResourceKind::AuditEvent => Ownership::Unowned,
            ResourceKind::Organization => Ownership::Members,
            ResourceKind::Court | ResourceKind::Judge | ResourceKind::HolidayCalendar => {
                Ownership::Reference
            }
        }
    }

    pub fn is_platform_managed(self) -> bool {
        matches!(
            self,
            ResourceKind::Organization
                | ResourceKind::Subscription
                | ResourceKind::Court
                | ResourceKind::Judge
                | ResourceKind::HolidayCalendar
                | ResourceKind::AuditEvent
        )
    }

    pub fn is_reference_data(self) -> bool {
        self.ownership() == Ownership::Reference
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AuthzError::InvalidResourceKind(value.to_string()))
    }
}

/// Ownership and tenancy attributes of one target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub kind: ResourceKind,
    pub organization_id: Option<OrganizationId>,
    pub owner_id: Option<UserId>,
    /// Role of the account when `kind` is [`ResourceKind::User`].
    pub account_role: Option<Role>,
}

impl RecordRef {
    /// A record whose ownership attribute resolves to `owner_id`.
    pub fn owned(
        kind: ResourceKind,
        organization_id: OrganizationId,
        owner_id: Option<UserId>,
    ) -> Self {
        Self {
            kind,
            organization_id: Some(organization_id),
            owner_id,
            account_role: None,
        }
    }

    pub fn account(user_id: UserId, organization_id: Option<OrganizationId>, role: Role) -> Self {
        Self {
            kind: ResourceKind::User,
            organization_id,
            owner_id: Some(user_id),
            account_role: Some(role),
        }
    }

    pub fn organization(organization_id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Organization,
            organization_id: Some(organization_id),
            owner_id: None,
            account_role: None,
        }
    }

    pub fn subscription(organization_id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Subscription,
            organization_id: Some(organization_id),
            owner_id: None,
            account_role: None,
        }
    }

    /// Court reference data; `kind` must be a reference kind.
    pub fn reference(kind: ResourceKind) -> Self {
        Self {
            kind,
            organization_id: None,
            owner_id: None,
            account_role: None,
        }
    }

    /// An audit entry. Platform-level events carry no organization.
    pub fn audit_event(organization_id: Option<OrganizationId>) -> Self {
        Self {
            kind: ResourceKind::AuditEvent,
            organization_id,
            owner_id: None,
            account_role: None,
        }
    }
}

/// Anything that can describe itself to the evaluator.
pub trait OwnedRecord {
    fn record_ref(&self) -> RecordRef;
}

impl OwnedRecord for RecordRef {
    fn record_ref(&self) -> RecordRef {
        *self
    }
}
