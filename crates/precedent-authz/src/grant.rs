//! Access grants: delegated visibility from one user to another.
//!
//! # Purpose
//! A grant says "grantee may see target's data". This module owns the
//! validation rules a new grant must satisfy and the read-side lookup the
//! evaluator and scoper consult. Persistence and duplicate detection live in
//! the storage layer.
//!
//! # Key invariants
//! - Validation reports the first failing rule in a fixed order: self grant,
//!   role compatibility, tenant, granter rank, account activity.
//! - Only active edges ever contribute visibility.
//!
//! # Examples
//! ```rust
//! use precedent_authz::{validate_grant, Actor, GrantError, OrganizationId, Role, UserId};
//!
//! let org = OrganizationId::new();
//! let admin = Actor::new(UserId::new(), Some(org), Role::TenantAdmin);
//! let assistant = Actor::new(UserId::new(), Some(org), Role::Assistant);
//! let practitioner = Actor::new(UserId::new(), Some(org), Role::Practitioner);
//!
//! assert_eq!(validate_grant(&admin, &practitioner, &assistant), Ok(org));
//! assert_eq!(
//!     validate_grant(&admin, &assistant, &practitioner),
//!     Err(GrantError::RoleIncompatible {
//!         grantee_role: Role::Assistant,
//!         target_role: Role::Practitioner,
//!     })
//! );
//! ```
use crate::{Actor, OrganizationId, Role, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Which side of a grant a validation failure points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantParty {
    GrantedBy,
    GrantedTo,
    CanAccessUser,
}

impl GrantParty {
    pub fn field(self) -> &'static str {
        match self {
            GrantParty::GrantedBy => "granted_by",
            GrantParty::GrantedTo => "granted_to",
            GrantParty::CanAccessUser => "can_access_user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    #[error("a user cannot be granted access to their own data")]
    SelfGrant,
    #[error("role {grantee_role} cannot be granted access to {target_role} data")]
    RoleIncompatible { grantee_role: Role, target_role: Role },
    #[error("grantee and target must belong to the same organization")]
    CrossTenant,
    #[error("role {granter_role} cannot manage access grants here")]
    InsufficientRank { granter_role: Role },
    #[error("inactive account cannot take part in a grant")]
    InactiveAccount { party: GrantParty },
    #[error("an active grant already exists for this pair")]
    DuplicateGrant,
}

impl GrantError {
    /// Request field the error should be reported against.
    pub fn field(&self) -> &'static str {
        match self {
            GrantError::SelfGrant | GrantError::RoleIncompatible { .. } => {
                GrantParty::CanAccessUser.field()
            }
            GrantError::CrossTenant => GrantParty::GrantedTo.field(),
            GrantError::InsufficientRank { .. } => GrantParty::GrantedBy.field(),
            GrantError::InactiveAccount { party } => party.field(),
            GrantError::DuplicateGrant => "non_field_errors",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GrantError::SelfGrant => "self_grant",
            GrantError::RoleIncompatible { .. } => "role_incompatible",
            GrantError::CrossTenant => "cross_tenant",
            GrantError::InsufficientRank { .. } => "insufficient_rank",
            GrantError::InactiveAccount { .. } => "inactive_account",
            GrantError::DuplicateGrant => "duplicate_grant",
        }
    }
}

/// Check whether `granter` may let `grantee` see `target`'s data.
///
/// Returns the organization the grant belongs to. Uniqueness of the active
/// pair is not checked here.
pub fn validate_grant(
    granter: &Actor,
    grantee: &Actor,
    target: &Actor,
) -> Result<OrganizationId, GrantError> {
    if grantee.id == target.id {
        return Err(GrantError::SelfGrant);
    }
    if !grantee.role.can_be_granted(target.role) {
        return Err(GrantError::RoleIncompatible {
            grantee_role: grantee.role,
            target_role: target.role,
        });
    }
    let organization_id = match (grantee.organization_id, target.organization_id) {
        (Some(a), Some(b)) if a == b => a,
        _ => return Err(GrantError::CrossTenant),
    };
    let granter_allowed = match granter.role {
        Role::PlatformAdmin => true,
        Role::TenantAdmin => granter.organization_id == Some(organization_id),
        _ => false,
    };
    if !granter_allowed {
        return Err(GrantError::InsufficientRank {
            granter_role: granter.role,
        });
    }
    if !granter.active {
        return Err(GrantError::InactiveAccount {
            party: GrantParty::GrantedBy,
        });
    }
    if !grantee.active {
        return Err(GrantError::InactiveAccount {
            party: GrantParty::GrantedTo,
        });
    }
    if !target.active {
        return Err(GrantError::InactiveAccount {
            party: GrantParty::CanAccessUser,
        });
    }
    Ok(organization_id)
}

/// Minimal stored view of one grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEdge {
    pub grantee: UserId,
    pub target: UserId,
    pub organization_id: OrganizationId,
    pub active: bool,
}

/// Read side of the grant relation.
pub trait GrantLookup {
    fn has_active_grant(&self, grantee: UserId, target: UserId) -> bool;

    /// Targets of every active grant held by `grantee`.
    fn active_targets(&self, grantee: UserId) -> BTreeSet<UserId>;

    /// Owners whose data `grantee` can see: the grant targets plus itself.
    fn visible_to(&self, grantee: UserId) -> BTreeSet<UserId> {
        let mut owners = self.active_targets(grantee);
        owners.insert(grantee);
        owners
    }
}

impl GrantLookup for [GrantEdge] {
    fn has_active_grant(&self, grantee: UserId, target: UserId) -> bool {
        self.iter()
            .any(|edge| edge.active && edge.grantee == grantee && edge.target == target)
    }

    fn active_targets(&self, grantee: UserId) -> BTreeSet<UserId> {
        self.iter()
            .filter(|edge| edge.active && edge.grantee == grantee)
            .map(|edge| edge.target)
            .collect()
    }
}

impl GrantLookup for Vec<GrantEdge> {
    fn has_active_grant(&self, grantee: UserId, target: UserId) -> bool {
        self.as_slice().has_active_grant(grantee, target)
    }

    fn active_targets(&self, grantee: UserId) -> BTreeSet<UserId> {
        self.as_slice().active_targets(grantee)
    }
}

/// Active grant targets of a single actor, loaded once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSet {
    grantee: Option<UserId>,
    targets: BTreeSet<UserId>,
}

impl GrantSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keep the active edges held by `actor` inside its own organization.
    pub fn for_actor<'a>(actor: &Actor, edges: impl IntoIterator<Item = &'a GrantEdge>) -> Self {
        let targets = edges
            .into_iter()
            .filter(|edge| {
                edge.active
                    && edge.grantee == actor.id
                    && actor.organization_id == Some(edge.organization_id)
            })
            .map(|edge| edge.target)
            .collect();
        Self {
            grantee: Some(actor.id),
            targets,
        }
    }

    pub fn targets(&self) -> &BTreeSet<UserId> {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl GrantLookup for GrantSet {
    fn has_active_grant(&self, grantee: UserId, target: UserId) -> bool {
        self.grantee == Some(grantee) && self.targets.contains(&target)
    }

    fn active_targets(&self, grantee: UserId) -> BTreeSet<UserId> {
        if self.grantee == Some(grantee) {
            self.targets.clone()
        } else {
            BTreeSet::new()
        }
    }
}
