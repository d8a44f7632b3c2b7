//! Queryset scoping: the bulk form of the evaluator's view decision.
//!
//! # Purpose
//! Produces a [`Scope`] for an actor and a resource kind. A scope can be
//! checked record by record with [`Scope::matches`] or pushed down into a
//! storage query as an organization equality plus an owner-id-in-set clause.
//!
//! # Key invariants
//! - For every record `r` of the scoped kind,
//!   `scope.matches(r) == authorize(actor, grants, Action::View, r).is_allowed()`.
//! - Scopes are built fresh from the grants passed in; nothing is cached.
//!
//! # Examples
//! ```rust
//! use precedent_authz::{scope_queryset, Actor, GrantSet, OrganizationId, RecordRef, ResourceKind, Role, UserId};
//!
//! let org = OrganizationId::new();
//! let admin = Actor::new(UserId::new(), Some(org), Role::TenantAdmin);
//! let scope = scope_queryset(&admin, &GrantSet::empty(), ResourceKind::Case);
//! let case = RecordRef::owned(ResourceKind::Case, org, Some(UserId::new()));
//! assert!(scope.matches(&case));
//! ```
use crate::{
    Actor, GrantLookup, OrganizationId, Ownership, RecordRef, ResourceKind, Role, UserId,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Nothing,
    Everything,
    /// Every record of one organization.
    Organization {
        organization_id: OrganizationId,
        /// Drop platform administrator accounts from user listings.
        exclude_platform_accounts: bool,
    },
    /// Records of one organization whose owner is in `owner_ids`.
    Owners {
        organization_id: OrganizationId,
        owner_ids: BTreeSet<UserId>,
    },
}

impl Scope {
    pub fn matches(&self, record: &RecordRef) -> bool {
        match self {
            Scope::Nothing => false,
            Scope::Everything => true,
            Scope::Organization {
                organization_id,
                exclude_platform_accounts,
            } => {
                record.organization_id == Some(*organization_id)
                    && !(*exclude_platform_accounts
                        && record.account_role == Some(Role::PlatformAdmin))
            }
            Scope::Owners {
                organization_id,
                owner_ids,
            } => {
                record.organization_id == Some(*organization_id)
                    && record
                        .owner_id
                        .is_some_and(|owner| owner_ids.contains(&owner))
            }
        }
    }

    /// Organization every matching record must belong to, if restricted.
    pub fn organization_id(&self) -> Option<OrganizationId> {
        match self {
            Scope::Organization {
                organization_id, ..
            }
            | Scope::Owners {
                organization_id, ..
            } => Some(*organization_id),
            Scope::Nothing | Scope::Everything => None,
        }
    }

    /// Owner ids for the owner-id-in-set clause, if restricted by owner.
    pub fn owner_ids(&self) -> Option<&BTreeSet<UserId>> {
        match self {
            Scope::Owners { owner_ids, .. } => Some(owner_ids),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Scope::Nothing)
    }

    /// Narrow a list of records in memory.
    pub fn filter<T>(
        &self,
        items: impl IntoIterator<Item = T>,
        view: impl Fn(&T) -> RecordRef,
    ) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| self.matches(&view(item)))
            .collect()
    }
}

/// Build the visibility scope of `actor` over records of `kind`.
pub fn scope_queryset<G>(actor: &Actor, grants: &G, kind: ResourceKind) -> Scope
where
    G: GrantLookup + ?Sized,
{
    if !actor.active {
        return Scope::Nothing;
    }
    if actor.role == Role::PlatformAdmin || kind.is_reference_data() {
        return Scope::Everything;
    }
    let Some(organization_id) = actor.organization_id else {
        return Scope::Nothing;
    };
    if actor.role == Role::TenantAdmin {
        return Scope::Organization {
            organization_id,
            exclude_platform_accounts: kind == ResourceKind::User,
        };
    }
    match kind.ownership() {
        Ownership::Members => Scope::Organization {
            organization_id,
            exclude_platform_accounts: false,
        },
        Ownership::Unowned => Scope::Nothing,
        Ownership::Reference => Scope::Everything,
        Ownership::LeadPractitioner
        | Ownership::Owner
        | Ownership::CreatedBy
        | Ownership::Account => Scope::Owners {
            organization_id,
            owner_ids: grants.visible_to(actor.id),
        },
    }
}
