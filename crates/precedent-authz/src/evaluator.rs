//! Single-decision permission evaluator.
//!
//! # Purpose
//! Answers "may this actor perform this action on this target?" as a pure
//! function of the actor snapshot, the actor's grants, and the target's
//! ownership view. Nothing is cached between calls.
//!
//! # Key invariants
//! - Checks run in a fixed order; the first one that decides wins.
//! - The tenant boundary is checked before ownership or grants.
//! - Every deny names a [`DenyReason`].
use crate::{
    Action, Actor, Decision, DenyReason, GrantLookup, Ownership, RecordRef, ResourceKind, Role,
    same_tenant,
};

/// What the action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A resource type as a whole, e.g. "may I list cases at all".
    Class(ResourceKind),
    Record(&'a RecordRef),
}

impl Target<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Target::Class(kind) => *kind,
            Target::Record(record) => record.kind,
        }
    }
}

impl<'a> From<&'a RecordRef> for Target<'a> {
    fn from(record: &'a RecordRef) -> Self {
        Target::Record(record)
    }
}

impl From<ResourceKind> for Target<'_> {
    fn from(kind: ResourceKind) -> Self {
        Target::Class(kind)
    }
}

/// Decide whether `actor` may perform `action` on `target`.
pub fn authorize<'a, G>(
    actor: &Actor,
    grants: &G,
    action: Action,
    target: impl Into<Target<'a>>,
) -> Decision
where
    G: GrantLookup + ?Sized,
{
    let target = target.into();
    if !actor.active {
        return Decision::Deny(DenyReason::AccountInactive);
    }
    if actor.role == Role::PlatformAdmin {
        return Decision::Allow;
    }
    if let Some(reason) = management_gate(actor, action, &target) {
        return Decision::Deny(reason);
    }
    let record = match target {
        Target::Class(_) => return Decision::Allow,
        Target::Record(record) => record,
    };
    // Mutations of reference data were refused by the gate above.
    if record.kind.is_reference_data() {
        return Decision::Allow;
    }
    if !same_tenant(actor, record) {
        return Decision::Deny(DenyReason::CrossTenant);
    }
    if actor.role == Role::TenantAdmin {
        return tenant_admin_decision(actor, action, record);
    }
    if owned_by(actor, record) {
        return Decision::Allow;
    }
    match record.owner_id {
        Some(owner) if grants.has_active_grant(actor.id, owner) => Decision::Allow,
        _ => Decision::Deny(DenyReason::NotAuthorized),
    }
}

// Rank gates that hold regardless of ownership or grants.
fn management_gate(actor: &Actor, action: Action, target: &Target<'_>) -> Option<DenyReason> {
    let admin = actor.role.is_admin();
    let kind = target.kind();
    if action == Action::ManageGrants && !admin {
        return Some(DenyReason::InsufficientRank);
    }
    if kind.is_platform_managed() && action.is_mutation() {
        return Some(DenyReason::InsufficientRank);
    }
    if kind == ResourceKind::User && !admin {
        match action {
            Action::Create | Action::Delete => return Some(DenyReason::InsufficientRank),
            Action::Update => match target {
                Target::Record(record) if record.owner_id != Some(actor.id) => {
                    return Some(DenyReason::InsufficientRank);
                }
                _ => {}
            },
            _ => {}
        }
    }
    None
}

fn tenant_admin_decision(actor: &Actor, action: Action, record: &RecordRef) -> Decision {
    match record.account_role {
        Some(Role::PlatformAdmin) => Decision::Deny(DenyReason::InsufficientRank),
        Some(Role::TenantAdmin)
            if action.is_mutation() && record.owner_id != Some(actor.id) =>
        {
            Decision::Deny(DenyReason::InsufficientRank)
        }
        _ => Decision::Allow,
    }
}

fn owned_by(actor: &Actor, record: &RecordRef) -> bool {
    match record.kind.ownership() {
        Ownership::Members => actor.same_organization(record.organization_id),
        Ownership::Unowned | Ownership::Reference => false,
        _ => record.owner_id == Some(actor.id),
    }
}
