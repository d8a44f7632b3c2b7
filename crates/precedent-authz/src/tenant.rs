//! Actor snapshot and the tenant boundary check.
use crate::{OrganizationId, RecordRef, Role, UserId};
use serde::{Deserialize, Serialize};

/// The authenticated actor as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    /// `None` only for platform accounts.
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
    pub active: bool,
}

impl Actor {
    pub fn new(id: UserId, organization_id: Option<OrganizationId>, role: Role) -> Self {
        Self {
            id,
            organization_id,
            role,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// True when both sides carry the same, present organization.
    pub fn same_organization(&self, organization_id: Option<OrganizationId>) -> bool {
        matches!(
            (self.organization_id, organization_id),
            (Some(mine), Some(theirs)) if mine == theirs
        )
    }
}

/// Platform administrators cross every tenant; everyone else stays inside
/// their own organization. A record without an organization is outside every
/// tenant.
pub fn same_tenant(actor: &Actor, record: &RecordRef) -> bool {
    if actor.role == Role::PlatformAdmin {
        return true;
    }
    actor.same_organization(record.organization_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceKind;

    #[test]
    fn platform_admin_is_exempt() {
        let admin = Actor::new(UserId::new(), None, Role::PlatformAdmin);
        let record = RecordRef::owned(ResourceKind::Case, OrganizationId::new(), None);
        assert!(same_tenant(&admin, &record));
    }

    #[test]
    fn matching_organization_passes() {
        let org = OrganizationId::new();
        let actor = Actor::new(UserId::new(), Some(org), Role::Assistant);
        let record = RecordRef::owned(ResourceKind::Deadline, org, None);
        assert!(same_tenant(&actor, &record));
    }

    #[test]
    fn other_organization_fails_even_for_tenant_admin() {
        let actor = Actor::new(UserId::new(), Some(OrganizationId::new()), Role::TenantAdmin);
        let record = RecordRef::owned(ResourceKind::Case, OrganizationId::new(), None);
        assert!(!same_tenant(&actor, &record));
    }

    #[test]
    fn missing_organization_is_a_mismatch() {
        let actor = Actor::new(UserId::new(), None, Role::TenantAdmin);
        let record = RecordRef::owned(ResourceKind::Case, OrganizationId::new(), None);
        assert!(!same_tenant(&actor, &record));

        let org = OrganizationId::new();
        let actor = Actor::new(UserId::new(), Some(org), Role::Practitioner);
        let orphan = RecordRef::account(UserId::new(), None, Role::Practitioner);
        assert!(!same_tenant(&actor, &orphan));
    }
}
