use chrono::{DateTime, Utc};
use precedent_authz::{GrantEdge, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// "`granted_to` may see `can_access_user`'s data", issued by an administrator.
///
/// Revocation clears `is_active`; rows are kept for audit.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct AccessGrant {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub granted_by: Uuid,
    pub granted_to: Uuid,
    pub can_access_user: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(
        organization_id: Uuid,
        granted_by: Uuid,
        granted_to: Uuid,
        can_access_user: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            granted_by,
            granted_to,
            can_access_user,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn edge(&self) -> GrantEdge {
        GrantEdge {
            grantee: UserId::from(self.granted_to),
            target: UserId::from(self.can_access_user),
            organization_id: super::org_id(self.organization_id),
            active: self.is_active,
        }
    }

    pub fn same_pair(&self, other: &AccessGrant) -> bool {
        self.granted_to == other.granted_to && self.can_access_user == other.can_access_user
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GrantCreateRequest {
    pub granted_to: Uuid,
    pub can_access_user: Uuid,
}
