use chrono::{DateTime, Utc};
use precedent_authz::{Actor, OwnedRecord, RecordRef, Role, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A firm member or platform operator.
///
/// `organization_id` is `None` only for platform administrators. Accounts
/// are never removed; deleting one clears `is_active`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub organization_id: Option<Uuid>,
    #[schema(value_type = String, example = "practitioner")]
    pub role: Role,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        organization_id: Option<Uuid>,
        role: Role,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
            organization_id,
            role,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::from(self.id)
    }

    /// Snapshot handed to the evaluator.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id(),
            organization_id: self.organization_id.map(super::org_id),
            role: self.role,
            active: self.is_active,
        }
    }
}

impl OwnedRecord for User {
    fn record_ref(&self) -> RecordRef {
        RecordRef::account(
            self.user_id(),
            self.organization_id.map(super::org_id),
            self.role,
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserCreateRequest {
    pub email: String,
    pub display_name: String,
    #[schema(value_type = String, example = "assistant")]
    pub role: Role,
    /// Defaults to the caller's firm; platform administrators must set it.
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct UserPatchRequest {
    pub display_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}
