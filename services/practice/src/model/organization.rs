use chrono::{DateTime, Utc};
use precedent_authz::{OwnedRecord, RecordRef};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A law firm: the unit of tenant isolation.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnedRecord for Organization {
    fn record_ref(&self) -> RecordRef {
        RecordRef::organization(super::org_id(self.id))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrganizationCreateRequest {
    pub name: String,
}
