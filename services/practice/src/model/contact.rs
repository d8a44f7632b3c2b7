use chrono::{DateTime, Utc};
use precedent_authz::{OwnedRecord, RecordRef, ResourceKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Person,
    Organization,
}

impl ContactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactKind::Person => "person",
            ContactKind::Organization => "organization",
        }
    }
}

impl std::str::FromStr for ContactKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "person" => Ok(ContactKind::Person),
            "organization" => Ok(ContactKind::Organization),
            other => Err(format!("unknown contact kind: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Contact {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: ContactKind,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Contact {
    fn record_ref(&self) -> RecordRef {
        RecordRef::owned(
            ResourceKind::Contact,
            super::org_id(self.organization_id),
            super::user_id(self.created_by),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ContactCreateRequest {
    pub kind: ContactKind,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Required for platform administrators only.
    pub organization_id: Option<Uuid>,
}
