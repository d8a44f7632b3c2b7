use chrono::{DateTime, Utc};
use precedent_authz::{OwnedRecord, RecordRef, ResourceKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Open,
    Stayed,
    Closed,
    Appeal,
    Other,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Stayed => "stayed",
            CaseStatus::Closed => "closed",
            CaseStatus::Appeal => "appeal",
            CaseStatus::Other => "other",
        }
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(CaseStatus::Open),
            "stayed" => Ok(CaseStatus::Stayed),
            "closed" => Ok(CaseStatus::Closed),
            "appeal" => Ok(CaseStatus::Appeal),
            "other" => Ok(CaseStatus::Other),
            other => Err(format!("unknown case status: {other}")),
        }
    }
}

/// A matter; visible to its lead practitioner and whoever holds a grant on them.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Case {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub caption: String,
    pub case_number: Option<String>,
    pub status: CaseStatus,
    pub lead_practitioner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Case {
    fn record_ref(&self) -> RecordRef {
        RecordRef::owned(
            ResourceKind::Case,
            super::org_id(self.organization_id),
            super::user_id(self.lead_practitioner_id),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CaseCreateRequest {
    pub caption: String,
    pub case_number: Option<String>,
    pub status: Option<CaseStatus>,
    /// Defaults to the caller.
    pub lead_practitioner_id: Option<Uuid>,
    /// Required for platform administrators only.
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct CasePatchRequest {
    pub caption: Option<String>,
    pub case_number: Option<String>,
    pub status: Option<CaseStatus>,
    pub lead_practitioner_id: Option<Uuid>,
}
