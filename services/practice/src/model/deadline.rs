use chrono::{DateTime, Utc};
use precedent_authz::{OwnedRecord, RecordRef, ResourceKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    #[default]
    Open,
    Snoozed,
    Done,
    Missed,
}

impl DeadlineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeadlineStatus::Open => "open",
            DeadlineStatus::Snoozed => "snoozed",
            DeadlineStatus::Done => "done",
            DeadlineStatus::Missed => "missed",
        }
    }
}

impl std::str::FromStr for DeadlineStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(DeadlineStatus::Open),
            "snoozed" => Ok(DeadlineStatus::Snoozed),
            "done" => Ok(DeadlineStatus::Done),
            "missed" => Ok(DeadlineStatus::Missed),
            other => Err(format!("unknown deadline status: {other}")),
        }
    }
}

/// A dated obligation on a case. `organization_id` is copied from the case
/// when the deadline is created.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Deadline {
    pub id: Uuid,
    pub case_id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub due_at: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    pub status: DeadlineStatus,
    pub priority: i16,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Deadline {
    fn record_ref(&self) -> RecordRef {
        RecordRef::owned(
            ResourceKind::Deadline,
            super::org_id(self.organization_id),
            super::user_id(self.owner_id),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DeadlineCreateRequest {
    pub case_id: Uuid,
    pub title: String,
    pub due_at: DateTime<Utc>,
    /// Defaults to the caller.
    pub owner_id: Option<Uuid>,
    /// 1 (highest) to 5; defaults to 3.
    pub priority: Option<i16>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct DeadlinePatchRequest {
    pub title: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub status: Option<DeadlineStatus>,
    pub owner_id: Option<Uuid>,
    pub priority: Option<i16>,
}
