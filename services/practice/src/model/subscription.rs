use chrono::{DateTime, NaiveDate, Utc};
use precedent_authz::{OwnedRecord, RecordRef};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Suspended,
    Cancelled,
    Trial,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Trial => "trial",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(SubscriptionStatus::Active),
            "suspended" => Ok(SubscriptionStatus::Suspended),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "trial" => Ok(SubscriptionStatus::Trial),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// Licensing for one organization. At most one per organization.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub licensed_users: i32,
    pub status: SubscriptionStatus,
    pub contract_start_date: NaiveDate,
    pub contract_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// True while `active_users` is below the licensed seat count.
    pub fn can_add_user(&self, active_users: u64) -> bool {
        active_users < self.licensed_users.max(0) as u64
    }
}

impl OwnedRecord for Subscription {
    fn record_ref(&self) -> RecordRef {
        RecordRef::subscription(super::org_id(self.organization_id))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SubscriptionUpsertRequest {
    pub licensed_users: i32,
    pub status: Option<SubscriptionStatus>,
    pub contract_start_date: NaiveDate,
    pub contract_end_date: Option<NaiveDate>,
}
