use chrono::{DateTime, NaiveDate, Utc};
use precedent_authz::{OwnedRecord, RecordRef, ResourceKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A court. Shared by every firm and maintained by the platform.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Court {
    pub id: Uuid,
    pub name: String,
    pub district: Option<String>,
    pub division: Option<String>,
    pub location: Option<String>,
    /// IANA zone used for filing cutoffs, e.g. `America/New_York`.
    pub timezone: String,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Court {
    fn record_ref(&self) -> RecordRef {
        RecordRef::reference(ResourceKind::Court)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CourtCreateRequest {
    pub name: String,
    pub district: Option<String>,
    pub division: Option<String>,
    pub location: Option<String>,
    /// Defaults to `America/New_York` when empty.
    #[serde(default)]
    pub timezone: String,
    pub website_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Judge {
    pub id: Uuid,
    pub full_name: String,
    /// Cleared when the court is removed.
    pub court_id: Option<Uuid>,
    pub courtroom: Option<String>,
    pub chambers_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub holiday_calendar_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Judge {
    fn record_ref(&self) -> RecordRef {
        RecordRef::reference(ResourceKind::Judge)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct JudgeCreateRequest {
    pub full_name: String,
    pub court_id: Option<Uuid>,
    pub courtroom: Option<String>,
    pub chambers_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub holiday_calendar_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// Court holidays for one jurisdiction; at most one holiday per date.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct HolidayCalendar {
    pub id: Uuid,
    pub name: String,
    pub jurisdiction: Option<String>,
    pub timezone: String,
    pub source_url: Option<String>,
    /// Sorted by date.
    pub holidays: Vec<Holiday>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HolidayCalendar {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|holiday| holiday.date == date)
    }
}

impl OwnedRecord for HolidayCalendar {
    fn record_ref(&self) -> RecordRef {
        RecordRef::reference(ResourceKind::HolidayCalendar)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HolidayCalendarCreateRequest {
    pub name: String,
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub timezone: String,
    pub source_url: Option<String>,
}
