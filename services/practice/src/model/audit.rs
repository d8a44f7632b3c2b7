use super::User;
use chrono::{DateTime, Utc};
use precedent_authz::{OwnedRecord, RecordRef};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// One recorded mutation, with JSON snapshots of the entity around it.
///
/// Append-only. `organization_id` is empty for platform-level changes.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct AuditEvent {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub actor_user_id: Option<Uuid>,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub action: AuditAction,
    #[schema(value_type = Option<Object>)]
    pub before: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub after: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor: &User,
        organization_id: Option<Uuid>,
        entity_table: &str,
        entity_id: Uuid,
        action: AuditAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            actor_user_id: Some(actor.id),
            entity_table: entity_table.to_string(),
            entity_id,
            action,
            before: None,
            after: None,
            created_at: Utc::now(),
        }
    }

    pub fn before<T: Serialize>(mut self, snapshot: &T) -> Self {
        self.before = serde_json::to_value(snapshot).ok();
        self
    }

    pub fn after<T: Serialize>(mut self, snapshot: &T) -> Self {
        self.after = serde_json::to_value(snapshot).ok();
        self
    }
}

impl OwnedRecord for AuditEvent {
    fn record_ref(&self) -> RecordRef {
        RecordRef::audit_event(self.organization_id.map(super::org_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precedent_authz::Role;

    #[test]
    fn snapshots_are_serialized_records() {
        let admin = User::new("admin@firm.test", "Admin", None, Role::PlatformAdmin, None);
        let event = AuditEvent::new(&admin, None, "users", admin.id, AuditAction::Update)
            .before(&admin)
            .after(&admin);
        assert_eq!(event.actor_user_id, Some(admin.id));
        let before = event.before.expect("before");
        assert_eq!(before["email"], "admin@firm.test");
        assert_eq!(before["role"], "platform_admin");
        assert_eq!("delete".parse::<AuditAction>(), Ok(AuditAction::Delete));
    }
}
