//! Strongly typed identifiers for actors and tenants.
//!
//! # Purpose
//! Wraps raw UUIDs so organization and user identifiers cannot be swapped by
//! accident when they flow through the evaluator and the scoper.
//!
//! # Key invariants
//! - Serialization is transparent: the wire form is the bare UUID string.
//!
//! # Examples
//! ```rust
//! use precedent_authz::{OrganizationId, UserId};
//! use uuid::Uuid;
//!
//! let raw = Uuid::new_v4();
//! let user = UserId::from(raw);
//! assert_eq!(user.as_uuid(), raw);
//! assert_ne!(OrganizationId::new().as_uuid(), raw);
//! ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization (tenant) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrganizationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// User (actor) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_uuid() {
        let raw = Uuid::new_v4();
        let id = UserId::from(raw);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{raw}\""));
        assert_eq!(id.to_string(), raw.to_string());
    }

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(OrganizationId::new(), OrganizationId::new());
        assert_ne!(UserId::new(), UserId::new());
    }
}
