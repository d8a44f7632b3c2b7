//! Five-tier role hierarchy.
//!
//! # Purpose
//! Defines the ranked [`Role`] enumeration and the declarative table of which
//! roles a grantee of a given role may be granted visibility into.
//!
//! # Key invariants
//! - Rank is total and strict: no two roles share a rank.
//! - A grantee may only see roles at or below its own rank, and only inside
//!   the practitioner sub-hierarchy. Admin tiers are never grant targets.
//!
//! # Examples
//! ```rust
//! use precedent_authz::Role;
//!
//! assert!(Role::TenantAdmin.outranks(Role::ManagingPractitioner));
//! assert!(Role::Practitioner.can_be_granted(Role::Assistant));
//! assert!(!Role::Practitioner.can_be_granted(Role::TenantAdmin));
//! ```
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    TenantAdmin,
    ManagingPractitioner,
    Practitioner,
    Assistant,
}

impl Role {
    /// Every role, highest authority first.
    pub const ALL: [Role; 5] = [
        Role::PlatformAdmin,
        Role::TenantAdmin,
        Role::ManagingPractitioner,
        Role::Practitioner,
        Role::Assistant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::TenantAdmin => "tenant_admin",
            Role::ManagingPractitioner => "managing_practitioner",
            Role::Practitioner => "practitioner",
            Role::Assistant => "assistant",
        }
    }

    /// Numeric authority; larger means more authority.
    pub fn rank(self) -> u8 {
        match self {
            Role::PlatformAdmin => 5,
            Role::TenantAdmin => 4,
            Role::ManagingPractitioner => 3,
            Role::Practitioner => 2,
            Role::Assistant => 1,
        }
    }

    /// True when `self` ranks strictly above `other`.
    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::PlatformAdmin | Role::TenantAdmin)
    }

    /// Roles whose data a grantee holding `self` may be granted access to.
    pub fn accessible_subroles(self) -> &'static [Role] {
        match self {
            Role::PlatformAdmin | Role::TenantAdmin => &[],
            Role::ManagingPractitioner => &[
                Role::ManagingPractitioner,
                Role::Practitioner,
                Role::Assistant,
            ],
            Role::Practitioner => &[Role::Practitioner, Role::Assistant],
            Role::Assistant => &[Role::Assistant],
        }
    }

    pub fn can_be_granted(self, target: Role) -> bool {
        self.accessible_subroles().contains(&target)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AuthzError::InvalidRole(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_string_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
            assert_eq!(role.to_string(), role.as_str());
        }
        assert!("super_admin".parse::<Role>().is_err());
    }

    #[test]
    fn rank_is_strict_total_order() {
        for (i, higher) in Role::ALL.iter().enumerate() {
            for lower in &Role::ALL[i + 1..] {
                assert!(higher.outranks(*lower));
                assert!(!lower.outranks(*higher));
            }
            assert!(!higher.outranks(*higher));
        }
    }

    #[test]
    fn admin_tiers_are_never_grant_targets() {
        for grantee in Role::ALL {
            assert!(!grantee.can_be_granted(Role::PlatformAdmin));
            assert!(!grantee.can_be_granted(Role::TenantAdmin));
        }
        assert!(Role::PlatformAdmin.accessible_subroles().is_empty());
        assert!(Role::TenantAdmin.accessible_subroles().is_empty());
    }

    #[test]
    fn subroles_never_exceed_grantee_rank() {
        for grantee in Role::ALL {
            for target in grantee.accessible_subroles() {
                assert!(!target.outranks(grantee));
            }
        }
    }

    #[test]
    fn subrole_table_matches_hierarchy() {
        assert_eq!(Role::ManagingPractitioner.accessible_subroles().len(), 3);
        assert!(Role::Practitioner.can_be_granted(Role::Practitioner));
        assert!(!Role::Practitioner.can_be_granted(Role::ManagingPractitioner));
        assert_eq!(Role::Assistant.accessible_subroles(), &[Role::Assistant]);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::ManagingPractitioner).expect("serialize");
        assert_eq!(json, "\"managing_practitioner\"");
    }
}
