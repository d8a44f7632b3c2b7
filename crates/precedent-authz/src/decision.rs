//! Authorization outcomes.
//!
//! A deny is a value, not an error: callers can tell "you may not do this"
//! apart from "the system is broken", and every deny names its reason.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    AccountInactive,
    CrossTenant,
    InsufficientRank,
    NotAuthorized,
}

impl DenyReason {
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::AccountInactive => "account_inactive",
            DenyReason::CrossTenant => "cross_tenant",
            DenyReason::InsufficientRank => "insufficient_rank",
            DenyReason::NotAuthorized => "not_authorized",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }

    /// Label used for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny(reason) => reason.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_carries_reason() {
        let decision = Decision::Deny(DenyReason::CrossTenant);
        assert!(!decision.is_allowed());
        assert_eq!(decision.deny_reason(), Some(DenyReason::CrossTenant));
        assert_eq!(decision.label(), "cross_tenant");
        assert_eq!(Decision::Allow.deny_reason(), None);
    }

    #[test]
    fn decision_serializes_with_reason() {
        let json = serde_json::to_value(Decision::Deny(DenyReason::InsufficientRank))
            .expect("serialize");
        assert_eq!(json["decision"], "deny");
        assert_eq!(json["reason"], "insufficient_rank");
    }
}
