use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    ManageGrants,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::ManageGrants => "manage_grants",
        }
    }

    /// Create, update and delete change stored state.
    pub fn is_mutation(self) -> bool {
        matches!(self, Action::Create | Action::Update | Action::Delete)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        match value {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "manage_grants" => Ok(Action::ManageGrants),
            _ => Err(AuthzError::InvalidAction(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Action;

    #[test]
    fn action_string_roundtrip() {
        let actions = [
            Action::View,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::ManageGrants,
        ];
        for action in actions {
            assert_eq!(action.as_str().parse::<Action>().ok(), Some(action));
        }
    }

    #[test]
    fn action_from_str_invalid() {
        assert!("approve".parse::<Action>().is_err());
    }

    #[test]
    fn only_crud_writes_are_mutations() {
        assert!(!Action::View.is_mutation());
        assert!(!Action::ManageGrants.is_mutation());
        assert!(Action::Delete.is_mutation());
    }
}
