use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid resource kind: {0}")]
    InvalidResourceKind(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
