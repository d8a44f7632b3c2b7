//! Per-request access context.
//!
//! # Purpose
//! Resolves the bearer token to a stored user, loads the grants that user has
//! received, and wraps the access-control engine so handlers authorize with a
//! single call that also records the decision.
//!
//! # Key invariants
//! - Grants are loaded fresh for every request; a revoked grant stops
//!   applying on the next request.
//! - Inactive users still authenticate, so they get `403 account_inactive`
//!   instead of an ambiguous `401`.
use crate::api::error::{ApiError, api_denied, api_internal, api_not_found, api_unauthorized};
use crate::app::AppState;
use crate::auth::token::{extract_bearer, hash_token};
use crate::model::{AccessGrant, User};
use crate::store::GrantFilter;
use crate::observability::record_decision;
use axum::http::HeaderMap;
use precedent_authz::{
    Action, Actor, Decision, DenyReason, GrantEdge, GrantSet, OwnedRecord, ResourceKind, Scope,
    Target, authorize, scope_queryset,
};

#[derive(Debug, Clone)]
pub struct AccessContext {
    pub user: User,
    pub actor: Actor,
    pub grants: GrantSet,
}

impl AccessContext {
    pub fn new(user: User, received: &[AccessGrant]) -> Self {
        let actor = user.actor();
        let edges: Vec<GrantEdge> = received.iter().map(AccessGrant::edge).collect();
        let grants = GrantSet::for_actor(&actor, edges.iter());
        Self {
            user,
            actor,
            grants,
        }
    }

    pub fn authorize<'a>(&self, action: Action, target: impl Into<Target<'a>>) -> Decision {
        let target = target.into();
        let kind = target.kind();
        let decision = authorize(&self.actor, &self.grants, action, target);
        record_decision(action, kind, decision);
        decision
    }

    /// Turn a deny into `403` carrying the reason code.
    pub fn require<'a>(
        &self,
        action: Action,
        target: impl Into<Target<'a>>,
    ) -> Result<(), ApiError> {
        match self.authorize(action, target) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(api_denied(reason)),
        }
    }

    /// Authorize an action on an existing record.
    ///
    /// Records the actor cannot view at all answer `404`, so their existence
    /// is not disclosed; a visible record the actor may not change answers
    /// `403`.
    pub fn require_record<R>(&self, action: Action, record: &R, what: &str) -> Result<(), ApiError>
    where
        R: OwnedRecord + ?Sized,
    {
        let view = record.record_ref();
        if let Decision::Deny(reason) = self.authorize(Action::View, &view) {
            return Err(match reason {
                DenyReason::CrossTenant | DenyReason::NotAuthorized => {
                    api_not_found(&format!("{what} not found"))
                }
                other => api_denied(other),
            });
        }
        if action != Action::View {
            self.require(action, &view)?;
        }
        Ok(())
    }

    pub fn scope(&self, kind: ResourceKind) -> Scope {
        scope_queryset(&self.actor, &self.grants, kind)
    }
}

pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AccessContext, ApiError> {
    let bearer =
        extract_bearer(headers).ok_or_else(|| api_unauthorized("missing bearer token"))?;
    let user = state
        .store
        .user_for_token(&hash_token(bearer))
        .await
        .map_err(|err| api_internal("failed to resolve token", &err))?
        .ok_or_else(|| api_unauthorized("invalid token"))?;
    let received = state
        .store
        .list_grants(GrantFilter::received_by(user.id))
        .await
        .map_err(|err| api_internal("failed to load access grants", &err))?;
    tracing::debug!(user_id = %user.id, role = %user.role, "request authenticated");
    Ok(AccessContext::new(user, &received))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Case;
    use axum::http::StatusCode;
    use chrono::Utc;
    use precedent_authz::Role;
    use uuid::Uuid;

    fn case_led_by(org: Uuid, lead: Uuid) -> Case {
        let now = Utc::now();
        Case {
            id: Uuid::new_v4(),
            organization_id: org,
            caption: "Doe v. Roe".to_string(),
            case_number: None,
            status: Default::default(),
            lead_practitioner_id: Some(lead),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn received_grants_widen_visibility() {
        let org = Uuid::new_v4();
        let assistant = User::new("a@firm.test", "A", Some(org), Role::Assistant, None);
        let colleague = User::new("b@firm.test", "B", Some(org), Role::Assistant, None);
        let grant = AccessGrant::new(org, Uuid::new_v4(), assistant.id, colleague.id);
        let case = case_led_by(org, colleague.id);

        let without = AccessContext::new(assistant.clone(), &[]);
        let err = without
            .require_record(Action::View, &case, "case")
            .expect_err("hidden");
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let with = AccessContext::new(assistant, &[grant]);
        with.require_record(Action::Update, &case, "case")
            .expect("grant allows");
        assert!(with.scope(ResourceKind::Case).matches(&case.record_ref()));
    }

    #[test]
    fn visible_but_forbidden_is_403() {
        let org = Uuid::new_v4();
        let practitioner = User::new("p@firm.test", "P", Some(org), Role::Practitioner, None);
        let context = AccessContext::new(practitioner.clone(), &[]);
        let err = context
            .require_record(Action::Delete, &practitioner, "user")
            .expect_err("cannot delete own account");
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.reason.as_deref(), Some("insufficient_rank"));
    }

    #[test]
    fn inactive_actor_is_forbidden_not_hidden() {
        let org = Uuid::new_v4();
        let mut user = User::new("p@firm.test", "P", Some(org), Role::Practitioner, None);
        user.is_active = false;
        let case = case_led_by(org, user.id);
        let context = AccessContext::new(user, &[]);
        let err = context
            .require_record(Action::View, &case, "case")
            .expect_err("inactive");
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.reason.as_deref(), Some("account_inactive"));
    }
}
