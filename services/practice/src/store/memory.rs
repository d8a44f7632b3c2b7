//! In-memory implementation of [`PracticeStore`].
//!
//! # Purpose
//! Keeps every table in a `HashMap` behind `tokio::sync::RwLock`. Used for
//! local development, tests, and deployments that do not need durability.
//!
//! # Consistency
//! - Not durable: all state is lost on restart.
//! - Mutations take the write lock of the map they touch, so the active-pair
//!   uniqueness check and the insert of a grant happen atomically.
//! - A role change holds the user and grant locks together, in that order.
//! - Scoped listings evaluate [`Scope::matches`] against each record.
use super::{
    AuditFilter, CaseFilter, DeadlineFilter, GrantFilter, PracticeStore, StoreError, StoreResult,
};
use crate::model::{
    AccessGrant, AuditEvent, Case, Contact, Court, Deadline, Holiday, HolidayCalendar, Judge,
    Organization, Subscription, User,
};
use async_trait::async_trait;
use chrono::Utc;
use precedent_authz::{GrantError, OwnedRecord, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

type Table<T> = Arc<RwLock<HashMap<Uuid, T>>>;

#[derive(Default)]
pub struct InMemoryStore {
    organizations: Table<Organization>,
    users: Table<User>,
    /// Bearer token SHA-256 hex digest to user id.
    api_tokens: Arc<RwLock<HashMap<String, Uuid>>>,
    grants: Table<AccessGrant>,
    cases: Table<Case>,
    deadlines: Table<Deadline>,
    contacts: Table<Contact>,
    /// Keyed by organization id.
    subscriptions: Table<Subscription>,
    courts: Table<Court>,
    judges: Table<Judge>,
    holiday_calendars: Table<HolidayCalendar>,
    audit_events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn scoped<T, K>(items: &HashMap<Uuid, T>, scope: &Scope, created_at: K) -> Vec<T>
where
    T: OwnedRecord + Clone,
    K: Fn(&T) -> chrono::DateTime<Utc>,
{
    let mut visible = scope.filter(items.values().cloned(), |item| item.record_ref());
    visible.sort_by_key(|item| created_at(item));
    visible
}

fn sorted_grants(mut grants: Vec<AccessGrant>) -> Vec<AccessGrant> {
    grants.sort_by_key(|grant| (grant.created_at, grant.id));
    grants
}

fn not_found<T>(what: &str) -> StoreResult<T> {
    Err(StoreError::NotFound(what.into()))
}

fn publish_active_grants(grants: &HashMap<Uuid, AccessGrant>) {
    let active = grants.values().filter(|grant| grant.is_active).count();
    metrics::gauge!("precedent_access_grants_active").set(active as f64);
}

#[async_trait]
impl PracticeStore for InMemoryStore {
    async fn list_organizations(&self, scope: &Scope) -> StoreResult<Vec<Organization>> {
        let organizations = self.organizations.read().await;
        Ok(scoped(&organizations, scope, |org| org.created_at))
    }

    async fn get_organization(&self, id: Uuid) -> StoreResult<Organization> {
        self.organizations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("organization".into()))
    }

    async fn create_organization(&self, organization: Organization) -> StoreResult<Organization> {
        let mut organizations = self.organizations.write().await;
        if organizations.contains_key(&organization.id) {
            return Err(StoreError::Conflict("organization exists".into()));
        }
        organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn deactivate_organization(&self, id: Uuid) -> StoreResult<Organization> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("organization".into()))?;
        if organization.is_active {
            organization.is_active = false;
            organization.updated_at = Utc::now();
        }
        Ok(organization.clone())
    }

    async fn list_users(&self, scope: &Scope) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(scoped(&users, scope, |user| user.created_at))
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let existing = users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound("user".into()))?;
        user.updated_at = Utc::now();
        *existing = user.clone();
        Ok(user)
    }

    async fn update_user_role(&self, mut user: User) -> StoreResult<(User, Vec<AccessGrant>)> {
        let mut users = self.users.write().await;
        let mut grants = self.grants.write().await;
        let Some(existing) = users.get_mut(&user.id) else {
            return not_found("user");
        };
        let now = Utc::now();
        user.updated_at = now;
        *existing = user.clone();

        let mut revoked = Vec::new();
        for grant in grants.values_mut().filter(|grant| {
            grant.is_active && (grant.granted_to == user.id || grant.can_access_user == user.id)
        }) {
            let (Some(grantee), Some(target)) =
                (users.get(&grant.granted_to), users.get(&grant.can_access_user))
            else {
                continue;
            };
            if !grantee.role.can_be_granted(target.role) {
                grant.is_active = false;
                grant.updated_at = now;
                revoked.push(grant.clone());
            }
        }
        publish_active_grants(&grants);
        Ok((user, sorted_grants(revoked)))
    }

    async fn count_active_users(&self, organization_id: Uuid) -> StoreResult<u64> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|user| user.is_active && user.organization_id == Some(organization_id))
            .count() as u64)
    }

    async fn insert_api_token(&self, token_hash: &str, user_id: Uuid) -> StoreResult<()> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(StoreError::NotFound("user".into()));
        }
        let mut tokens = self.api_tokens.write().await;
        if tokens.contains_key(token_hash) {
            return Err(StoreError::Conflict("token exists".into()));
        }
        tokens.insert(token_hash.to_string(), user_id);
        Ok(())
    }

    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let Some(user_id) = self.api_tokens.read().await.get(token_hash).copied() else {
            return Ok(None);
        };
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn create_grant(&self, grant: AccessGrant) -> StoreResult<AccessGrant> {
        let mut grants = self.grants.write().await;
        if grants
            .values()
            .any(|existing| existing.is_active && existing.same_pair(&grant))
        {
            return Err(GrantError::DuplicateGrant.into());
        }
        grants.insert(grant.id, grant.clone());
        publish_active_grants(&grants);
        Ok(grant)
    }

    async fn revoke_grant(&self, id: Uuid) -> StoreResult<AccessGrant> {
        let mut grants = self.grants.write().await;
        let grant = grants
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("access grant".into()))?;
        if grant.is_active {
            grant.is_active = false;
            grant.updated_at = Utc::now();
        }
        let revoked = grant.clone();
        publish_active_grants(&grants);
        Ok(revoked)
    }

    async fn get_grant(&self, id: Uuid) -> StoreResult<AccessGrant> {
        self.grants
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("access grant".into()))
    }

    async fn list_grants(&self, filter: GrantFilter) -> StoreResult<Vec<AccessGrant>> {
        let grants = self.grants.read().await;
        Ok(sorted_grants(
            grants
                .values()
                .filter(|grant| filter.matches(grant))
                .cloned()
                .collect(),
        ))
    }

    async fn list_cases(&self, scope: &Scope, filter: CaseFilter) -> StoreResult<Vec<Case>> {
        let cases = self.cases.read().await;
        let mut visible = scoped(&cases, scope, |case| case.created_at);
        if let Some(status) = filter.status {
            visible.retain(|case| case.status == status);
        }
        Ok(visible)
    }

    async fn get_case(&self, id: Uuid) -> StoreResult<Case> {
        self.cases
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("case".into()))
    }

    async fn create_case(&self, case: Case) -> StoreResult<Case> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(&case.id) {
            return Err(StoreError::Conflict("case exists".into()));
        }
        cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn update_case(&self, mut case: Case) -> StoreResult<Case> {
        let mut cases = self.cases.write().await;
        let existing = cases
            .get_mut(&case.id)
            .ok_or_else(|| StoreError::NotFound("case".into()))?;
        case.updated_at = Utc::now();
        *existing = case.clone();
        Ok(case)
    }

    async fn delete_case(&self, id: Uuid) -> StoreResult<()> {
        let mut cases = self.cases.write().await;
        if cases.remove(&id).is_none() {
            return Err(StoreError::NotFound("case".into()));
        }
        // Deadlines cascade with their case.
        self.deadlines
            .write()
            .await
            .retain(|_, deadline| deadline.case_id != id);
        Ok(())
    }

    async fn list_deadlines(
        &self,
        scope: &Scope,
        filter: DeadlineFilter,
    ) -> StoreResult<Vec<Deadline>> {
        let deadlines = self.deadlines.read().await;
        let mut visible = scope.filter(deadlines.values().cloned(), |d| d.record_ref());
        visible.retain(|deadline| {
            filter.case_id.is_none_or(|case_id| deadline.case_id == case_id)
                && filter.status.is_none_or(|status| deadline.status == status)
        });
        visible.sort_by_key(|deadline| (deadline.due_at, deadline.id));
        Ok(visible)
    }

    async fn get_deadline(&self, id: Uuid) -> StoreResult<Deadline> {
        self.deadlines
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("deadline".into()))
    }

    async fn create_deadline(&self, deadline: Deadline) -> StoreResult<Deadline> {
        if !self.cases.read().await.contains_key(&deadline.case_id) {
            return Err(StoreError::NotFound("case".into()));
        }
        self.deadlines
            .write()
            .await
            .insert(deadline.id, deadline.clone());
        Ok(deadline)
    }

    async fn update_deadline(&self, mut deadline: Deadline) -> StoreResult<Deadline> {
        let mut deadlines = self.deadlines.write().await;
        let existing = deadlines
            .get_mut(&deadline.id)
            .ok_or_else(|| StoreError::NotFound("deadline".into()))?;
        deadline.updated_at = Utc::now();
        *existing = deadline.clone();
        Ok(deadline)
    }

    async fn list_contacts(&self, scope: &Scope) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(scoped(&contacts, scope, |contact| contact.created_at))
    }

    async fn get_contact(&self, id: Uuid) -> StoreResult<Contact> {
        self.contacts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("contact".into()))
    }

    async fn create_contact(&self, contact: Contact) -> StoreResult<Contact> {
        self.contacts
            .write()
            .await
            .insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn list_subscriptions(&self, scope: &Scope) -> StoreResult<Vec<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(scoped(&subscriptions, scope, |sub| sub.created_at))
    }

    async fn subscription_for(&self, organization_id: Uuid) -> StoreResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .get(&organization_id)
            .cloned())
    }

    async fn upsert_subscription(
        &self,
        mut subscription: Subscription,
    ) -> StoreResult<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(existing) = subscriptions.get(&subscription.organization_id) {
            subscription.id = existing.id;
            subscription.created_at = existing.created_at;
        }
        subscription.updated_at = Utc::now();
        subscriptions.insert(subscription.organization_id, subscription.clone());
        Ok(subscription)
    }

    async fn list_courts(&self, scope: &Scope) -> StoreResult<Vec<Court>> {
        let courts = self.courts.read().await;
        let mut visible = scope.filter(courts.values().cloned(), |court| court.record_ref());
        visible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(visible)
    }

    async fn get_court(&self, id: Uuid) -> StoreResult<Court> {
        match self.courts.read().await.get(&id) {
            Some(court) => Ok(court.clone()),
            None => not_found("court"),
        }
    }

    async fn create_court(&self, court: Court) -> StoreResult<Court> {
        self.courts.write().await.insert(court.id, court.clone());
        Ok(court)
    }

    async fn delete_court(&self, id: Uuid) -> StoreResult<()> {
        let mut courts = self.courts.write().await;
        if courts.remove(&id).is_none() {
            return not_found("court");
        }
        let now = Utc::now();
        for judge in self
            .judges
            .write()
            .await
            .values_mut()
            .filter(|judge| judge.court_id == Some(id))
        {
            judge.court_id = None;
            judge.updated_at = now;
        }
        Ok(())
    }

    async fn list_judges(&self, scope: &Scope, court_id: Option<Uuid>) -> StoreResult<Vec<Judge>> {
        let judges = self.judges.read().await;
        let mut visible = scope.filter(judges.values().cloned(), |judge| judge.record_ref());
        visible.retain(|judge| court_id.is_none_or(|court| judge.court_id == Some(court)));
        visible.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(visible)
    }

    async fn get_judge(&self, id: Uuid) -> StoreResult<Judge> {
        match self.judges.read().await.get(&id) {
            Some(judge) => Ok(judge.clone()),
            None => not_found("judge"),
        }
    }

    async fn create_judge(&self, judge: Judge) -> StoreResult<Judge> {
        if let Some(court_id) = judge.court_id {
            if !self.courts.read().await.contains_key(&court_id) {
                return not_found("court");
            }
        }
        if let Some(calendar_id) = judge.holiday_calendar_id {
            if !self.holiday_calendars.read().await.contains_key(&calendar_id) {
                return not_found("holiday calendar");
            }
        }
        self.judges.write().await.insert(judge.id, judge.clone());
        Ok(judge)
    }

    async fn delete_judge(&self, id: Uuid) -> StoreResult<()> {
        match self.judges.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => not_found("judge"),
        }
    }

    async fn list_holiday_calendars(&self, scope: &Scope) -> StoreResult<Vec<HolidayCalendar>> {
        let calendars = self.holiday_calendars.read().await;
        let mut visible = scope.filter(calendars.values().cloned(), |c| c.record_ref());
        visible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(visible)
    }

    async fn get_holiday_calendar(&self, id: Uuid) -> StoreResult<HolidayCalendar> {
        match self.holiday_calendars.read().await.get(&id) {
            Some(calendar) => Ok(calendar.clone()),
            None => not_found("holiday calendar"),
        }
    }

    async fn create_holiday_calendar(
        &self,
        calendar: HolidayCalendar,
    ) -> StoreResult<HolidayCalendar> {
        self.holiday_calendars
            .write()
            .await
            .insert(calendar.id, calendar.clone());
        Ok(calendar)
    }

    async fn add_holiday(
        &self,
        calendar_id: Uuid,
        holiday: Holiday,
    ) -> StoreResult<HolidayCalendar> {
        let mut calendars = self.holiday_calendars.write().await;
        let Some(calendar) = calendars.get_mut(&calendar_id) else {
            return not_found("holiday calendar");
        };
        if calendar.is_holiday(holiday.date) {
            return Err(StoreError::Conflict("holiday already on this date".into()));
        }
        calendar.holidays.push(holiday);
        calendar.holidays.sort_by_key(|holiday| holiday.date);
        calendar.updated_at = Utc::now();
        Ok(calendar.clone())
    }

    async fn record_audit_event(&self, event: AuditEvent) -> StoreResult<AuditEvent> {
        self.audit_events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_audit_events(
        &self,
        scope: &Scope,
        filter: AuditFilter,
    ) -> StoreResult<Vec<AuditEvent>> {
        let events = self.audit_events.read().await;
        let mut visible = scope.filter(events.iter().cloned(), |event| event.record_ref());
        visible.retain(|event| filter.matches(event));
        visible.reverse();
        Ok(visible)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaseStatus;
    use precedent_authz::{Actor, GrantSet, ResourceKind, Role, UserId, scope_queryset};

    fn case(org: Uuid, lead: Option<Uuid>) -> Case {
        let now = Utc::now();
        Case {
            id: Uuid::new_v4(),
            organization_id: org,
            caption: "Doe v. Roe".to_string(),
            case_number: None,
            status: CaseStatus::Open,
            lead_practitioner_id: lead,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_active_grant_is_rejected_until_revoked() {
        let store = InMemoryStore::new();
        let org = Uuid::new_v4();
        let (admin, grantee, target) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let first = store
            .create_grant(AccessGrant::new(org, admin, grantee, target))
            .await
            .expect("first grant");
        let err = store
            .create_grant(AccessGrant::new(org, admin, grantee, target))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Grant(GrantError::DuplicateGrant)));

        store.revoke_grant(first.id).await.expect("revoke");
        store
            .create_grant(AccessGrant::new(org, admin, grantee, target))
            .await
            .expect("grant after revoke");
        let active = store
            .list_grants(GrantFilter::received_by(grantee))
            .await
            .expect("list");
        assert_eq!(active.len(), 1);
        let history = store
            .list_grants(GrantFilter {
                include_inactive: true,
                ..GrantFilter::received_by(grantee)
            })
            .await
            .expect("list");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_for_one_pair_admit_exactly_one() {
        let store = Arc::new(InMemoryStore::new());
        let (org, admin, grantee, target) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for _ in 0..20 {
            let spawn_create = || {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_grant(AccessGrant::new(org, admin, grantee, target))
                        .await
                })
            };
            let (first, second) = tokio::join!(spawn_create(), spawn_create());
            let results = [first.expect("join"), second.expect("join")];
            let created: Vec<&AccessGrant> =
                results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(created.len(), 1);
            assert!(results.iter().any(|r| matches!(
                r,
                Err(StoreError::Grant(GrantError::DuplicateGrant))
            )));
            store.revoke_grant(created[0].id).await.expect("revoke");
        }
    }

    #[tokio::test]
    async fn role_change_revokes_incompatible_grants() {
        let store = InMemoryStore::new();
        let org = Some(Uuid::new_v4());
        let admin = store
            .create_user(User::new("admin@firm.test", "Admin", org, Role::TenantAdmin, None))
            .await
            .expect("admin");
        let assistant = store
            .create_user(User::new("a@firm.test", "A", org, Role::Assistant, None))
            .await
            .expect("assistant");
        let mut colleague = store
            .create_user(User::new("b@firm.test", "B", org, Role::Assistant, None))
            .await
            .expect("colleague");
        let managing = store
            .create_user(User::new("m@firm.test", "M", org, Role::ManagingPractitioner, None))
            .await
            .expect("managing");
        let org_id = org.expect("org");
        let upward = store
            .create_grant(AccessGrant::new(org_id, admin.id, assistant.id, colleague.id))
            .await
            .expect("grant");
        let downward = store
            .create_grant(AccessGrant::new(org_id, admin.id, managing.id, colleague.id))
            .await
            .expect("grant");

        colleague.role = Role::ManagingPractitioner;
        let (stored, revoked) = store.update_user_role(colleague).await.expect("promote");
        assert_eq!(stored.role, Role::ManagingPractitioner);
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked[0].id, upward.id);
        assert!(!store.get_grant(upward.id).await.expect("grant").is_active);
        assert!(store.get_grant(downward.id).await.expect("grant").is_active);
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = InMemoryStore::new();
        let grant = store
            .create_grant(AccessGrant::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
            ))
            .await
            .expect("grant");
        let once = store.revoke_grant(grant.id).await.expect("revoke");
        let twice = store.revoke_grant(grant.id).await.expect("revoke again");
        assert!(!once.is_active);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn case_listing_is_scoped_before_status_filter() {
        let store = InMemoryStore::new();
        let org = Uuid::new_v4();
        let lead = Uuid::new_v4();
        let mine = store.create_case(case(org, Some(lead))).await.expect("case");
        let mut closed = case(org, Some(lead));
        closed.status = CaseStatus::Closed;
        store.create_case(closed).await.expect("case");
        store
            .create_case(case(org, Some(Uuid::new_v4())))
            .await
            .expect("case");

        let actor = Actor::new(
            UserId::from(lead),
            Some(crate::model::org_id(org)),
            Role::Practitioner,
        );
        let scope = scope_queryset(&actor, &GrantSet::empty(), ResourceKind::Case);
        let all = store.list_cases(&scope, CaseFilter::default()).await.expect("list");
        assert_eq!(all.len(), 2);
        let open = store
            .list_cases(
                &scope,
                CaseFilter {
                    status: Some(CaseStatus::Open),
                },
            )
            .await
            .expect("list");
        assert_eq!(open, vec![mine]);
    }

    #[tokio::test]
    async fn deleting_a_case_removes_its_deadlines() {
        let store = InMemoryStore::new();
        let org = Uuid::new_v4();
        let parent = store.create_case(case(org, None)).await.expect("case");
        let now = Utc::now();
        let deadline = Deadline {
            id: Uuid::new_v4(),
            case_id: parent.id,
            organization_id: org,
            title: "Answer due".to_string(),
            due_at: now,
            owner_id: None,
            status: Default::default(),
            priority: 3,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        store.create_deadline(deadline.clone()).await.expect("deadline");
        store.delete_case(parent.id).await.expect("delete");
        assert!(matches!(
            store.get_deadline(deadline.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let store = InMemoryStore::new();
        let org = Some(Uuid::new_v4());
        store
            .create_user(User::new("a@firm.test", "A", org, Role::Assistant, None))
            .await
            .expect("user");
        let err = store
            .create_user(User::new("A@Firm.test", "A2", org, Role::Assistant, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_active_users(org.expect("org")).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn removing_a_court_keeps_its_judges() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let court = store
            .create_court(Court {
                id: Uuid::new_v4(),
                name: "District Court".to_string(),
                district: None,
                division: None,
                location: None,
                timezone: "America/New_York".to_string(),
                website_url: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("court");
        let judge = store
            .create_judge(Judge {
                id: Uuid::new_v4(),
                full_name: "Hon. A. Jones".to_string(),
                court_id: Some(court.id),
                courtroom: None,
                chambers_url: None,
                contact_email: None,
                contact_phone: None,
                holiday_calendar_id: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("judge");
        assert_eq!(
            store
                .list_judges(&Scope::Everything, Some(court.id))
                .await
                .expect("judges")
                .len(),
            1
        );
        store.delete_court(court.id).await.expect("delete");
        assert_eq!(store.get_judge(judge.id).await.expect("judge").court_id, None);
        assert!(store
            .list_judges(&Scope::Nothing, None)
            .await
            .expect("judges")
            .is_empty());
    }

    #[tokio::test]
    async fn holidays_are_unique_per_date() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let calendar = store
            .create_holiday_calendar(HolidayCalendar {
                id: Uuid::new_v4(),
                name: "Federal".to_string(),
                jurisdiction: None,
                timezone: "America/New_York".to_string(),
                source_url: None,
                holidays: Vec::new(),
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("calendar");
        let date = chrono::NaiveDate::from_ymd_opt(2026, 7, 3).expect("date");
        let holiday = Holiday {
            date,
            name: "Independence Day (observed)".to_string(),
        };
        let updated = store
            .add_holiday(calendar.id, holiday.clone())
            .await
            .expect("holiday");
        assert!(updated.is_holiday(date));
        assert!(matches!(
            store.add_holiday(calendar.id, holiday).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn tokens_resolve_to_users() {
        let store = InMemoryStore::new();
        let user = store
            .create_user(User::new("p@firm.test", "P", None, Role::PlatformAdmin, None))
            .await
            .expect("user");
        store.insert_api_token("abc", user.id).await.expect("token");
        assert_eq!(
            store.user_for_token("abc").await.expect("lookup").map(|u| u.id),
            Some(user.id)
        );
        assert!(store.user_for_token("nope").await.expect("lookup").is_none());
    }
}
