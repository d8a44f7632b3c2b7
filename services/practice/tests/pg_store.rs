#![cfg(feature = "pg-tests")]
//! Postgres-backed practice store tests.
//!
//! Run with `cargo test -p practice --features pg-tests pg_store` and
//! `PRECEDENT_TEST_DATABASE_URL` pointing at a disposable database. Tests are
//! skipped when no database is reachable.

use chrono::Utc;
use practice::config;
use practice::model::{AccessGrant, AuditAction, AuditEvent, Case, CaseStatus, Organization, User};
use practice::store::postgres::PostgresStore;
use practice::store::{AuditFilter, CaseFilter, GrantFilter, PracticeStore, StoreError};
use precedent_authz::{GrantError, OrganizationId, Role, Scope};
use serial_test::serial;
use std::collections::BTreeSet;
use uuid::Uuid;

async fn pg_store() -> Option<PostgresStore> {
    let url = match std::env::var("PRECEDENT_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping pg-tests: set PRECEDENT_TEST_DATABASE_URL or DATABASE_URL");
            return None;
        }
    };
    let pg_cfg = config::PostgresConfig {
        url,
        max_connections: 5,
        connect_timeout_ms: 5_000,
        acquire_timeout_ms: 5_000,
    };
    let store = match PostgresStore::connect(&pg_cfg).await {
        Ok(store) => store,
        Err(err) => {
            eprintln!("skipping pg-tests: cannot connect to postgres: {err}");
            return None;
        }
    };
    sqlx::query(
        "TRUNCATE audit_events, judges, holidays, holiday_calendars, courts, subscriptions, contacts, deadlines, cases, access_grants, api_tokens, users, organizations CASCADE",
    )
    .execute(store.pool())
    .await
    .expect("truncate");
    Some(store)
}

async fn seed_member(store: &PostgresStore, org: &Organization, role: Role, email: &str) -> User {
    store
        .create_user(User::new(email, email, Some(org.id), role, None))
        .await
        .expect("user")
}

async fn seed_case(store: &PostgresStore, org: &Organization, lead: &User, caption: &str) -> Case {
    let now = Utc::now();
    store
        .create_case(Case {
            id: Uuid::new_v4(),
            organization_id: org.id,
            caption: caption.to_string(),
            case_number: None,
            status: CaseStatus::Open,
            lead_practitioner_id: Some(lead.id),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("case")
}

#[tokio::test]
#[serial]
async fn duplicate_active_grant_is_rejected() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org");
    let admin = seed_member(&store, &org, Role::TenantAdmin, "admin@one.test").await;
    let assistant = seed_member(&store, &org, Role::Assistant, "a@one.test").await;
    let colleague = seed_member(&store, &org, Role::Assistant, "b@one.test").await;

    let grant = store
        .create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id))
        .await
        .expect("grant");
    let err = store
        .create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, StoreError::Grant(GrantError::DuplicateGrant)));

    let revoked = store.revoke_grant(grant.id).await.expect("revoke");
    assert!(!revoked.is_active);
    let again = store.revoke_grant(grant.id).await.expect("revoke twice");
    assert!(!again.is_active);

    // A revoked pair may be granted again.
    let regranted = store
        .create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id))
        .await
        .expect("regrant");
    assert!(regranted.is_active);
    let active = store
        .list_grants(GrantFilter::received_by(assistant.id))
        .await
        .expect("received");
    assert_eq!(active.len(), 1);
    let history = store
        .list_grants(GrantFilter {
            include_inactive: true,
            ..GrantFilter::received_by(assistant.id)
        })
        .await
        .expect("received");
    assert_eq!(history.len(), 2);
}

#[tokio::test]
#[serial]
async fn concurrent_creates_for_one_pair_admit_exactly_one() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org");
    let admin = seed_member(&store, &org, Role::TenantAdmin, "admin@one.test").await;
    let assistant = seed_member(&store, &org, Role::Assistant, "a@one.test").await;
    let colleague = seed_member(&store, &org, Role::Assistant, "b@one.test").await;

    let (first, second) = tokio::join!(
        store.create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id)),
        store.create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id)),
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(StoreError::Grant(GrantError::DuplicateGrant))
    )));
    let active = store
        .list_grants(GrantFilter::received_by(assistant.id))
        .await
        .expect("received");
    assert_eq!(active.len(), 1);
}

#[tokio::test]
#[serial]
async fn role_change_revokes_incompatible_grants_in_one_transaction() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org");
    let admin = seed_member(&store, &org, Role::TenantAdmin, "admin@one.test").await;
    let assistant = seed_member(&store, &org, Role::Assistant, "a@one.test").await;
    let mut colleague = seed_member(&store, &org, Role::Assistant, "b@one.test").await;
    let managing = seed_member(&store, &org, Role::ManagingPractitioner, "m@one.test").await;
    let upward = store
        .create_grant(AccessGrant::new(org.id, admin.id, assistant.id, colleague.id))
        .await
        .expect("grant");
    let downward = store
        .create_grant(AccessGrant::new(org.id, admin.id, managing.id, colleague.id))
        .await
        .expect("grant");

    colleague.role = Role::ManagingPractitioner;
    let (stored, revoked) = store.update_user_role(colleague).await.expect("promote");
    assert_eq!(stored.role, Role::ManagingPractitioner);
    assert_eq!(revoked.iter().map(|g| g.id).collect::<Vec<_>>(), vec![upward.id]);
    assert!(!store.get_grant(upward.id).await.expect("grant").is_active);
    assert!(store.get_grant(downward.id).await.expect("grant").is_active);
}

#[tokio::test]
#[serial]
async fn audit_events_keep_json_snapshots() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org");
    let admin = seed_member(&store, &org, Role::TenantAdmin, "admin@one.test").await;
    let event = AuditEvent::new(&admin, Some(org.id), "users", admin.id, AuditAction::Update)
        .before(&admin)
        .after(&admin);
    store.record_audit_event(event.clone()).await.expect("record");

    let firm = Scope::Organization {
        organization_id: OrganizationId::from(org.id),
        exclude_platform_accounts: false,
    };
    let listed = store
        .list_audit_events(
            &firm,
            AuditFilter {
                entity_table: Some("users".to_string()),
                entity_id: Some(admin.id),
            },
        )
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].action, AuditAction::Update);
    assert_eq!(listed[0].after, event.after);
    assert!(store
        .list_audit_events(&Scope::Nothing, AuditFilter::default())
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
#[serial]
async fn scoped_case_listing_is_pushed_down() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org1 = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org1");
    let org2 = store
        .create_organization(Organization::new("Org Two"))
        .await
        .expect("org2");
    let p1 = seed_member(&store, &org1, Role::Practitioner, "p1@one.test").await;
    let p2 = seed_member(&store, &org1, Role::Practitioner, "p2@one.test").await;
    let other = seed_member(&store, &org2, Role::Practitioner, "p@two.test").await;
    let own = seed_case(&store, &org1, &p1, "One v. A").await;
    seed_case(&store, &org1, &p2, "One v. B").await;
    seed_case(&store, &org2, &other, "Two v. A").await;

    let firm = Scope::Organization {
        organization_id: OrganizationId::from(org1.id),
        exclude_platform_accounts: true,
    };
    let cases = store.list_cases(&firm, CaseFilter::default()).await.expect("firm");
    assert_eq!(cases.len(), 2);

    let owners = Scope::Owners {
        organization_id: OrganizationId::from(org1.id),
        owner_ids: BTreeSet::from([p1.user_id()]),
    };
    let cases = store.list_cases(&owners, CaseFilter::default()).await.expect("owners");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].id, own.id);

    let none = store
        .list_cases(&Scope::Nothing, CaseFilter::default())
        .await
        .expect("nothing");
    assert!(none.is_empty());
    let all = store
        .list_cases(&Scope::Everything, CaseFilter::default())
        .await
        .expect("everything");
    assert_eq!(all.len(), 3);
}

#[tokio::test]
#[serial]
async fn duplicate_email_and_seat_count() {
    let Some(store) = pg_store().await else {
        return;
    };
    let org = store
        .create_organization(Organization::new("Org One"))
        .await
        .expect("org");
    let mut user = seed_member(&store, &org, Role::Practitioner, "p@one.test").await;
    let err = store
        .create_user(User::new("p@one.test", "Again", Some(org.id), Role::Assistant, None))
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.count_active_users(org.id).await.expect("count"), 1);

    user.is_active = false;
    store.update_user(user).await.expect("deactivate");
    assert_eq!(store.count_active_users(org.id).await.expect("count"), 0);
}
