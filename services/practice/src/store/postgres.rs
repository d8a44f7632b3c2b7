//! Postgres-backed implementation of [`PracticeStore`].
//!
//! # Key invariants
//! - The schema is migrated at connect time via `sqlx::migrate!`, before any
//!   request is served.
//! - Active-grant uniqueness is a partial unique index on
//!   `(granted_to, can_access_user) WHERE is_active`; a violation maps to
//!   [`GrantError::DuplicateGrant`], so two concurrent creates for the same
//!   pair cannot both succeed.
//! - A role change and the revocation of the grants it invalidates run in
//!   one transaction, with the affected grant rows locked `FOR UPDATE`.
//! - Scoped listings push the [`Scope`] into SQL as an organization equality
//!   plus an `owner = ANY($n)` clause, never a per-row check in Rust.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log them.
//! - Column names interpolated into SQL come from a fixed set in
//!   `precedent_authz::Ownership::column`, never from request input.
use super::{
    AuditFilter, CaseFilter, DeadlineFilter, GrantFilter, PracticeStore, StoreError, StoreResult,
};
use crate::config::PostgresConfig;
use crate::model::{
    AccessGrant, AuditEvent, Case, Contact, Court, Deadline, Holiday, HolidayCalendar, Judge,
    Organization, Subscription, User,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use precedent_authz::{GrantError, ResourceKind, Role, Scope};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const ORGANIZATION_COLUMNS: &str = "id, name, is_active, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, email, display_name, organization_id, role, is_active, created_by, created_at, updated_at";
const GRANT_COLUMNS: &str =
    "id, organization_id, granted_by, granted_to, can_access_user, is_active, created_at, updated_at";
const CASE_COLUMNS: &str =
    "id, organization_id, caption, case_number, status, lead_practitioner_id, created_at, updated_at";
const DEADLINE_COLUMNS: &str =
    "id, case_id, organization_id, title, due_at, owner_id, status, priority, created_by, created_at, updated_at";
const CONTACT_COLUMNS: &str =
    "id, organization_id, kind, display_name, email, phone, created_by, created_at, updated_at";
const SUBSCRIPTION_COLUMNS: &str =
    "id, organization_id, licensed_users, status, contract_start_date, contract_end_date, created_at, updated_at";
const COURT_COLUMNS: &str =
    "id, name, district, division, location, timezone, website_url, created_at, updated_at";
const JUDGE_COLUMNS: &str = "id, full_name, court_id, courtroom, chambers_url, contact_email, contact_phone, holiday_calendar_id, created_at, updated_at";
const CALENDAR_COLUMNS: &str =
    "id, name, jurisdiction, timezone, source_url, created_at, updated_at";
const AUDIT_COLUMNS: &str =
    "id, organization_id, actor_user_id, entity_table, entity_id, action, before, after, created_at";

/// Durable practice store backed by a pooled Postgres connection.
///
/// # Example
/// ```rust,no_run
/// use practice::config::PostgresConfig;
/// use practice::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbOrganization {
    id: Uuid,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id: Uuid,
    email: String,
    display_name: String,
    organization_id: Option<Uuid>,
    role: String,
    is_active: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbGrant {
    id: Uuid,
    organization_id: Uuid,
    granted_by: Uuid,
    granted_to: Uuid,
    can_access_user: Uuid,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbCase {
    id: Uuid,
    organization_id: Uuid,
    caption: String,
    case_number: Option<String>,
    status: String,
    lead_practitioner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbDeadline {
    id: Uuid,
    case_id: Uuid,
    organization_id: Uuid,
    title: String,
    due_at: DateTime<Utc>,
    owner_id: Option<Uuid>,
    status: String,
    priority: i16,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbContact {
    id: Uuid,
    organization_id: Uuid,
    kind: String,
    display_name: String,
    email: Option<String>,
    phone: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbSubscription {
    id: Uuid,
    organization_id: Uuid,
    licensed_users: i32,
    status: String,
    contract_start_date: NaiveDate,
    contract_end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbCourt {
    id: Uuid,
    name: String,
    district: Option<String>,
    division: Option<String>,
    location: Option<String>,
    timezone: String,
    website_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbJudge {
    id: Uuid,
    full_name: String,
    court_id: Option<Uuid>,
    courtroom: Option<String>,
    chambers_url: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    holiday_calendar_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbHolidayCalendar {
    id: Uuid,
    name: String,
    jurisdiction: Option<String>,
    timezone: String,
    source_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbHoliday {
    calendar_id: Uuid,
    date: NaiveDate,
    name: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbAuditEvent {
    id: Uuid,
    organization_id: Option<Uuid>,
    actor_user_id: Option<Uuid>,
    entity_table: String,
    entity_id: Uuid,
    action: String,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

/// An active grant touching a user whose role is changing, with the roles
/// of both parties as they stand inside the transaction.
#[derive(Debug, FromRow)]
struct DbGrantParties {
    id: Uuid,
    grantee_role: String,
    target_role: String,
}

impl PostgresStore {
    /// Open a pool and run migrations.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = tokio::time::timeout(
            Duration::from_millis(pg.connect_timeout_ms),
            PgPoolOptions::new()
                .max_connections(pg.max_connections)
                .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
                .connect_with(connect_options),
        )
        .await
        .map_err(|_| StoreError::Unexpected(anyhow!("postgres connect timed out")))??;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load calendars and attach their holidays in date order.
    async fn with_holidays(
        &self,
        rows: Vec<DbHolidayCalendar>,
    ) -> StoreResult<Vec<HolidayCalendar>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let holidays = sqlx::query_as::<_, DbHoliday>(
            "SELECT calendar_id, date, name FROM holidays WHERE calendar_id = ANY($1) ORDER BY date",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut by_calendar: HashMap<Uuid, Vec<Holiday>> = HashMap::new();
        for holiday in holidays {
            by_calendar
                .entry(holiday.calendar_id)
                .or_default()
                .push(Holiday {
                    date: holiday.date,
                    name: holiday.name,
                });
        }
        Ok(rows
            .into_iter()
            .map(|row| HolidayCalendar {
                holidays: by_calendar.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                jurisdiction: row.jurisdiction,
                timezone: row.timezone,
                source_url: row.source_url,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn publish_active_grants(&self) {
        let count: Result<i64, sqlx::Error> =
            sqlx::query_scalar("SELECT COUNT(*) FROM access_grants WHERE is_active")
                .fetch_one(&self.pool)
                .await;
        if let Ok(count) = count {
            metrics::gauge!("precedent_access_grants_active").set(count as f64);
        }
    }
}

/// Append the visibility predicate for `kind` to a query that already has a
/// `WHERE` clause.
fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope, kind: ResourceKind) {
    let org_column = if kind == ResourceKind::Organization {
        "id"
    } else {
        "organization_id"
    };
    match scope {
        Scope::Nothing => {
            builder.push(" AND FALSE");
        }
        Scope::Everything => {}
        Scope::Organization {
            organization_id,
            exclude_platform_accounts,
        } => {
            builder
                .push(format_args!(" AND {org_column} = "))
                .push_bind(organization_id.as_uuid());
            if *exclude_platform_accounts {
                builder.push(" AND role <> 'platform_admin'");
            }
        }
        Scope::Owners {
            organization_id,
            owner_ids,
        } => {
            let Some(owner_column) = kind.ownership().column() else {
                builder.push(" AND FALSE");
                return;
            };
            let owners: Vec<Uuid> = owner_ids.iter().map(|id| id.as_uuid()).collect();
            builder
                .push(format_args!(" AND {org_column} = "))
                .push_bind(organization_id.as_uuid())
                .push(format_args!(" AND {owner_column} = ANY("))
                .push_bind(owners)
                .push(")");
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn parse_column<T>(column: &str, value: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| StoreError::Unexpected(anyhow!("invalid {column} value {value:?}: {err}")))
}

fn organization_from_db(row: DbOrganization) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn user_from_db(row: DbUser) -> StoreResult<User> {
    Ok(User {
        id: row.id,
        email: row.email,
        display_name: row.display_name,
        organization_id: row.organization_id,
        role: parse_column::<Role>("role", &row.role)?,
        is_active: row.is_active,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn grant_from_db(row: DbGrant) -> AccessGrant {
    AccessGrant {
        id: row.id,
        organization_id: row.organization_id,
        granted_by: row.granted_by,
        granted_to: row.granted_to,
        can_access_user: row.can_access_user,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn case_from_db(row: DbCase) -> StoreResult<Case> {
    Ok(Case {
        id: row.id,
        organization_id: row.organization_id,
        caption: row.caption,
        case_number: row.case_number,
        status: parse_column("status", &row.status)?,
        lead_practitioner_id: row.lead_practitioner_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn deadline_from_db(row: DbDeadline) -> StoreResult<Deadline> {
    Ok(Deadline {
        id: row.id,
        case_id: row.case_id,
        organization_id: row.organization_id,
        title: row.title,
        due_at: row.due_at,
        owner_id: row.owner_id,
        status: parse_column("status", &row.status)?,
        priority: row.priority,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn contact_from_db(row: DbContact) -> StoreResult<Contact> {
    Ok(Contact {
        id: row.id,
        organization_id: row.organization_id,
        kind: parse_column("kind", &row.kind)?,
        display_name: row.display_name,
        email: row.email,
        phone: row.phone,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn subscription_from_db(row: DbSubscription) -> StoreResult<Subscription> {
    Ok(Subscription {
        id: row.id,
        organization_id: row.organization_id,
        licensed_users: row.licensed_users,
        status: parse_column("status", &row.status)?,
        contract_start_date: row.contract_start_date,
        contract_end_date: row.contract_end_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn court_from_db(row: DbCourt) -> Court {
    Court {
        id: row.id,
        name: row.name,
        district: row.district,
        division: row.division,
        location: row.location,
        timezone: row.timezone,
        website_url: row.website_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn judge_from_db(row: DbJudge) -> Judge {
    Judge {
        id: row.id,
        full_name: row.full_name,
        court_id: row.court_id,
        courtroom: row.courtroom,
        chambers_url: row.chambers_url,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
        holiday_calendar_id: row.holiday_calendar_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn audit_event_from_db(row: DbAuditEvent) -> StoreResult<AuditEvent> {
    Ok(AuditEvent {
        id: row.id,
        organization_id: row.organization_id,
        actor_user_id: row.actor_user_id,
        entity_table: row.entity_table,
        entity_id: row.entity_id,
        action: parse_column("action", &row.action)?,
        before: row.before,
        after: row.after,
        created_at: row.created_at,
    })
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23503").unwrap_or(false);
    }
    false
}

fn collect<R, T>(rows: Vec<R>, convert: impl Fn(R) -> StoreResult<T>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(convert).collect()
}

#[async_trait]
impl PracticeStore for PostgresStore {
    async fn list_organizations(&self, scope: &Scope) -> StoreResult<Vec<Organization>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::Organization);
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbOrganization>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(organization_from_db).collect())
    }

    async fn get_organization(&self, id: Uuid) -> StoreResult<Organization> {
        let row = sqlx::query_as::<_, DbOrganization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("organization".into()))?;
        Ok(organization_from_db(row))
    }

    async fn create_organization(&self, organization: Organization) -> StoreResult<Organization> {
        let insert = sqlx::query(
            "INSERT INTO organizations (id, name, is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.is_active)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("organization exists".into()));
            }
            return Err(err.into());
        }
        Ok(organization)
    }

    async fn deactivate_organization(&self, id: Uuid) -> StoreResult<Organization> {
        let row = sqlx::query_as::<_, DbOrganization>(&format!(
            "UPDATE organizations SET is_active = FALSE, \
             updated_at = CASE WHEN is_active THEN now() ELSE updated_at END \
             WHERE id = $1 RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("organization".into()))?;
        Ok(organization_from_db(row))
    }

    async fn list_users(&self, scope: &Scope) -> StoreResult<Vec<User>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_scope(&mut builder, scope, ResourceKind::User);
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbUser>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, user_from_db)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("user".into()))?;
        user_from_db(row)
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let insert = sqlx::query(
            "INSERT INTO users (id, email, display_name, organization_id, role, is_active, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.organization_id)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_by)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("email already registered".into()));
            }
            return Err(err.into());
        }
        Ok(user)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "UPDATE users SET display_name = $2, role = $3, is_active = $4, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("user".into()))?;
        user_from_db(row)
    }

    async fn update_user_role(&self, user: User) -> StoreResult<(User, Vec<AccessGrant>)> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "UPDATE users SET display_name = $2, role = $3, is_active = $4, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("user".into()))?;
        let stored = user_from_db(row)?;

        let parties = sqlx::query_as::<_, DbGrantParties>(
            "SELECT g.id, grantee.role AS grantee_role, target.role AS target_role \
             FROM access_grants g \
             JOIN users grantee ON grantee.id = g.granted_to \
             JOIN users target ON target.id = g.can_access_user \
             WHERE g.is_active AND (g.granted_to = $1 OR g.can_access_user = $1) \
             FOR UPDATE OF g",
        )
        .bind(stored.id)
        .fetch_all(&mut *tx)
        .await?;
        let mut stale = Vec::new();
        for party in parties {
            let grantee = parse_column::<Role>("role", &party.grantee_role)?;
            let target = parse_column::<Role>("role", &party.target_role)?;
            if !grantee.can_be_granted(target) {
                stale.push(party.id);
            }
        }

        let revoked = if stale.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, DbGrant>(&format!(
                "UPDATE access_grants SET is_active = FALSE, updated_at = now() \
                 WHERE id = ANY($1) RETURNING {GRANT_COLUMNS}"
            ))
            .bind(&stale)
            .fetch_all(&mut *tx)
            .await?
        };
        tx.commit().await?;

        if !revoked.is_empty() {
            self.publish_active_grants().await;
        }
        let mut revoked: Vec<AccessGrant> = revoked.into_iter().map(grant_from_db).collect();
        revoked.sort_by_key(|grant| (grant.created_at, grant.id));
        Ok((stored, revoked))
    }

    async fn count_active_users(&self, organization_id: Uuid) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND is_active",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_api_token(&self, token_hash: &str, user_id: Uuid) -> StoreResult<()> {
        let insert = sqlx::query("INSERT INTO api_tokens (token_hash, user_id) VALUES ($1, $2)")
            .bind(token_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        match insert {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("token exists".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {} FROM users u JOIN api_tokens t ON t.user_id = u.id WHERE t.token_hash = $1",
            USER_COLUMNS
                .split(", ")
                .map(|column| format!("u.{column}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_db).transpose()
    }

    async fn create_grant(&self, grant: AccessGrant) -> StoreResult<AccessGrant> {
        let insert = sqlx::query(
            "INSERT INTO access_grants (id, organization_id, granted_by, granted_to, can_access_user, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(grant.id)
        .bind(grant.organization_id)
        .bind(grant.granted_by)
        .bind(grant.granted_to)
        .bind(grant.can_access_user)
        .bind(grant.is_active)
        .bind(grant.created_at)
        .bind(grant.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(GrantError::DuplicateGrant.into());
            }
            return Err(err.into());
        }
        self.publish_active_grants().await;
        Ok(grant)
    }

    async fn revoke_grant(&self, id: Uuid) -> StoreResult<AccessGrant> {
        let row = sqlx::query_as::<_, DbGrant>(&format!(
            "UPDATE access_grants SET is_active = FALSE, \
             updated_at = CASE WHEN is_active THEN now() ELSE updated_at END \
             WHERE id = $1 RETURNING {GRANT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("access grant".into()))?;
        self.publish_active_grants().await;
        Ok(grant_from_db(row))
    }

    async fn get_grant(&self, id: Uuid) -> StoreResult<AccessGrant> {
        let row = sqlx::query_as::<_, DbGrant>(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("access grant".into()))?;
        Ok(grant_from_db(row))
    }

    async fn list_grants(&self, filter: GrantFilter) -> StoreResult<Vec<AccessGrant>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE TRUE"
        ));
        if !filter.include_inactive {
            builder.push(" AND is_active");
        }
        if let Some(organization_id) = filter.organization_id {
            builder
                .push(" AND organization_id = ")
                .push_bind(organization_id);
        }
        if let Some(granter) = filter.granted_by {
            builder.push(" AND granted_by = ").push_bind(granter);
        }
        if let Some(grantee) = filter.granted_to {
            builder.push(" AND granted_to = ").push_bind(grantee);
        }
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbGrant>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(grant_from_db).collect())
    }

    async fn list_cases(&self, scope: &Scope, filter: CaseFilter) -> StoreResult<Vec<Case>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {CASE_COLUMNS} FROM cases WHERE TRUE"));
        push_scope(&mut builder, scope, ResourceKind::Case);
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbCase>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, case_from_db)
    }

    async fn get_case(&self, id: Uuid) -> StoreResult<Case> {
        let row = sqlx::query_as::<_, DbCase>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("case".into()))?;
        case_from_db(row)
    }

    async fn create_case(&self, case: Case) -> StoreResult<Case> {
        sqlx::query(
            "INSERT INTO cases (id, organization_id, caption, case_number, status, lead_practitioner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(case.id)
        .bind(case.organization_id)
        .bind(&case.caption)
        .bind(&case.case_number)
        .bind(case.status.as_str())
        .bind(case.lead_practitioner_id)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(case)
    }

    async fn update_case(&self, case: Case) -> StoreResult<Case> {
        let row = sqlx::query_as::<_, DbCase>(&format!(
            "UPDATE cases SET caption = $2, case_number = $3, status = $4, lead_practitioner_id = $5, updated_at = now() \
             WHERE id = $1 RETURNING {CASE_COLUMNS}"
        ))
        .bind(case.id)
        .bind(&case.caption)
        .bind(&case.case_number)
        .bind(case.status.as_str())
        .bind(case.lead_practitioner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("case".into()))?;
        case_from_db(row)
    }

    async fn delete_case(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("case".into()));
        }
        Ok(())
    }

    async fn list_deadlines(
        &self,
        scope: &Scope,
        filter: DeadlineFilter,
    ) -> StoreResult<Vec<Deadline>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::Deadline);
        if let Some(case_id) = filter.case_id {
            builder.push(" AND case_id = ").push_bind(case_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY due_at, id");
        let rows = builder
            .build_query_as::<DbDeadline>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, deadline_from_db)
    }

    async fn get_deadline(&self, id: Uuid) -> StoreResult<Deadline> {
        let row = sqlx::query_as::<_, DbDeadline>(&format!(
            "SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("deadline".into()))?;
        deadline_from_db(row)
    }

    async fn create_deadline(&self, deadline: Deadline) -> StoreResult<Deadline> {
        sqlx::query(
            "INSERT INTO deadlines (id, case_id, organization_id, title, due_at, owner_id, status, priority, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(deadline.id)
        .bind(deadline.case_id)
        .bind(deadline.organization_id)
        .bind(&deadline.title)
        .bind(deadline.due_at)
        .bind(deadline.owner_id)
        .bind(deadline.status.as_str())
        .bind(deadline.priority)
        .bind(deadline.created_by)
        .bind(deadline.created_at)
        .bind(deadline.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(deadline)
    }

    async fn update_deadline(&self, deadline: Deadline) -> StoreResult<Deadline> {
        let row = sqlx::query_as::<_, DbDeadline>(&format!(
            "UPDATE deadlines SET title = $2, due_at = $3, owner_id = $4, status = $5, priority = $6, updated_at = now() \
             WHERE id = $1 RETURNING {DEADLINE_COLUMNS}"
        ))
        .bind(deadline.id)
        .bind(&deadline.title)
        .bind(deadline.due_at)
        .bind(deadline.owner_id)
        .bind(deadline.status.as_str())
        .bind(deadline.priority)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("deadline".into()))?;
        deadline_from_db(row)
    }

    async fn list_contacts(&self, scope: &Scope) -> StoreResult<Vec<Contact>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::Contact);
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbContact>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, contact_from_db)
    }

    async fn get_contact(&self, id: Uuid) -> StoreResult<Contact> {
        let row = sqlx::query_as::<_, DbContact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("contact".into()))?;
        contact_from_db(row)
    }

    async fn create_contact(&self, contact: Contact) -> StoreResult<Contact> {
        sqlx::query(
            "INSERT INTO contacts (id, organization_id, kind, display_name, email, phone, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(contact.id)
        .bind(contact.organization_id)
        .bind(contact.kind.as_str())
        .bind(&contact.display_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.created_by)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn list_subscriptions(&self, scope: &Scope) -> StoreResult<Vec<Subscription>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::Subscription);
        builder.push(" ORDER BY created_at, id");
        let rows = builder
            .build_query_as::<DbSubscription>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, subscription_from_db)
    }

    async fn subscription_for(&self, organization_id: Uuid) -> StoreResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, DbSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE organization_id = $1"
        ))
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(subscription_from_db).transpose()
    }

    async fn upsert_subscription(&self, subscription: Subscription) -> StoreResult<Subscription> {
        let row = sqlx::query_as::<_, DbSubscription>(&format!(
            "INSERT INTO subscriptions (id, organization_id, licensed_users, status, contract_start_date, contract_end_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (organization_id) DO UPDATE SET \
                licensed_users = EXCLUDED.licensed_users, \
                status = EXCLUDED.status, \
                contract_start_date = EXCLUDED.contract_start_date, \
                contract_end_date = EXCLUDED.contract_end_date, \
                updated_at = now() \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(subscription.id)
        .bind(subscription.organization_id)
        .bind(subscription.licensed_users)
        .bind(subscription.status.as_str())
        .bind(subscription.contract_start_date)
        .bind(subscription.contract_end_date)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .fetch_one(&self.pool)
        .await?;
        subscription_from_db(row)
    }

    async fn list_courts(&self, scope: &Scope) -> StoreResult<Vec<Court>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {COURT_COLUMNS} FROM courts WHERE TRUE"));
        push_scope(&mut builder, scope, ResourceKind::Court);
        builder.push(" ORDER BY name, id");
        let rows = builder
            .build_query_as::<DbCourt>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(court_from_db).collect())
    }

    async fn get_court(&self, id: Uuid) -> StoreResult<Court> {
        let row = sqlx::query_as::<_, DbCourt>(&format!(
            "SELECT {COURT_COLUMNS} FROM courts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("court".into()))?;
        Ok(court_from_db(row))
    }

    async fn create_court(&self, court: Court) -> StoreResult<Court> {
        sqlx::query(
            "INSERT INTO courts (id, name, district, division, location, timezone, website_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(court.id)
        .bind(&court.name)
        .bind(&court.district)
        .bind(&court.division)
        .bind(&court.location)
        .bind(&court.timezone)
        .bind(&court.website_url)
        .bind(court.created_at)
        .bind(court.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(court)
    }

    async fn delete_court(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM courts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("court".into()));
        }
        Ok(())
    }

    async fn list_judges(&self, scope: &Scope, court_id: Option<Uuid>) -> StoreResult<Vec<Judge>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {JUDGE_COLUMNS} FROM judges WHERE TRUE"));
        push_scope(&mut builder, scope, ResourceKind::Judge);
        if let Some(court_id) = court_id {
            builder.push(" AND court_id = ").push_bind(court_id);
        }
        builder.push(" ORDER BY full_name, id");
        let rows = builder
            .build_query_as::<DbJudge>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(judge_from_db).collect())
    }

    async fn get_judge(&self, id: Uuid) -> StoreResult<Judge> {
        let row = sqlx::query_as::<_, DbJudge>(&format!(
            "SELECT {JUDGE_COLUMNS} FROM judges WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("judge".into()))?;
        Ok(judge_from_db(row))
    }

    async fn create_judge(&self, judge: Judge) -> StoreResult<Judge> {
        let insert = sqlx::query(
            "INSERT INTO judges (id, full_name, court_id, courtroom, chambers_url, contact_email, contact_phone, holiday_calendar_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(judge.id)
        .bind(&judge.full_name)
        .bind(judge.court_id)
        .bind(&judge.courtroom)
        .bind(&judge.chambers_url)
        .bind(&judge.contact_email)
        .bind(&judge.contact_phone)
        .bind(judge.holiday_calendar_id)
        .bind(judge.created_at)
        .bind(judge.updated_at)
        .execute(&self.pool)
        .await;
        match insert {
            Ok(_) => Ok(judge),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::NotFound("court or holiday calendar".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_judge(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM judges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("judge".into()));
        }
        Ok(())
    }

    async fn list_holiday_calendars(&self, scope: &Scope) -> StoreResult<Vec<HolidayCalendar>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CALENDAR_COLUMNS} FROM holiday_calendars WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::HolidayCalendar);
        builder.push(" ORDER BY name, id");
        let rows = builder
            .build_query_as::<DbHolidayCalendar>()
            .fetch_all(&self.pool)
            .await?;
        self.with_holidays(rows).await
    }

    async fn get_holiday_calendar(&self, id: Uuid) -> StoreResult<HolidayCalendar> {
        let row = sqlx::query_as::<_, DbHolidayCalendar>(&format!(
            "SELECT {CALENDAR_COLUMNS} FROM holiday_calendars WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("holiday calendar".into()))?;
        self.with_holidays(vec![row])
            .await?
            .pop()
            .ok_or_else(|| StoreError::NotFound("holiday calendar".into()))
    }

    async fn create_holiday_calendar(
        &self,
        calendar: HolidayCalendar,
    ) -> StoreResult<HolidayCalendar> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO holiday_calendars (id, name, jurisdiction, timezone, source_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(calendar.id)
        .bind(&calendar.name)
        .bind(&calendar.jurisdiction)
        .bind(&calendar.timezone)
        .bind(&calendar.source_url)
        .bind(calendar.created_at)
        .bind(calendar.updated_at)
        .execute(&mut *tx)
        .await?;
        for holiday in &calendar.holidays {
            let insert = sqlx::query(
                "INSERT INTO holidays (calendar_id, date, name) VALUES ($1, $2, $3)",
            )
            .bind(calendar.id)
            .bind(holiday.date)
            .bind(&holiday.name)
            .execute(&mut *tx)
            .await;
            if let Err(err) = insert {
                if is_unique_violation(&err) {
                    return Err(StoreError::Conflict("holiday already on this date".into()));
                }
                return Err(err.into());
            }
        }
        tx.commit().await?;
        Ok(calendar)
    }

    async fn add_holiday(
        &self,
        calendar_id: Uuid,
        holiday: Holiday,
    ) -> StoreResult<HolidayCalendar> {
        let insert = sqlx::query("INSERT INTO holidays (calendar_id, date, name) VALUES ($1, $2, $3)")
            .bind(calendar_id)
            .bind(holiday.date)
            .bind(&holiday.name)
            .execute(&self.pool)
            .await;
        match insert {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::Conflict("holiday already on this date".into()));
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(StoreError::NotFound("holiday calendar".into()));
            }
            Err(err) => return Err(err.into()),
        }
        sqlx::query("UPDATE holiday_calendars SET updated_at = now() WHERE id = $1")
            .bind(calendar_id)
            .execute(&self.pool)
            .await?;
        self.get_holiday_calendar(calendar_id).await
    }

    async fn record_audit_event(&self, event: AuditEvent) -> StoreResult<AuditEvent> {
        sqlx::query(
            "INSERT INTO audit_events (id, organization_id, actor_user_id, entity_table, entity_id, action, before, after, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.id)
        .bind(event.organization_id)
        .bind(event.actor_user_id)
        .bind(&event.entity_table)
        .bind(event.entity_id)
        .bind(event.action.as_str())
        .bind(&event.before)
        .bind(&event.after)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_audit_events(
        &self,
        scope: &Scope,
        filter: AuditFilter,
    ) -> StoreResult<Vec<AuditEvent>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_events WHERE TRUE"
        ));
        push_scope(&mut builder, scope, ResourceKind::AuditEvent);
        if let Some(table) = filter.entity_table {
            builder.push(" AND entity_table = ").push_bind(table);
        }
        if let Some(entity_id) = filter.entity_id {
            builder.push(" AND entity_id = ").push_bind(entity_id);
        }
        builder.push(" ORDER BY created_at DESC, id DESC");
        let rows = builder
            .build_query_as::<DbAuditEvent>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows, audit_event_from_db)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
