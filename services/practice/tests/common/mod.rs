#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use practice::app::{AppState, build_router};
use practice::auth::token::issue_token;
use practice::model::{Case, CaseStatus, Deadline, DeadlineStatus, Organization, User};
use practice::notify::LogNotifier;
use practice::store::PracticeStore;
use practice::store::memory::InMemoryStore;
use precedent_authz::Role;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json")
}

/// Router over an in-memory store, with helpers that seed rows directly.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub app: axum::routing::RouterIntoService<Body, ()>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState {
            api_version: "v1".to_string(),
            store: store.clone(),
            notifier: Arc::new(LogNotifier),
        };
        Self {
            store,
            app: build_router(state).into_service(),
        }
    }

    pub async fn organization(&self, name: &str) -> Organization {
        self.store
            .create_organization(Organization::new(name))
            .await
            .expect("organization")
    }

    /// Create an account and return it with a fresh bearer token.
    pub async fn member(&self, org: Option<&Organization>, role: Role, email: &str) -> (User, String) {
        let user = User::new(email, email, org.map(|o| o.id), role, None);
        let user = self.store.create_user(user).await.expect("user");
        let token = issue_token(self.store.as_ref(), user.id)
            .await
            .expect("token");
        (user, token)
    }

    pub async fn case(&self, org: &Organization, lead: &User, caption: &str) -> Case {
        let now = Utc::now();
        self.store
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

    pub async fn deadline(&self, case: &Case, owner: &User, title: &str, days: i64) -> Deadline {
        let now = Utc::now();
        self.store
            .create_deadline(Deadline {
                id: Uuid::new_v4(),
                case_id: case.id,
                organization_id: case.organization_id,
                title: title.to_string(),
                due_at: now + Duration::days(days),
                owner_id: Some(owner.id),
                status: DeadlineStatus::Open,
                priority: 3,
                created_by: Some(owner.id),
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("deadline")
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        (status, read_json(response).await)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
        self.send("GET", uri, Some(token), None).await
    }
}

pub fn ids(items: &serde_json::Value) -> Vec<String> {
    items["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}
