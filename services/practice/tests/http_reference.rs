mod common;

use axum::http::StatusCode;
use common::{Harness, ids};
use precedent_authz::Role;
use serde_json::json;

#[tokio::test]
async fn court_data_is_shared_and_platform_maintained() {
    let h = Harness::new();
    let org1 = h.organization("Org One").await;
    let org2 = h.organization("Org Two").await;
    let (_, root_token) = h.member(None, Role::PlatformAdmin, "root@precedent.test").await;
    let (_, admin_token) = h.member(Some(&org1), Role::TenantAdmin, "admin@one.test").await;
    let (_, p1_token) = h.member(Some(&org1), Role::Practitioner, "p@one.test").await;
    let (_, a2_token) = h.member(Some(&org2), Role::Assistant, "a@two.test").await;

    let (status, court) = h
        .send(
            "POST",
            "/v1/courts",
            Some(&root_token),
            Some(json!({"name": "S.D.N.Y.", "district": "Southern District of New York"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{court}");
    assert_eq!(court["timezone"], "America/New_York");
    let court_id = court["id"].as_str().expect("id").to_string();

    let (status, judge) = h
        .send(
            "POST",
            "/v1/judges",
            Some(&root_token),
            Some(json!({"full_name": "Hon. A. Jones", "court_id": court_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{judge}");
    let judge_uri = format!("/v1/judges/{}", judge["id"].as_str().expect("id"));

    for token in [&p1_token, &a2_token, &admin_token] {
        let (status, body) = h.get("/v1/courts", token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![court_id.clone()]);
        let (status, body) = h.get(&judge_uri, token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["full_name"], "Hon. A. Jones");
    }
    let (_, body) = h
        .get(&format!("/v1/judges?court_id={court_id}"), &a2_token)
        .await;
    assert_eq!(body["items"].as_array().expect("items").len(), 1);

    for token in [&p1_token, &admin_token] {
        let (status, body) = h
            .send("POST", "/v1/courts", Some(token), Some(json!({"name": "Shadow Court"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "insufficient_rank");
        let (status, body) = h
            .send("DELETE", &format!("/v1/courts/{court_id}"), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "insufficient_rank");
    }

    let (status, _) = h
        .send("DELETE", &format!("/v1/courts/{court_id}"), Some(&root_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = h.get(&judge_uri, &p1_token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["court_id"].is_null());
}

#[tokio::test]
async fn judges_must_reference_known_courts() {
    let h = Harness::new();
    let (_, root_token) = h.member(None, Role::PlatformAdmin, "root@precedent.test").await;
    let (status, body) = h
        .send(
            "POST",
            "/v1/judges",
            Some(&root_token),
            Some(json!({"full_name": "Hon. B. Smith", "court_id": uuid::Uuid::new_v4()})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "court_id");
}

#[tokio::test]
async fn holiday_calendars_reject_a_second_holiday_on_one_date() {
    let h = Harness::new();
    let org = h.organization("Org One").await;
    let (_, root_token) = h.member(None, Role::PlatformAdmin, "root@precedent.test").await;
    let (_, p_token) = h.member(Some(&org), Role::Practitioner, "p@one.test").await;

    let (status, calendar) = h
        .send(
            "POST",
            "/v1/holiday-calendars",
            Some(&root_token),
            Some(json!({"name": "Federal courts", "jurisdiction": "US"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{calendar}");
    let holidays_uri = format!(
        "/v1/holiday-calendars/{}/holidays",
        calendar["id"].as_str().expect("id")
    );

    let holiday = json!({"date": "2026-11-26", "name": "Thanksgiving Day"});
    let (status, body) = h
        .send("POST", &holidays_uri, Some(&p_token), Some(holiday.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "insufficient_rank");

    let (status, body) = h
        .send("POST", &holidays_uri, Some(&root_token), Some(holiday.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["holidays"][0]["date"], "2026-11-26");

    let (status, body) = h
        .send("POST", &holidays_uri, Some(&root_token), Some(holiday))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_holiday");

    let (status, body) = h.get("/v1/holiday-calendars", &p_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["holidays"].as_array().expect("holidays").len(), 1);
}

#[tokio::test]
async fn audit_trail_is_scoped_to_administrators_of_the_firm() {
    let h = Harness::new();
    let org1 = h.organization("Org One").await;
    let org2 = h.organization("Org Two").await;
    let (_, root_token) = h.member(None, Role::PlatformAdmin, "root@precedent.test").await;
    let (_, admin1_token) = h.member(Some(&org1), Role::TenantAdmin, "admin@one.test").await;
    let (_, admin2_token) = h.member(Some(&org2), Role::TenantAdmin, "admin@two.test").await;
    let (mp, mp_token) = h
        .member(Some(&org1), Role::ManagingPractitioner, "mp@one.test")
        .await;
    let (p, _) = h.member(Some(&org1), Role::Practitioner, "p@one.test").await;

    let (status, _) = h
        .send(
            "POST",
            "/v1/access-grants",
            Some(&admin1_token),
            Some(json!({"granted_to": mp.id, "can_access_user": p.id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = h.get("/v1/audit-events", &admin1_token).await;
    assert_eq!(status, StatusCode::OK);
    let events = body["items"].as_array().expect("items");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["organization_id"], json!(org1.id));
    assert_eq!(events[0]["after"]["granted_to"], json!(mp.id));

    for token in [&admin2_token, &mp_token] {
        let (status, body) = h.get("/v1/audit-events", token).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["items"].as_array().expect("items").is_empty());
    }
    let (_, body) = h.get("/v1/audit-events", &root_token).await;
    assert_eq!(body["items"].as_array().expect("items").len(), 1);
}
