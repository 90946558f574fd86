//! # Integration Tests for gym-api
//!
//! Drives the full router (middleware included) over the in-memory store:
//! admission gates and their ordering, the membership lifecycle, check-in
//! eligibility, listing, error envelopes, and the operational endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gym_api::services;
use gym_api::state::AppState;
use gym_core::CalendarDate;
use gym_state::PlanDraft;

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory();
        let router = gym_api::app(state.clone());
        Self { state, router }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn send_raw(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request(method, uri, body)).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn plan(&self, name: &str, duration_days: i32, is_active: bool) -> String {
        let plan = PlanDraft {
            name: name.to_string(),
            description: None,
            price_cents: 4999,
            duration_days,
            is_active,
        }
        .into_plan(Utc::now())
        .unwrap();
        self.state.db.insert_plan(&plan).await.unwrap();
        plan.id.to_string()
    }

    async fn member(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/members",
                Some(json!({ "firstName": "Ada", "lastName": "Lovelace", "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn membership(&self, member_id: &str, plan_id: &str, start: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/memberships",
            Some(json!({ "memberId": member_id, "planId": plan_id, "startDate": start })),
        )
        .await
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn error_code(body: &Value) -> &str {
    assert_eq!(body["success"], false, "{body}");
    body["error"]["code"].as_str().unwrap()
}

// -- Operational endpoints ----------------------------------------------------

#[tokio::test]
async fn liveness_and_readiness_probes() {
    let app = TestApp::new();
    let (status, body) = app.send_raw("GET", "/health/liveness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, body) = app.send_raw("GET", "/health/readiness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ready");
}

#[tokio::test]
async fn api_health_is_enveloped() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/memberships/{id}/cancel"].is_object());
    assert!(body["paths"]["/api/members/{id}/check-ins"].is_object());
}

#[tokio::test]
async fn metrics_unavailable_without_recorder() {
    let app = TestApp::new();
    let (status, _) = app.send_raw("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/lockers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("/api/lockers"));
}

// -- Members ------------------------------------------------------------------

#[tokio::test]
async fn duplicate_email_conflicts_case_insensitively() {
    let app = TestApp::new();
    app.member("ada@example.com").await;
    let (status, body) = app
        .send(
            "POST",
            "/api/members",
            Some(json!({ "firstName": "Ada", "lastName": "King", "email": "ADA@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn validation_failure_lists_every_field() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/members",
            Some(json!({ "firstName": "", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_FAILED");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"firstName"), "{fields:?}");
    assert!(fields.contains(&"lastName"), "{fields:?}");
    assert!(fields.contains(&"email"), "{fields:?}");
}

#[tokio::test]
async fn malformed_path_id_is_invalid_uuid() {
    let app = TestApp::new();
    for uri in ["/api/members/abc", "/api/plans/123", "/api/memberships/xyz"] {
        let (status, body) = app.send("GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(error_code(&body), "INVALID_UUID", "{uri}");
    }
}

#[tokio::test]
async fn profile_of_unknown_member_is_not_found() {
    let app = TestApp::new();
    let uri = format!("/api/members/{}", uuid::Uuid::new_v4());
    let (status, body) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "MEMBER_NOT_FOUND");
}

#[tokio::test]
async fn deleted_member_is_hidden_from_profile_and_second_delete() {
    let app = TestApp::new();
    let id = app.member("gone@example.com").await;
    let uri = format!("/api/members/{id}");

    let (status, body) = app.send("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isDeleted"], true);

    let (status, body) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "MEMBER_DELETED");

    let (status, body) = app.send("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "MEMBER_DELETED");
}

#[tokio::test]
async fn profile_reports_membership_and_attendance() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("profile@example.com").await;
    let (status, _) = app.membership(&member, &plan, "2024-01-01").await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/members/{member}/check-ins");
    let (status, _) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("GET", &format!("/api/members/{member}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let profile = &body["data"];
    assert_eq!(profile["member"]["id"], member.as_str());
    assert_eq!(profile["activeMembership"]["status"], "active");
    assert_eq!(profile["activeMembership"]["plan"]["id"], plan.as_str());
    assert!(profile["lastCheckIn"].is_string());
    assert_eq!(profile["checkInsLast30Days"], 1);
}

#[tokio::test]
async fn profile_without_activity_is_empty() {
    let app = TestApp::new();
    let member = app.member("quiet@example.com").await;
    let (_, body) = app.send("GET", &format!("/api/members/{member}"), None).await;
    assert!(body["data"]["activeMembership"].is_null());
    assert!(body["data"]["lastCheckIn"].is_null());
    assert_eq!(body["data"]["checkInsLast30Days"], 0);
}

// -- Memberships --------------------------------------------------------------

#[tokio::test]
async fn end_date_derives_from_plan_duration() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("jan@example.com").await;
    let (status, body) = app.membership(&member, &plan, "2024-01-01").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["startDate"], "2024-01-01");
    assert_eq!(body["data"]["endDate"], "2024-01-31");
    assert_eq!(body["data"]["status"], "active");
    assert!(body["data"]["cancelledAt"].is_null());
}

#[tokio::test]
async fn derived_end_date_past_year_9999_is_rejected() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("far-future@example.com").await;

    let (status, body) = app.membership(&member, &plan, "9999-12-31").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"][0]["field"], "startDate");

    let (_, body) = app
        .send("GET", &format!("/api/memberships?memberId={member}"), None)
        .await;
    assert_eq!(body["meta"]["totalCount"], 0);

    // The last start date that still fits renders a four-digit end date.
    let (status, body) = app.membership(&member, &plan, "9999-12-01").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["endDate"], "9999-12-31");
}

#[tokio::test]
async fn explicit_end_date_must_follow_start() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("window@example.com").await;
    let (status, body) = app
        .send(
            "POST",
            "/api/memberships",
            Some(json!({
                "memberId": member,
                "planId": plan,
                "startDate": "2024-02-01",
                "endDate": "2024-02-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"][0]["field"], "endDate");
}

#[tokio::test]
async fn inactive_plan_is_rejected_without_writing() {
    let app = TestApp::new();
    let plan = app.plan("Founders", 365, false).await;
    let member = app.member("founder@example.com").await;
    let (status, body) = app.membership(&member, &plan, "2024-01-01").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "PLAN_INACTIVE");

    let (_, body) = app
        .send("GET", &format!("/api/memberships?memberId={member}"), None)
        .await;
    assert_eq!(body["meta"]["totalCount"], 0);
}

#[tokio::test]
async fn deleted_member_gate_precedes_plan_gate() {
    let app = TestApp::new();
    let plan = app.plan("Founders", 365, false).await;
    let member = app.member("order@example.com").await;
    app.send("DELETE", &format!("/api/members/{member}"), None).await;

    let (status, body) = app.membership(&member, &plan, "2024-01-01").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "MEMBER_DELETED");
}

#[tokio::test]
async fn second_active_membership_conflicts() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("twice@example.com").await;
    let (status, _) = app.membership(&member, &plan, "2024-01-01").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.membership(&member, &plan, "2024-03-01").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ACTIVE_MEMBERSHIP_EXISTS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creation_admits_exactly_one() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("race@example.com").await;
    let body = json!({ "memberId": member, "planId": plan, "startDate": "2024-01-01" });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = app.router.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let response = router
                    .oneshot(request("POST", "/api/memberships", Some(body)))
                    .await
                    .unwrap();
                let status = response.status();
                let bytes = response.into_body().collect().await.unwrap().to_bytes();
                let json: Value = serde_json::from_slice(&bytes).unwrap();
                (status, json)
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(error_code(&body), "ACTIVE_MEMBERSHIP_EXISTS");
        }
    }
    assert_eq!(created, 1);

    let (_, body) = app
        .send("GET", &format!("/api/memberships?memberId={member}&status=active"), None)
        .await;
    assert_eq!(body["meta"]["totalCount"], 1);
}

#[tokio::test]
async fn cancel_without_body_uses_today() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("cancel@example.com").await;
    let (_, body) = app.membership(&member, &plan, "2024-01-01").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/memberships/{id}/cancel");
    let (status, body) = app.send("PATCH", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["cancelledAt"], Utc::now().date_naive().to_string());

    let (status, body) = app.send("PATCH", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "MEMBERSHIP_ALREADY_CANCELLED");
}

#[tokio::test]
async fn cancel_with_explicit_date() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("dated@example.com").await;
    let (_, body) = app.membership(&member, &plan, "2024-01-01").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/api/memberships/{id}/cancel"),
            Some(json!({ "cancelledAt": "2024-01-15" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancelledAt"], "2024-01-15");
    assert_eq!(body["data"]["endDate"], "2024-01-31");
}

#[tokio::test]
async fn expired_membership_cannot_be_cancelled() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("lapsed@example.com").await;
    let (_, body) = app.membership(&member, &plan, "2024-01-01").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let as_of = CalendarDate::parse("2024-02-01").unwrap();
    let expired = services::memberships::expire_lapsed(&app.state.db, as_of, Utc::now())
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let (status, body) = app
        .send("PATCH", &format!("/api/memberships/{id}/cancel"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "MEMBERSHIP_EXPIRED");

    // The member may now open a new membership.
    let (status, _) = app.membership(&member, &plan, "2024-02-01").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn inverted_date_filter_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "GET",
            "/api/memberships?startDateFrom=2024-02-01&startDateTo=2024-01-01",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_DATE_RANGE");

    let (status, body) = app
        .send("GET", "/api/check-ins?dateFrom=2024-02-01&dateTo=2024-01-01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn unknown_status_filter_is_a_field_violation() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/memberships?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"][0]["field"], "status");
}

// -- Check-ins ----------------------------------------------------------------

#[tokio::test]
async fn check_in_requires_active_membership() {
    let app = TestApp::new();
    let member = app.member("walkin@example.com").await;
    let (status, body) = app
        .send("POST", &format!("/api/members/{member}/check-ins"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "NO_ACTIVE_MEMBERSHIP");

    let (_, body) = app
        .send("GET", &format!("/api/check-ins?memberId={member}"), None)
        .await;
    assert_eq!(body["meta"]["totalCount"], 0);
}

#[tokio::test]
async fn deleted_member_gate_precedes_membership_gate() {
    let app = TestApp::new();
    let member = app.member("ghost@example.com").await;
    app.send("DELETE", &format!("/api/members/{member}"), None).await;

    let (status, body) = app
        .send("POST", &format!("/api/members/{member}/check-ins"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "MEMBER_DELETED");
}

#[tokio::test]
async fn check_in_links_the_active_membership() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("regular@example.com").await;
    let (_, body) = app.membership(&member, &plan, "2024-01-01").await;
    let membership = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/members/{member}/check-ins"),
            Some(json!({ "checkedInAt": "2024-01-15T10:00:00+02:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["membershipId"], membership.as_str());
    assert_eq!(body["data"]["checkedInAt"], "2024-01-15T08:00:00Z");

    let id = body["data"]["id"].as_str().unwrap();
    let (status, body) = app.send("GET", &format!("/api/check-ins/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["memberId"], member.as_str());
}

#[tokio::test]
async fn malformed_check_in_timestamp_is_rejected() {
    let app = TestApp::new();
    let plan = app.plan("Monthly", 30, true).await;
    let member = app.member("clock@example.com").await;
    app.membership(&member, &plan, "2024-01-01").await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/members/{member}/check-ins"),
            Some(json!({ "checkedInAt": "yesterday" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "checkedInAt");
}

// -- Listing ------------------------------------------------------------------

#[tokio::test]
async fn listing_is_idempotent_and_paged() {
    let app = TestApp::new();
    for i in 0..5 {
        app.member(&format!("member{i}@example.com")).await;
    }
    let uri = "/api/members?page=2&pageSize=2&sortBy=email&sortOrder=asc";
    let (status, first) = app.send_raw("GET", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app.send_raw("GET", uri, None).await;
    assert_eq!(first, second);

    let body: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(body["meta"]["totalCount"], 5);
    assert_eq!(body["meta"]["totalPages"], 3);
    assert_eq!(body["meta"]["hasPrev"], true);
    assert_eq!(body["meta"]["hasNext"], true);
    let emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, ["member2@example.com", "member3@example.com"]);
}

#[tokio::test]
async fn seeded_catalog_is_listed() {
    let app = TestApp::new();
    let report = services::plans::seed_catalog(
        &app.state.db,
        services::plans::default_catalog(),
        Utc::now(),
        false,
    )
    .await
    .unwrap();
    assert_eq!(report.inserted.len(), 5);

    let (status, body) = app.send("GET", "/api/plans?isActive=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalCount"], 4);
}
