use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::allocation::domain::FlatType;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    (status, read_json_body(response).await)
}

fn submission(applicant: &str, project: &str, flat_type: &str) -> Value {
    json!({
        "applicant_id": applicant,
        "project_id": project,
        "flat_type": flat_type,
        "submitted_on": "2025-02-20",
    })
}

#[tokio::test]
async fn submit_returns_created_application() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/applications",
            submission(SARAH, ACACIA, "three_room"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "app-000001");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["flat_type"], "three_room");
    assert_eq!(body["submitted_on"], "2025-02-20");
}

#[tokio::test]
async fn ineligible_submission_is_unprocessable() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/applications",
            submission(JOHN, ACACIA, "three_room"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains(JOHN));
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let router = router_with_service(build_service());
    let request = || {
        json_request(
            Method::POST,
            "/api/v1/applications",
            submission(SARAH, ACACIA, "two_room"),
        )
    };

    let (first, _) = send(&router, request()).await;
    let (second, body) = send(&router, request()).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        empty_request(Method::GET, "/api/v1/applications/app-999999"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("app-999999"));
}

#[tokio::test]
async fn non_owner_decision_is_forbidden() {
    let service = build_service();
    let application = service
        .submit_application(&pid(SARAH), &prj(ACACIA), FlatType::TwoRoom, today())
        .expect("submitted");
    let router = router_with_service(service);

    let uri = format!("/api/v1/applications/{}/decision", application.id);
    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            &uri,
            json!({ "manager_id": JESSICA, "approve": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            &uri,
            json!({ "manager_id": MICHAEL, "approve": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "successful");
}

#[tokio::test]
async fn booking_flow_issues_receipt() {
    let service = build_service();
    assign_officer(&service, DANIEL, ACACIA);
    let application = successful_application(&service, SARAH, ACACIA, FlatType::TwoRoom);
    let router = router_with_service(service);

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/bookings",
            json!({
                "officer_id": DANIEL,
                "applicant_id": SARAH,
                "flat_type": "two_room",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "booked");
    assert_eq!(body["applicant_name"], "Sarah");

    let (status, receipt) = send(
        &router,
        empty_request(
            Method::GET,
            &format!("/api/v1/applications/{}/receipt", application.id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["project_id"], ACACIA);
    assert_eq!(receipt["flat_type"], "two_room");

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/bookings",
            json!({
                "officer_id": DANIEL,
                "applicant_id": SARAH,
                "flat_type": "two_room",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn exhausted_booking_is_unprocessable() {
    let service = build_service();
    assign_officer(&service, DANIEL, CEDAR);
    successful_application(&service, SARAH, CEDAR, FlatType::TwoRoom);
    successful_application(&service, GRACE, CEDAR, FlatType::TwoRoom);
    service
        .book(&pid(DANIEL), &pid(SARAH), FlatType::TwoRoom)
        .expect("last unit");
    let router = router_with_service(service);

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/bookings",
            json!({
                "officer_id": DANIEL,
                "applicant_id": GRACE,
                "flat_type": "two_room",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn eligibility_lists_current_flat_types() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        empty_request(
            Method::GET,
            &format!("/api/v1/projects/{CEDAR}/eligibility?applicant={SARAH}"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flat_types"], json!(["two_room"]));

    let (_, body) = send(
        &router,
        empty_request(
            Method::GET,
            &format!("/api/v1/projects/{ACACIA}/eligibility?applicant={RACHEL}"),
        ),
    )
    .await;
    assert_eq!(body["flat_types"], json!([]));
}

#[tokio::test]
async fn project_listing_respects_visibility() {
    let router = router_with_service(build_service());

    let (status, _) = send(
        &router,
        json_request(
            Method::PUT,
            &format!("/api/v1/projects/{ACACIA}/visibility"),
            json!({ "manager_id": MICHAEL, "visible": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        empty_request(Method::GET, &format!("/api/v1/projects?viewer={JOHN}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .expect("project list")
        .iter()
        .filter_map(|project| project["id"].as_str())
        .collect();
    assert_eq!(ids, vec![BIRCH, CEDAR, DAHLIA]);
}

#[tokio::test]
async fn manager_creates_project() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/projects",
            json!({
                "manager_id": JESSICA,
                "project": {
                    "id": "fern",
                    "name": "Fern Grove",
                    "neighborhood": "Tampines",
                    "opening_date": "2025-03-01",
                    "closing_date": "2025-04-01",
                    "visible": true,
                    "two_room_units": 10,
                    "three_room_units": 6,
                    "staff_slots": 4,
                },
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["manager_id"], JESSICA);

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/projects",
            json!({
                "manager_id": SARAH,
                "project": {
                    "id": "gum",
                    "name": "Gum Court",
                    "neighborhood": "Bedok",
                    "opening_date": "2025-03-01",
                    "closing_date": "2025-04-01",
                    "two_room_units": 1,
                    "three_room_units": 1,
                    "staff_slots": 1,
                },
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn withdrawal_round_trip_over_http() {
    let service = build_service();
    let application = service
        .submit_application(&pid(SARAH), &prj(ACACIA), FlatType::TwoRoom, today())
        .expect("submitted");
    let router = router_with_service(service);

    let (status, body) = send(
        &router,
        empty_request(
            Method::POST,
            &format!("/api/v1/applicants/{SARAH}/withdrawal"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["withdrawal_requested"], true);

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            &format!("/api/v1/applications/{}/withdrawal/decision", application.id),
            json!({ "manager_id": MICHAEL, "approve": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unsuccessful");
    assert_eq!(body["unit_released"], false);
}

#[tokio::test]
async fn officer_registration_and_enquiry_reply() {
    let router = router_with_service(build_service());

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            &format!("/api/v1/officers/{DANIEL}/assignment"),
            json!({ "project_id": ACACIA }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["role"]["pending_project"], ACACIA);

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            &format!("/api/v1/officers/{DANIEL}/assignment/decision"),
            json!({ "manager_id": MICHAEL, "approve": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, enquiry) = send(
        &router,
        json_request(
            Method::POST,
            "/api/v1/enquiries",
            json!({
                "applicant_id": JOHN,
                "project_id": ACACIA,
                "message": "When is the balloting?",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let enquiry_id = enquiry["id"].as_str().expect("enquiry id").to_string();

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            &format!("/api/v1/enquiries/{enquiry_id}/reply"),
            json!({ "responder_id": DANIEL, "response": "  " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "response must not be blank");

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            &format!("/api/v1/enquiries/{enquiry_id}/reply"),
            json!({ "responder_id": DANIEL, "response": "Next month." }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "replied");

    let (status, _) = send(
        &router,
        empty_request(
            Method::DELETE,
            &format!("/api/v1/enquiries/{enquiry_id}?author={JOHN}"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
