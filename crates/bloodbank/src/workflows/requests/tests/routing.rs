use super::common::*;
use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;
use tower::ServiceExt;

use crate::scoring::RequestUrgency;
use crate::workflows::requests::domain::{RequestStatus, StatusChange};
use crate::workflows::requests::RequestService;

fn submission_body(urgency: &str, required_in_days: i64) -> serde_json::Value {
    let required_by = (Utc::now() + Duration::days(required_in_days))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    json!({
        "patient_name": "Noor Haddad",
        "blood_type": "AB-",
        "units": 2,
        "urgency": urgency,
        "hospital": { "name": "County General", "city": "Ames" },
        "reason": "Trauma admission",
        "required_by": required_by,
    })
}

#[tokio::test]
async fn submit_requires_a_bearer_token() {
    let (service, _) = build_service();
    let response = router_for(service)
        .oneshot(json_request(
            "POST",
            "/api/requests",
            None,
            &submission_body("high", 5),
        ))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "access token required");
}

#[tokio::test]
async fn forged_tokens_are_forbidden() {
    let (service, _) = build_service();
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/requests")
        .header("authorization", "Bearer not.a-valid-token")
        .body(axum::body::Body::empty())
        .expect("valid request");

    let response = router_for(service)
        .oneshot(request)
        .await
        .expect("router response");
    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn submit_returns_created_view_with_priority() {
    let (service, _) = build_service();
    let response = router_for(service)
        .oneshot(json_request(
            "POST",
            "/api/requests",
            Some(&requester()),
            &submission_body("emergency", 20),
        ))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["urgency"], "emergency");
    assert_eq!(payload["priority"], 100);
    assert_eq!(payload["is_urgent"], true);
    assert_eq!(payload["requester"], "user-100");
}

#[tokio::test]
async fn submit_rejects_unknown_urgency_with_unprocessable_entity() {
    let (service, _) = build_service();
    let response = router_for(service)
        .oneshot(json_request(
            "POST",
            "/api/requests",
            Some(&requester()),
            &submission_body("whenever", 3),
        ))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "urgency must be one of low, medium, high, emergency"
    );
}

#[tokio::test]
async fn unknown_request_returns_not_found() {
    let (service, _) = build_service();
    let response = router_for(service)
        .oneshot(empty_request(
            "GET",
            "/api/requests/req-999999",
            Some(&admin()),
        ))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "blood request not found");
}

#[tokio::test]
async fn urgent_list_is_public_and_ranked() {
    let (service, _) = build_service();
    let now = Utc::now();
    service
        .submit(
            &requester(),
            submission(RequestUrgency::High, now + Duration::days(10)),
            now,
        )
        .expect("high");
    let emergency = service
        .submit(
            &requester(),
            submission(RequestUrgency::Emergency, now + Duration::days(10)),
            now,
        )
        .expect("emergency");
    service
        .submit(
            &requester(),
            submission(RequestUrgency::Medium, now + Duration::days(10)),
            now,
        )
        .expect("medium");

    let response = router_for(service)
        .oneshot(empty_request("GET", "/api/requests/urgent/list", None))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::OK);
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("array payload");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], emergency.id.0.as_str());
    assert_eq!(entries[1]["urgency"], "high");
}

#[tokio::test]
async fn delete_of_approved_request_is_rejected() {
    let (service, _) = build_service();
    let now = Utc::now();
    let record = service
        .submit(
            &requester(),
            submission(RequestUrgency::Medium, now + Duration::days(4)),
            now,
        )
        .expect("submission");
    service
        .set_status(
            &admin(),
            &record.id,
            StatusChange {
                status: RequestStatus::Approved,
                notes: None,
            },
            now,
        )
        .expect("approve");

    let response = router_for(service)
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/requests/{}", record.id.0),
            Some(&requester()),
        ))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "cannot delete non-pending request");
}

#[tokio::test]
async fn fulfill_route_requires_admin_and_tracks_units() {
    let (service, _) = build_service();
    let now = Utc::now();
    let record = service
        .submit(
            &requester(),
            submission(RequestUrgency::High, now + Duration::days(2)),
            now,
        )
        .expect("submission");
    let router = router_for(service);
    let uri = format!("/api/requests/{}/fulfill", record.id.0);

    let denied = router
        .clone()
        .oneshot(json_request("POST", &uri, Some(&requester()), &json!({ "units": 1 })))
        .await
        .expect("router response");
    assert_status(&denied, StatusCode::FORBIDDEN);

    let response = router
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&admin()),
            &json!({ "units": 3, "donor_id": "donor-000001" }),
        ))
        .await
        .expect("router response");
    assert_status(&response, StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "fulfilled");
    assert_eq!(payload["units_fulfilled"], 3);
}

#[tokio::test]
async fn repository_failures_surface_as_internal_errors() {
    let service = RequestService::new(std::sync::Arc::new(UnavailableRepository));
    let response = router_for(service)
        .oneshot(empty_request("GET", "/api/requests", Some(&admin())))
        .await
        .expect("router response");

    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "repository unavailable: document store offline"
    );
}
