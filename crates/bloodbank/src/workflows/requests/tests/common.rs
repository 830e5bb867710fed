use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::{Extension, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::auth::{Caller, Role, TokenSigner};
use crate::scoring::RequestUrgency;
use crate::workflows::domain::{Address, BloodType};
use crate::workflows::requests::domain::{
    BloodRequestRecord, BloodRequestSubmission, DoctorContact, RequestId,
};
use crate::workflows::requests::repository::{MemoryRequestRepository, RequestRepository};
use crate::workflows::requests::{request_router, RequestService};
use crate::workflows::store::RepositoryError;

pub(super) const TEST_SECRET: &str = "request-tests";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

pub(super) fn requester() -> Caller {
    Caller::new("user-100", Role::User)
}

pub(super) fn other_requester() -> Caller {
    Caller::new("user-200", Role::User)
}

pub(super) fn submission(urgency: RequestUrgency, required_by: DateTime<Utc>) -> BloodRequestSubmission {
    BloodRequestSubmission {
        patient_name: "Ada Moreno".to_string(),
        blood_type: BloodType::ONegative,
        units: 3,
        urgency,
        hospital: Address {
            name: Some("St. Mary Regional".to_string()),
            address: Some("12 Harbor Way".to_string()),
            city: Some("Des Moines".to_string()),
            state: Some("IA".to_string()),
        },
        doctor: DoctorContact {
            name: Some("Dr. Patel".to_string()),
            phone: Some("555-0101".to_string()),
            email: None,
        },
        reason: "Scheduled cardiac surgery".to_string(),
        required_by,
        notes: None,
    }
}

pub(super) fn days_from_now(days: i64) -> DateTime<Utc> {
    now() + Duration::days(days)
}

pub(super) fn build_service() -> (
    RequestService<MemoryRequestRepository>,
    Arc<MemoryRequestRepository>,
) {
    let repository = Arc::new(MemoryRequestRepository::default());
    let service = RequestService::new(repository.clone());
    (service, repository)
}

pub(super) fn router_for<R>(service: RequestService<R>) -> Router
where
    R: RequestRepository + 'static,
{
    request_router(Arc::new(service)).layer(Extension(TokenSigner::new(TEST_SECRET)))
}

pub(super) fn bearer(caller: &Caller) -> HeaderValue {
    let token = TokenSigner::new(TEST_SECRET)
        .issue(caller)
        .expect("token issues");
    HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header")
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    caller: Option<&Caller>,
    body: &Value,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(caller) = caller {
        builder = builder.header(header::AUTHORIZATION, bearer(caller));
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializable body"),
        ))
        .expect("valid request")
}

pub(super) fn empty_request(
    method: &str,
    uri: &str,
    caller: Option<&Caller>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(header::AUTHORIZATION, bearer(caller));
    }
    builder
        .body(axum::body::Body::empty())
        .expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

pub(super) struct UnavailableRepository;

impl RequestRepository for UnavailableRepository {
    fn insert(&self, _record: BloodRequestRecord) -> Result<BloodRequestRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn update(&self, _record: BloodRequestRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<BloodRequestRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn delete(&self, _id: &RequestId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }

    fn list(&self) -> Result<Vec<BloodRequestRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("document store offline".to_string()))
    }
}
