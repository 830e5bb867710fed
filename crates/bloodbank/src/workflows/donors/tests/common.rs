use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::{Extension, Router};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::auth::{Caller, Role, TokenSigner};
use crate::workflows::domain::BloodType;
use crate::workflows::donors::domain::{ContactDetails, DonorRegistration, Gender};
use crate::workflows::donors::repository::MemoryDonorRepository;
use crate::workflows::donors::{donor_router, DonorService};

const TEST_SECRET: &str = "donor-tests";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

pub(super) fn donor_user(n: u32) -> Caller {
    Caller::new(format!("user-{n}"), Role::User)
}

pub(super) fn registration(name: &str, blood_type: BloodType) -> DonorRegistration {
    DonorRegistration {
        contact: ContactDetails {
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
            phone: Some("555-0150".to_string()),
            city: Some("Cedar Rapids".to_string()),
            state: Some("IA".to_string()),
        },
        blood_type,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15).expect("valid date"),
        gender: Gender::Female,
        weight_kg: 62.5,
        height_cm: 168.0,
        last_donation: None,
        medical_history: Vec::new(),
        medications: Vec::new(),
        emergency_contact: None,
        preferred_donation_center: Some("Downtown Center".to_string()),
    }
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn build_service() -> (DonorService<MemoryDonorRepository>, Arc<MemoryDonorRepository>) {
    let repository = Arc::new(MemoryDonorRepository::default());
    let service = DonorService::new(repository.clone());
    (service, repository)
}

pub(super) fn router_for(service: DonorService<MemoryDonorRepository>) -> Router {
    donor_router(Arc::new(service)).layer(Extension(TokenSigner::new(TEST_SECRET)))
}

pub(super) fn request(
    method: &str,
    uri: &str,
    caller: Option<&Caller>,
    body: Option<&Value>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        let token = TokenSigner::new(TEST_SECRET)
            .issue(caller)
            .expect("token issues");
        builder = builder.header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        );
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            axum::body::Body::from(serde_json::to_vec(value).expect("serializable body"))
        }
        None => axum::body::Body::empty(),
    };
    builder.body(body).expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
