use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{DonorId, DonorProfileUpdate, DonorRegistration, EligibilityChange};
use super::repository::DonorRepository;
use super::service::{DonorService, DonorServiceError};
use crate::auth::Caller;
use crate::workflows::domain::BloodType;
use crate::workflows::store::RepositoryError;

/// Router builder exposing the donor endpoints.
pub fn donor_router<R>(service: Arc<DonorService<R>>) -> Router
where
    R: DonorRepository + 'static,
{
    Router::new()
        .route(
            "/api/donors",
            get(list_handler::<R>).post(register_handler::<R>),
        )
        .route(
            "/api/donors/profile/me",
            get(profile_handler::<R>).put(update_profile_handler::<R>),
        )
        .route(
            "/api/donors/blood-type/:blood_type",
            get(blood_type_handler::<R>),
        )
        .route(
            "/api/donors/eligible/donation",
            get(available_handler::<R>),
        )
        .route("/api/donors/stats/overview", get(stats_handler::<R>))
        .route("/api/donors/search/:query", get(search_handler::<R>))
        .route("/api/donors/:donor_id", get(get_handler::<R>))
        .route(
            "/api/donors/:donor_id/eligibility",
            patch(eligibility_handler::<R>),
        )
        .route(
            "/api/donors/:donor_id/donation",
            post(donation_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Json(registration): Json<DonorRegistration>,
) -> Response
where
    R: DonorRepository + 'static,
{
    let now = Utc::now();
    match service.register(&caller, registration, now) {
        Ok(record) => (StatusCode::CREATED, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.list(&caller, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Path(donor_id): Path<String>,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.get(&caller, &DonorId(donor_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view(Utc::now()))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn profile_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.profile(&caller) {
        Ok(record) => (StatusCode::OK, Json(record.view(Utc::now()))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_profile_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Json(update): Json<DonorProfileUpdate>,
) -> Response
where
    R: DonorRepository + 'static,
{
    let now = Utc::now();
    match service.update_profile(&caller, update, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn eligibility_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Path(donor_id): Path<String>,
    Json(change): Json<EligibilityChange>,
) -> Response
where
    R: DonorRepository + 'static,
{
    let now = Utc::now();
    match service.set_eligibility(&caller, &DonorId(donor_id), change, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn blood_type_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    Path(blood_type): Path<String>,
) -> Response
where
    R: DonorRepository + 'static,
{
    let blood_type = match blood_type.parse::<BloodType>() {
        Ok(blood_type) => blood_type,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    match service.by_blood_type(blood_type) {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn available_handler<R>(State(service): State<Arc<DonorService<R>>>) -> Response
where
    R: DonorRepository + 'static,
{
    match service.available_for_donation(Utc::now()) {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn donation_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Path(donor_id): Path<String>,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.record_donation(&caller, &DonorId(donor_id), Utc::now()) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "message": "donation recorded successfully",
                "donor": receipt.donor,
                "next_eligible_date": receipt.next_eligible_date,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.statistics(&caller, Utc::now()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn search_handler<R>(
    State(service): State<Arc<DonorService<R>>>,
    caller: Caller,
    Path(query): Path<String>,
) -> Response
where
    R: DonorRepository + 'static,
{
    match service.search(&caller, &query, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: DonorServiceError) -> Response {
    let (status, message) = match &err {
        DonorServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        DonorServiceError::Forbidden | DonorServiceError::AdminRequired => {
            (StatusCode::FORBIDDEN, err.to_string())
        }
        DonorServiceError::DuplicateProfile => (StatusCode::CONFLICT, err.to_string()),
        DonorServiceError::ProfileNotFound => (StatusCode::NOT_FOUND, err.to_string()),
        DonorServiceError::NotEligible | DonorServiceError::CooldownActive { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DonorServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, "donor not found".to_string())
        }
        DonorServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DonorServiceError::Repository(RepositoryError::Unavailable(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
