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

use super::domain::{
    BloodRequestSubmission, BloodRequestUpdate, FulfillmentEntry, RequestId, StatusChange,
};
use super::repository::RequestRepository;
use super::service::{RequestService, RequestServiceError};
use crate::auth::Caller;
use crate::workflows::store::RepositoryError;

/// Router builder exposing the blood request endpoints.
pub fn request_router<R>(service: Arc<RequestService<R>>) -> Router
where
    R: RequestRepository + 'static,
{
    Router::new()
        .route(
            "/api/requests",
            get(list_handler::<R>).post(submit_handler::<R>),
        )
        .route("/api/requests/urgent/list", get(urgent_handler::<R>))
        .route(
            "/api/requests/:request_id",
            get(get_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route(
            "/api/requests/:request_id/status",
            patch(status_handler::<R>),
        )
        .route(
            "/api/requests/:request_id/fulfill",
            post(fulfill_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
) -> Response
where
    R: RequestRepository + 'static,
{
    match service.list(&caller, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Json(submission): Json<BloodRequestSubmission>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = Utc::now();
    match service.submit(&caller, submission, now) {
        Ok(record) => (StatusCode::CREATED, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
{
    match service.get(&caller, &RequestId(request_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view(Utc::now()))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Path(request_id): Path<String>,
    Json(update): Json<BloodRequestUpdate>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = Utc::now();
    match service.update(&caller, &RequestId(request_id), update, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Path(request_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = Utc::now();
    match service.set_status(&caller, &RequestId(request_id), change, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn fulfill_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Path(request_id): Path<String>,
    Json(entry): Json<FulfillmentEntry>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = Utc::now();
    match service.fulfill(&caller, &RequestId(request_id), entry, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn urgent_handler<R>(State(service): State<Arc<RequestService<R>>>) -> Response
where
    R: RequestRepository + 'static,
{
    match service.urgent(Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<RequestService<R>>>,
    caller: Caller,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
{
    match service.delete(&caller, &RequestId(request_id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "blood request deleted successfully" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: RequestServiceError) -> Response {
    let (status, message) = match &err {
        RequestServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        RequestServiceError::Forbidden | RequestServiceError::AdminRequired => {
            (StatusCode::FORBIDDEN, err.to_string())
        }
        RequestServiceError::AlreadyFulfilled | RequestServiceError::NotPending => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        RequestServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            "blood request not found".to_string(),
        ),
        RequestServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        RequestServiceError::Repository(RepositoryError::Unavailable(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
