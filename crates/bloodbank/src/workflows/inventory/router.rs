use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{Reservation, StockId, StockLotSubmission, StockLotUpdate};
use super::repository::StockRepository;
use super::service::{InventoryService, InventoryServiceError};
use crate::auth::Caller;
use crate::workflows::domain::BloodType;
use crate::workflows::store::RepositoryError;

/// Router builder exposing the stock endpoints.
pub fn inventory_router<R>(service: Arc<InventoryService<R>>) -> Router
where
    R: StockRepository + 'static,
{
    Router::new()
        .route("/api/stock", get(list_handler::<R>).post(add_handler::<R>))
        .route("/api/stock/summary", get(summary_handler::<R>))
        .route("/api/stock/export", get(export_handler::<R>))
        .route("/api/stock/expire", post(expire_handler::<R>))
        .route("/api/stock/type/:blood_type", get(by_type_handler::<R>))
        .route("/api/stock/expiring/:days", get(expiring_handler::<R>))
        .route("/api/stock/:stock_id", put(update_handler::<R>))
        .route("/api/stock/:stock_id/reserve", post(reserve_handler::<R>))
        .with_state(service)
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<InventoryService<R>>>) -> Response
where
    R: StockRepository + 'static,
{
    match service.list_available(Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn by_type_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Path(blood_type): Path<String>,
) -> Response
where
    R: StockRepository + 'static,
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

    match service.by_blood_type(blood_type, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<R>(State(service): State<Arc<InventoryService<R>>>) -> Response
where
    R: StockRepository + 'static,
{
    match service.summary() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    caller: Caller,
    Json(submission): Json<StockLotSubmission>,
) -> Response
where
    R: StockRepository + 'static,
{
    let now = Utc::now();
    match service.add(&caller, submission, now) {
        Ok(record) => (StatusCode::CREATED, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    caller: Caller,
    Path(stock_id): Path<String>,
    Json(update): Json<StockLotUpdate>,
) -> Response
where
    R: StockRepository + 'static,
{
    let now = Utc::now();
    match service.update(&caller, &StockId(stock_id), update, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reserve_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    caller: Caller,
    Path(stock_id): Path<String>,
    Json(reservation): Json<Reservation>,
) -> Response
where
    R: StockRepository + 'static,
{
    let now = Utc::now();
    match service.reserve(&caller, &StockId(stock_id), reservation, now) {
        Ok(record) => (StatusCode::OK, Json(record.view(now))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn expiring_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Path(days): Path<i64>,
) -> Response
where
    R: StockRepository + 'static,
{
    match service.expiring_within(days, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn expire_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    caller: Caller,
) -> Response
where
    R: StockRepository + 'static,
{
    match service.expire_lapsed(&caller, Utc::now()) {
        Ok(expired) => (
            StatusCode::OK,
            Json(json!({ "expired": expired.len(), "ids": expired })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<InventoryService<R>>>) -> Response
where
    R: StockRepository + 'static,
{
    let now = Utc::now();
    match service.export_csv(now) {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"blood_stock_export_{}.csv\"",
                now.format("%Y-%m-%d")
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: InventoryServiceError) -> Response {
    let (status, message) = match &err {
        InventoryServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        InventoryServiceError::InsufficientPermissions => (StatusCode::FORBIDDEN, err.to_string()),
        InventoryServiceError::NotAvailable | InventoryServiceError::InsufficientUnits { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        InventoryServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            "blood stock not found".to_string(),
        ),
        InventoryServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            "blood stock was modified concurrently".to_string(),
        ),
        InventoryServiceError::Export(_)
        | InventoryServiceError::Repository(RepositoryError::Unavailable(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
