use crate::infra::{AppState, BloodBankServices};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bloodbank::workflows::dashboard::dashboard_router;
use bloodbank::workflows::donors::donor_router;
use bloodbank::workflows::inventory::inventory_router;
use bloodbank::workflows::requests::request_router;
use serde_json::json;

/// Every workflow router plus the operational endpoints.
pub(crate) fn with_application_routes(services: &BloodBankServices) -> Router {
    request_router(services.requests.clone())
        .merge(donor_router(services.donors.clone()))
        .merge(inventory_router(services.inventory.clone()))
        .merge(dashboard_router(services.dashboard.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
