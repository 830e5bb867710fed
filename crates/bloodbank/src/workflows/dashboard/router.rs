use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::service::{AlertPublisher, DashboardError, DashboardService};
use crate::auth::Caller;
use crate::workflows::domain::BloodType;
use crate::workflows::donors::DonorRepository;
use crate::workflows::inventory::StockRepository;
use crate::workflows::requests::RequestRepository;

type SharedDashboard<D, Q, S, A> = Arc<DashboardService<D, Q, S, A>>;

/// Router builder exposing the dashboard endpoints.
pub fn dashboard_router<D, Q, S, A>(service: SharedDashboard<D, Q, S, A>) -> Router
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/dashboard", get(overview_handler::<D, Q, S, A>))
        .route("/api/dashboard/alerts", get(alerts_handler::<D, Q, S, A>))
        .route(
            "/api/dashboard/alerts/sent",
            get(sent_alerts_handler::<D, Q, S, A>),
        )
        .route(
            "/api/dashboard/alerts/:blood_type",
            post(send_alert_handler::<D, Q, S, A>),
        )
        .with_state(service)
}

pub(crate) async fn overview_handler<D, Q, S, A>(
    State(service): State<SharedDashboard<D, Q, S, A>>,
) -> Response
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.overview(Utc::now()) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn alerts_handler<D, Q, S, A>(
    State(service): State<SharedDashboard<D, Q, S, A>>,
) -> Response
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.low_stock_alerts(Utc::now()) {
        Ok(lots) => (StatusCode::OK, Json(lots)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sent_alerts_handler<D, Q, S, A>(
    State(service): State<SharedDashboard<D, Q, S, A>>,
    caller: Caller,
) -> Response
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
{
    if !caller.is_admin() {
        return error_response(DashboardError::AdminRequired);
    }
    match service.sent_alerts() {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn send_alert_handler<D, Q, S, A>(
    State(service): State<SharedDashboard<D, Q, S, A>>,
    caller: Caller,
    Path(blood_type): Path<String>,
) -> Response
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
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

    match service.send_alert(&caller, blood_type, Utc::now()) {
        Ok(alert) => (StatusCode::ACCEPTED, Json(alert)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: DashboardError) -> Response {
    let status = match &err {
        DashboardError::AdminRequired => StatusCode::FORBIDDEN,
        DashboardError::NoLowStock(_) => StatusCode::BAD_REQUEST,
        DashboardError::Alerts(_) => StatusCode::BAD_GATEWAY,
        DashboardError::Donors(_) | DashboardError::Requests(_) | DashboardError::Inventory(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
