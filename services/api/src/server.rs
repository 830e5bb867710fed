use crate::cli::ServeArgs;
use crate::demo::seed_demo_data;
use crate::infra::{AppState, BloodBankServices};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bloodbank::auth::TokenSigner;
use bloodbank::config::AppConfig;
use bloodbank::error::AppError;
use bloodbank::telemetry;
use chrono::{DateTime, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = build_services(&config, Utc::now())?;

    let app = with_application_routes(&services)
        .layer(Extension(app_state))
        .layer(Extension(TokenSigner::new(&config.auth.token_secret)))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "blood bank service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires the in-memory services, seeding the demo data set when `APP_SEED_DEMO` is on.
pub(crate) fn build_services(
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<BloodBankServices, AppError> {
    let services = BloodBankServices::in_memory();
    if config.seed_demo_data {
        let seeded = seed_demo_data(&services, now)?;
        info!(
            stock_lots = seeded.stock_lots,
            donors = seeded.donors,
            requests = seeded.requests,
            "demo data seeded"
        );
    }
    Ok(services)
}
