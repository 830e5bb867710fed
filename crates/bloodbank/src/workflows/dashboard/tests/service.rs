use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::common::*;
use crate::scoring::{RequestUrgency, StockUrgency};
use crate::workflows::dashboard::{
    AlertError, AlertPublisher, DashboardError, DashboardService, StockAlert,
};
use crate::workflows::domain::BloodType;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

struct OfflineAlerts;

impl AlertPublisher for OfflineAlerts {
    fn publish(&self, _alert: StockAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("smtp relay down".to_string()))
    }

    fn recent(&self) -> Result<Vec<StockAlert>, AlertError> {
        Ok(Vec::new())
    }
}

#[test]
fn overview_combines_every_panel() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());
    seed_people(&fixture, now());

    let overview = fixture.dashboard.overview(now()).expect("overview");

    assert_eq!(overview.generated_at, now());
    assert_eq!(overview.donors.total, 3);
    assert_eq!(overview.donors.eligible, 3);
    assert_eq!(overview.donors.available, 2);
    assert_eq!(overview.pending_requests, 3);
    let urgencies: Vec<RequestUrgency> = overview
        .urgent_requests
        .iter()
        .map(|view| view.urgency)
        .collect();
    assert_eq!(urgencies, vec![RequestUrgency::Emergency, RequestUrgency::High]);

    assert_eq!(overview.total_units, 292);
    assert_eq!(overview.stock.len(), 8);
    let critical: Vec<BloodType> = overview
        .stock
        .iter()
        .filter(|summary| summary.urgency == StockUrgency::High)
        .map(|summary| summary.blood_type)
        .collect();
    assert_eq!(
        critical,
        vec![BloodType::ANegative, BloodType::AbNegative, BloodType::BNegative]
    );
}

#[test]
fn low_stock_and_expiry_panels_use_per_lot_rules() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());

    let overview = fixture.dashboard.overview(now()).expect("overview");

    let low: Vec<BloodType> = overview.low_stock.iter().map(|lot| lot.blood_type).collect();
    assert_eq!(low, vec![BloodType::AbNegative, BloodType::BNegative]);

    let expiring: Vec<(BloodType, i64)> = overview
        .expiring_soon
        .iter()
        .map(|lot| (lot.blood_type, lot.days_until_expiration))
        .collect();
    assert_eq!(
        expiring,
        vec![(BloodType::BNegative, 5), (BloodType::AbNegative, 7)]
    );
}

#[test]
fn empty_system_yields_an_empty_overview() {
    let fixture = fixture();

    let overview = fixture.dashboard.overview(now()).expect("overview");

    assert_eq!(overview.donors.total, 0);
    assert_eq!(overview.pending_requests, 0);
    assert_eq!(overview.total_units, 0);
    assert!(overview.stock.is_empty());
    assert!(overview.low_stock.is_empty());
    assert!(overview.expiring_soon.is_empty());
    assert!(fixture.dashboard.low_stock_alerts(now()).expect("alerts").is_empty());
}

#[test]
fn send_alert_requires_admin() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());

    let err = fixture
        .dashboard
        .send_alert(&member(1), BloodType::BNegative, now())
        .expect_err("members cannot alert");
    assert!(matches!(err, DashboardError::AdminRequired));
    assert!(fixture.alerts.recent().expect("recent").is_empty());
}

#[test]
fn send_alert_rejects_types_without_low_stock() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());

    let err = fixture
        .dashboard
        .send_alert(&admin(), BloodType::OPositive, now())
        .expect_err("O+ is well stocked");
    assert!(matches!(err, DashboardError::NoLowStock(BloodType::OPositive)));
}

#[test]
fn send_alert_records_the_notice() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());

    let alert = fixture
        .dashboard
        .send_alert(&admin(), BloodType::BNegative, now())
        .expect("alert recorded");

    assert_eq!(alert.units, 15);
    assert_eq!(alert.max_units, 100);
    assert_eq!(alert.days_until_expiry, 5);
    assert_eq!(alert.lots.len(), 1);
    assert_eq!(
        alert.message,
        "Only 15 units of B- available; 5 days until expiry"
    );
    assert_eq!(alert.raised_by.0, "admin-1");

    let sent = fixture.dashboard.sent_alerts().expect("sent alerts");
    assert_eq!(sent, vec![alert]);
}

#[test]
fn publisher_failures_surface_as_alert_errors() {
    let fixture = fixture();
    seed_stock(&fixture.inventory, now());
    let dashboard = DashboardService::new(
        fixture.donors.clone(),
        fixture.requests.clone(),
        fixture.inventory.clone(),
        Arc::new(OfflineAlerts),
    );

    let err = dashboard
        .send_alert(&admin(), BloodType::AbNegative, now())
        .expect_err("publisher offline");
    assert!(matches!(err, DashboardError::Alerts(_)));
    assert_eq!(err.to_string(), "alert transport unavailable: smtp relay down");
}
