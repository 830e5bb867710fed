use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderValue, Request},
    response::Response,
    Extension, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;

use crate::auth::{Caller, Role, TokenSigner};
use crate::scoring::RequestUrgency;
use crate::workflows::dashboard::{
    dashboard_router, AlertError, AlertPublisher, DashboardService, StockAlert,
};
use crate::workflows::domain::{Address, BloodType, UserId};
use crate::workflows::donors::{
    ContactDetails, DonorRegistration, DonorService, Gender, MemoryDonorRepository,
};
use crate::workflows::inventory::{
    InventoryService, MemoryStockRepository, StockLotSubmission, StockSource,
};
use crate::workflows::requests::{
    BloodRequestSubmission, DoctorContact, MemoryRequestRepository, RequestService,
};

pub(super) const TEST_SECRET: &str = "dashboard-tests";

pub(super) type TestDashboard = DashboardService<
    MemoryDonorRepository,
    MemoryRequestRepository,
    MemoryStockRepository,
    RecordingAlerts,
>;

#[derive(Default, Clone)]
pub(super) struct RecordingAlerts {
    events: Arc<Mutex<Vec<StockAlert>>>,
}

impl AlertPublisher for RecordingAlerts {
    fn publish(&self, alert: StockAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }

    fn recent(&self) -> Result<Vec<StockAlert>, AlertError> {
        Ok(self.events.lock().expect("alert mutex poisoned").clone())
    }
}

pub(super) struct Fixture {
    pub(super) dashboard: TestDashboard,
    pub(super) donors: Arc<DonorService<MemoryDonorRepository>>,
    pub(super) requests: Arc<RequestService<MemoryRequestRepository>>,
    pub(super) inventory: Arc<InventoryService<MemoryStockRepository>>,
    pub(super) alerts: Arc<RecordingAlerts>,
}

pub(super) fn fixture() -> Fixture {
    let donors = Arc::new(DonorService::new(Arc::new(MemoryDonorRepository::default())));
    let requests = Arc::new(RequestService::new(Arc::new(
        MemoryRequestRepository::default(),
    )));
    let inventory = Arc::new(InventoryService::new(Arc::new(
        MemoryStockRepository::default(),
    )));
    let alerts = Arc::new(RecordingAlerts::default());
    let dashboard = DashboardService::new(
        donors.clone(),
        requests.clone(),
        inventory.clone(),
        alerts.clone(),
    );
    Fixture {
        dashboard,
        donors,
        requests,
        inventory,
        alerts,
    }
}

pub(super) fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

pub(super) fn member(n: u32) -> Caller {
    Caller::new(format!("user-{n}"), Role::User)
}

/// Stock lots mirroring the sample dashboard: (type, units, days to expiry), capacity 100.
pub(super) const SAMPLE_STOCK: [(BloodType, u32, i64); 8] = [
    (BloodType::APositive, 45, 12),
    (BloodType::ANegative, 20, 8),
    (BloodType::BPositive, 65, 18),
    (BloodType::BNegative, 15, 5),
    (BloodType::AbPositive, 30, 10),
    (BloodType::AbNegative, 12, 7),
    (BloodType::OPositive, 80, 20),
    (BloodType::ONegative, 25, 14),
];

pub(super) fn seed_stock(inventory: &InventoryService<MemoryStockRepository>, now: DateTime<Utc>) {
    for (blood_type, units, days) in SAMPLE_STOCK {
        inventory
            .add(
                &admin(),
                StockLotSubmission {
                    blood_type,
                    units,
                    max_units: 100,
                    hospital: Some(UserId("hospital-1".to_string())),
                    location: Address::default(),
                    expiration_date: now + Duration::days(days),
                    source: StockSource::Donation,
                    notes: None,
                },
                now,
            )
            .expect("seed stock");
    }
}

pub(super) fn seed_people(fixture: &Fixture, now: DateTime<Utc>) {
    for (n, last_donation) in [(1, None), (2, Some(now - Duration::days(30))), (3, None)] {
        fixture
            .donors
            .register(
                &member(n),
                DonorRegistration {
                    contact: ContactDetails {
                        name: format!("Donor {n}"),
                        email: format!("donor{n}@example.org"),
                        ..ContactDetails::default()
                    },
                    blood_type: BloodType::OPositive,
                    date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2).expect("valid date"),
                    gender: Gender::Other,
                    weight_kg: 70.0,
                    height_cm: 175.0,
                    last_donation,
                    medical_history: Vec::new(),
                    medications: Vec::new(),
                    emergency_contact: None,
                    preferred_donation_center: None,
                },
                now,
            )
            .expect("seed donor");
    }

    for (urgency, days) in [
        (RequestUrgency::Emergency, 1),
        (RequestUrgency::High, 4),
        (RequestUrgency::Low, 2),
    ] {
        fixture
            .requests
            .submit(
                &member(1),
                BloodRequestSubmission {
                    patient_name: "Pat Doe".to_string(),
                    blood_type: BloodType::ONegative,
                    units: 2,
                    urgency,
                    hospital: Address::default(),
                    doctor: DoctorContact::default(),
                    reason: "Surgery".to_string(),
                    required_by: now + Duration::days(days),
                    notes: None,
                },
                now,
            )
            .expect("seed request");
    }
}

pub(super) fn router_for(dashboard: TestDashboard) -> Router {
    dashboard_router(Arc::new(dashboard)).layer(Extension(TokenSigner::new(TEST_SECRET)))
}

pub(super) fn request(method: &str, uri: &str, caller: Option<&Caller>) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        let token = TokenSigner::new(TEST_SECRET)
            .issue(caller)
            .expect("token issues");
        builder = builder.header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        );
    }
    builder.body(axum::body::Body::empty()).expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}
