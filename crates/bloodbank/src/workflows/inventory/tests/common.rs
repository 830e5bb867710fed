use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::{Extension, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::auth::{Caller, Role, TokenSigner};
use crate::workflows::domain::{Address, BloodType, UserId};
use crate::workflows::inventory::domain::{
    StockId, StockLotRecord, StockLotSubmission, StockSource,
};
use crate::workflows::inventory::repository::{MemoryStockRepository, StockRepository};
use crate::workflows::store::RepositoryError;
use crate::workflows::inventory::{inventory_router, InventoryService};

const TEST_SECRET: &str = "inventory-tests";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 6, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

pub(super) fn hospital(n: u32) -> Caller {
    Caller::new(format!("hospital-{n}"), Role::Hospital)
}

pub(super) fn member() -> Caller {
    Caller::new("user-1", Role::User)
}

pub(super) fn lot(
    blood_type: BloodType,
    units: u32,
    max_units: u32,
    expires_in_days: i64,
    base: DateTime<Utc>,
) -> StockLotSubmission {
    StockLotSubmission {
        blood_type,
        units,
        max_units,
        hospital: Some(UserId("hospital-1".to_string())),
        location: Address {
            name: Some("Central Blood Bank".to_string()),
            address: None,
            city: Some("Iowa City".to_string()),
            state: Some("IA".to_string()),
        },
        expiration_date: base + Duration::days(expires_in_days),
        source: StockSource::Donation,
        notes: None,
    }
}

pub(super) fn build_service() -> (InventoryService<MemoryStockRepository>, Arc<MemoryStockRepository>) {
    let repository = Arc::new(MemoryStockRepository::default());
    let service = InventoryService::new(repository.clone());
    (service, repository)
}

pub(super) fn seed(
    service: &InventoryService<MemoryStockRepository>,
    lots: Vec<StockLotSubmission>,
) -> Vec<StockLotRecord> {
    lots.into_iter()
        .map(|submission| {
            service
                .add(&admin(), submission, now())
                .expect("seed lot")
        })
        .collect()
}

pub(super) fn router_for(service: InventoryService<MemoryStockRepository>) -> Router {
    inventory_router(Arc::new(service)).layer(Extension(TokenSigner::new(TEST_SECRET)))
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

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}

/// Another writer takes `competing_units` from the lot just before each of the
/// first `races` guarded writes.
pub(super) struct ContendedRepository {
    inner: MemoryStockRepository,
    races: AtomicUsize,
    competing_units: u32,
}

impl ContendedRepository {
    pub(super) fn new(races: usize, competing_units: u32) -> Self {
        Self {
            inner: MemoryStockRepository::default(),
            races: AtomicUsize::new(races),
            competing_units,
        }
    }
}

impl StockRepository for ContendedRepository {
    fn insert(&self, record: StockLotRecord) -> Result<StockLotRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: StockLotRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn update_if_unchanged(
        &self,
        expected: &StockLotRecord,
        record: StockLotRecord,
    ) -> Result<(), RepositoryError> {
        let raced = self
            .races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if raced {
            let mut competitor = expected.clone();
            competitor.units -= self.competing_units;
            self.inner.update(competitor)?;
        }
        self.inner.update_if_unchanged(expected, record)
    }

    fn fetch(&self, id: &StockId) -> Result<Option<StockLotRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<StockLotRecord>, RepositoryError> {
        self.inner.list()
    }
}
