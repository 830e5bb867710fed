use bloodbank::workflows::dashboard::{AlertError, AlertPublisher, DashboardService, StockAlert};
use bloodbank::workflows::donors::{DonorService, MemoryDonorRepository};
use bloodbank::workflows::inventory::{InventoryService, MemoryStockRepository};
use bloodbank::workflows::requests::{MemoryRequestRepository, RequestService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Records dispatched stock alerts in memory; nothing leaves the process.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<StockAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: StockAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }

    fn recent(&self) -> Result<Vec<StockAlert>, AlertError> {
        Ok(self.events())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<StockAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

pub(crate) type Dashboard = DashboardService<
    MemoryDonorRepository,
    MemoryRequestRepository,
    MemoryStockRepository,
    InMemoryAlertPublisher,
>;

/// Workflow services sharing one set of in-memory collections.
#[derive(Clone)]
pub(crate) struct BloodBankServices {
    pub(crate) donors: Arc<DonorService<MemoryDonorRepository>>,
    pub(crate) requests: Arc<RequestService<MemoryRequestRepository>>,
    pub(crate) inventory: Arc<InventoryService<MemoryStockRepository>>,
    pub(crate) dashboard: Arc<Dashboard>,
    pub(crate) alerts: Arc<InMemoryAlertPublisher>,
}

impl BloodBankServices {
    pub(crate) fn in_memory() -> Self {
        let donors = Arc::new(DonorService::new(Arc::new(MemoryDonorRepository::default())));
        let requests = Arc::new(RequestService::new(Arc::new(
            MemoryRequestRepository::default(),
        )));
        let inventory = Arc::new(InventoryService::new(Arc::new(
            MemoryStockRepository::default(),
        )));
        let alerts = Arc::new(InMemoryAlertPublisher::default());
        let dashboard = Arc::new(DashboardService::new(
            donors.clone(),
            requests.clone(),
            inventory.clone(),
            alerts.clone(),
        ));

        Self {
            donors,
            requests,
            inventory,
            dashboard,
            alerts,
        }
    }
}
