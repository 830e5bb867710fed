use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{DashboardOverview, StockAlert};
use crate::auth::Caller;
use crate::scoring::StockUrgency;
use crate::workflows::domain::BloodType;
use crate::workflows::donors::{DonorRepository, DonorService, DonorServiceError};
use crate::workflows::inventory::{
    InventoryService, InventoryServiceError, StockLotView, StockRepository,
};
use crate::workflows::requests::{RequestRepository, RequestService, RequestServiceError};

/// Outbound hook for low-stock notices. Delivery (email, SMS) is out of scope;
/// implementations only record what would have been sent.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: StockAlert) -> Result<(), AlertError>;
    fn recent(&self) -> Result<Vec<StockAlert>, AlertError>;
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Read-only aggregation over the donor, request and inventory services.
pub struct DashboardService<D, Q, S, A> {
    donors: Arc<DonorService<D>>,
    requests: Arc<RequestService<Q>>,
    inventory: Arc<InventoryService<S>>,
    alerts: Arc<A>,
}

impl<D, Q, S, A> DashboardService<D, Q, S, A>
where
    D: DonorRepository + 'static,
    Q: RequestRepository + 'static,
    S: StockRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(
        donors: Arc<DonorService<D>>,
        requests: Arc<RequestService<Q>>,
        inventory: Arc<InventoryService<S>>,
        alerts: Arc<A>,
    ) -> Self {
        Self {
            donors,
            requests,
            inventory,
            alerts,
        }
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<DashboardOverview, DashboardError> {
        let stock = self.inventory.summary()?;
        let total_units = stock
            .iter()
            .map(|summary| summary.total_units)
            .fold(0u32, u32::saturating_add);
        let available = self.inventory.list_available(now)?;

        let (low_stock, expiring_soon) = partition_alerts(&available);

        Ok(DashboardOverview {
            generated_at: now,
            donors: self.donors.counts(now)?,
            pending_requests: self.requests.pending_count()?,
            urgent_requests: self.requests.urgent(now)?,
            total_units,
            stock,
            low_stock,
            expiring_soon,
        })
    }

    /// Lots that currently warrant a low-stock alert.
    pub fn low_stock_alerts(&self, now: DateTime<Utc>) -> Result<Vec<StockLotView>, DashboardError> {
        Ok(self.inventory.low_stock(now)?)
    }

    /// Record a simulated low-stock notice for one blood type.
    pub fn send_alert(
        &self,
        caller: &Caller,
        blood_type: BloodType,
        now: DateTime<Utc>,
    ) -> Result<StockAlert, DashboardError> {
        if !caller.is_admin() {
            return Err(DashboardError::AdminRequired);
        }

        let lots: Vec<StockLotView> = self
            .inventory
            .low_stock(now)?
            .into_iter()
            .filter(|lot| lot.blood_type == blood_type)
            .collect();
        if lots.is_empty() {
            warn!(blood_type = %blood_type, "alert requested without low stock");
            return Err(DashboardError::NoLowStock(blood_type));
        }

        let units = lots
            .iter()
            .map(|lot| lot.units)
            .fold(0u32, u32::saturating_add);
        let max_units = lots
            .iter()
            .map(|lot| lot.max_units)
            .fold(0u32, u32::saturating_add);
        let days_until_expiry = lots
            .iter()
            .map(|lot| lot.days_until_expiration)
            .min()
            .unwrap_or_default();

        let alert = StockAlert {
            blood_type,
            lots: lots.iter().map(|lot| lot.id.clone()).collect(),
            units,
            max_units,
            days_until_expiry,
            message: format!(
                "Only {units} units of {blood_type} available; {days_until_expiry} days until expiry"
            ),
            raised_by: caller.user_id.clone(),
            raised_at: now,
        };

        self.alerts.publish(alert.clone())?;
        info!(blood_type = %blood_type, units, "low stock alert recorded");
        Ok(alert)
    }

    pub fn sent_alerts(&self) -> Result<Vec<StockAlert>, DashboardError> {
        Ok(self.alerts.recent()?)
    }
}

/// Split available lots into the capacity-rule and expiry-rule panels.
fn partition_alerts(available: &[StockLotView]) -> (Vec<StockLotView>, Vec<StockLotView>) {
    let low_stock = available
        .iter()
        .filter(|lot| lot.capacity_urgency == StockUrgency::High)
        .cloned()
        .collect();
    let mut expiring_soon: Vec<StockLotView> = available
        .iter()
        .filter(|lot| lot.expiry_urgency == StockUrgency::High)
        .cloned()
        .collect();
    expiring_soon.sort_by_key(|lot| lot.expiration_date);
    (low_stock, expiring_soon)
}

/// Error raised by the dashboard service.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("admin access required")]
    AdminRequired,
    #[error("no low-stock lots for {0}")]
    NoLowStock(BloodType),
    #[error(transparent)]
    Donors(#[from] DonorServiceError),
    #[error(transparent)]
    Requests(#[from] RequestServiceError),
    #[error(transparent)]
    Inventory(#[from] InventoryServiceError),
    #[error(transparent)]
    Alerts(#[from] AlertError),
}
