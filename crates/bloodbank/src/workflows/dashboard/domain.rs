use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::domain::{BloodType, UserId};
use crate::workflows::donors::DonorCounts;
use crate::workflows::inventory::{BloodTypeSummary, StockId, StockLotView};
use crate::workflows::requests::BloodRequestView;

/// Aggregate view served to the administrative dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub generated_at: DateTime<Utc>,
    pub donors: DonorCounts,
    pub pending_requests: usize,
    pub urgent_requests: Vec<BloodRequestView>,
    pub total_units: u32,
    /// Per blood type, absolute-count rule.
    pub stock: Vec<BloodTypeSummary>,
    /// Lots below 20% of capacity.
    pub low_stock: Vec<StockLotView>,
    /// Lots a week or less from expiry.
    pub expiring_soon: Vec<StockLotView>,
}

/// Low-stock notice recorded when an administrator presses "send alert".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub blood_type: BloodType,
    pub lots: Vec<StockId>,
    pub units: u32,
    pub max_units: u32,
    pub days_until_expiry: i64,
    pub message: String,
    pub raised_by: UserId,
    pub raised_at: DateTime<Utc>,
}
