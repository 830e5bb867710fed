//! Administrative overview and low-stock alerting across donors, requests
//! and inventory.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{DashboardOverview, StockAlert};
pub use router::dashboard_router;
pub use service::{AlertError, AlertPublisher, DashboardError, DashboardService};
