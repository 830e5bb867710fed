//! Blood stock lots: availability listings, per-type summaries, reservations,
//! expiry sweeps and CSV export.
//!
//! Summaries use the absolute-count rule; per-lot views carry both the
//! capacity-fraction and the days-to-expiry tiers.

pub mod domain;
pub mod export;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BloodTypeSummary, Reservation, StockId, StockLotRecord, StockLotSubmission, StockLotUpdate,
    StockLotView, StockSource, StockStatus,
};
pub use export::{export_stock_to_path, write_stock_csv, StockExportError};
pub use repository::{MemoryStockRepository, StockRepository};
pub use router::inventory_router;
pub use service::{percentage_of, InventoryService, InventoryServiceError, StockValidationError};
