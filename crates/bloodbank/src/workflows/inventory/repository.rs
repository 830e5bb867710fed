use super::domain::{StockId, StockLotRecord};
use crate::workflows::store::{MemoryCollection, RepositoryError};

/// Storage abstraction for stock lots.
pub trait StockRepository: Send + Sync {
    fn insert(&self, record: StockLotRecord) -> Result<StockLotRecord, RepositoryError>;
    fn update(&self, record: StockLotRecord) -> Result<(), RepositoryError>;
    /// Writes `record` only if the stored lot still equals `expected`; `Conflict` otherwise.
    fn update_if_unchanged(
        &self,
        expected: &StockLotRecord,
        record: StockLotRecord,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &StockId) -> Result<Option<StockLotRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<StockLotRecord>, RepositoryError>;
}

pub type MemoryStockRepository = MemoryCollection<StockId, StockLotRecord>;

impl StockRepository for MemoryStockRepository {
    fn insert(&self, record: StockLotRecord) -> Result<StockLotRecord, RepositoryError> {
        self.create(record.id.clone(), record)
    }

    fn update(&self, record: StockLotRecord) -> Result<(), RepositoryError> {
        self.replace(record.id.clone(), record)
    }

    fn update_if_unchanged(
        &self,
        expected: &StockLotRecord,
        record: StockLotRecord,
    ) -> Result<(), RepositoryError> {
        self.replace_if_unchanged(record.id.clone(), expected, record)
    }

    fn fetch(&self, id: &StockId) -> Result<Option<StockLotRecord>, RepositoryError> {
        self.get(id)
    }

    fn list(&self) -> Result<Vec<StockLotRecord>, RepositoryError> {
        self.find(|_| true)
    }
}
