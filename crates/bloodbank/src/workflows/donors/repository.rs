use super::domain::{DonorId, DonorRecord};
use crate::workflows::domain::UserId;
use crate::workflows::store::{MemoryCollection, RepositoryError};

/// Storage abstraction for donor profiles.
pub trait DonorRepository: Send + Sync {
    /// Fails with `Conflict` when the owner already has a profile.
    fn insert(&self, record: DonorRecord) -> Result<DonorRecord, RepositoryError>;
    fn update(&self, record: DonorRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &DonorId) -> Result<Option<DonorRecord>, RepositoryError>;
    fn find_by_owner(&self, owner: &UserId) -> Result<Option<DonorRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<DonorRecord>, RepositoryError>;
}

pub type MemoryDonorRepository = MemoryCollection<DonorId, DonorRecord>;

impl DonorRepository for MemoryDonorRepository {
    fn insert(&self, record: DonorRecord) -> Result<DonorRecord, RepositoryError> {
        let owner = record.owner.clone();
        self.create_unless(record.id.clone(), record, |existing| existing.owner == owner)
    }

    fn update(&self, record: DonorRecord) -> Result<(), RepositoryError> {
        self.replace(record.id.clone(), record)
    }

    fn fetch(&self, id: &DonorId) -> Result<Option<DonorRecord>, RepositoryError> {
        self.get(id)
    }

    fn find_by_owner(&self, owner: &UserId) -> Result<Option<DonorRecord>, RepositoryError> {
        Ok(self
            .find(|record| &record.owner == owner)?
            .into_iter()
            .next())
    }

    fn list(&self) -> Result<Vec<DonorRecord>, RepositoryError> {
        self.find(|_| true)
    }
}
