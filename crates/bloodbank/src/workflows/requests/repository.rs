use super::domain::{BloodRequestRecord, RequestId};
use crate::workflows::store::{MemoryCollection, RepositoryError};

/// Storage abstraction so the request service can be exercised in isolation.
pub trait RequestRepository: Send + Sync {
    fn insert(&self, record: BloodRequestRecord) -> Result<BloodRequestRecord, RepositoryError>;
    fn update(&self, record: BloodRequestRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<BloodRequestRecord>, RepositoryError>;
    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<BloodRequestRecord>, RepositoryError>;
}

/// In-memory collection of blood requests.
pub type MemoryRequestRepository = MemoryCollection<RequestId, BloodRequestRecord>;

impl RequestRepository for MemoryRequestRepository {
    fn insert(&self, record: BloodRequestRecord) -> Result<BloodRequestRecord, RepositoryError> {
        self.create(record.id.clone(), record)
    }

    fn update(&self, record: BloodRequestRecord) -> Result<(), RepositoryError> {
        self.replace(record.id.clone(), record)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<BloodRequestRecord>, RepositoryError> {
        self.get(id)
    }

    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError> {
        self.remove(id).map(|_| ())
    }

    fn list(&self) -> Result<Vec<BloodRequestRecord>, RepositoryError> {
        self.find(|_| true)
    }
}
