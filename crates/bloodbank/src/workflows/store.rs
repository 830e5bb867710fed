use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// In-process document collection keyed by record id.
///
/// Cloning shares the underlying collection, so the same store can back a
/// service and be inspected by tests or the demo.
#[derive(Debug)]
pub struct MemoryCollection<K, V> {
    records: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Default for MemoryCollection<K, V> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> Clone for MemoryCollection<K, V> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<K, V> MemoryCollection<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, V>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("collection lock poisoned".to_string()))
    }

    pub fn create(&self, key: K, value: V) -> Result<V, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, value.clone());
        Ok(value)
    }

    /// Like [`create`](Self::create), but also rejects the insert when any stored
    /// value satisfies `clashes`. The scan and the insert share one lock.
    pub fn create_unless<F>(&self, key: K, value: V, clashes: F) -> Result<V, RepositoryError>
    where
        F: Fn(&V) -> bool,
    {
        let mut guard = self.lock()?;
        if guard.contains_key(&key) || guard.values().any(|existing| clashes(existing)) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, value.clone());
        Ok(value)
    }

    /// Swap in `value` only while the stored record still equals `expected`.
    pub fn replace_if_unchanged(
        &self,
        key: K,
        expected: &V,
        value: V,
    ) -> Result<(), RepositoryError>
    where
        V: PartialEq,
    {
        let mut guard = self.lock()?;
        match guard.get_mut(&key) {
            Some(slot) if *slot == *expected => {
                *slot = value;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    pub fn replace(&self, key: K, value: V) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    pub fn get(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        Ok(self.lock()?.get(key).cloned())
    }

    pub fn remove(&self, key: &K) -> Result<V, RepositoryError> {
        self.lock()?.remove(key).ok_or(RepositoryError::NotFound)
    }

    pub fn find<F>(&self, predicate: F) -> Result<Vec<V>, RepositoryError>
    where
        F: Fn(&V) -> bool,
    {
        Ok(self
            .lock()?
            .values()
            .filter(|value| predicate(value))
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.is_empty())
    }
}
