use super::error::StoreError;
use crate::records::types::Record;

/// Which backend a `RecordStore` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Etcd,
}

/// The CRUD capability over the name-keyed record collection.
///
/// Implementations are shared across request handlers without external synchronization.
/// The store persists what it is given: validation and defaulting happen before `put`.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// A snapshot of every record. Order is unspecified.
    async fn list(&self) -> Result<Vec<Record>, StoreError>;

    /// `Ok(None)` when no record has this name.
    async fn get(&self, name: &str) -> Result<Option<Record>, StoreError>;

    /// Inserts the record, or replaces whatever was stored under `record.name`.
    async fn put(&self, record: Record) -> Result<(), StoreError>;

    /// Removes the record. Deleting an absent name succeeds.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    fn backend(&self) -> Backend;
}
