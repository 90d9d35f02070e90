use super::error::StoreError;
use super::store::{Backend, RecordStore};
use crate::records::types::Record;

use parking_lot::RwLock;
use std::collections::HashMap;

/// Volatile, process-local record store.
///
/// One reader/writer lock guards the whole map: `get`/`list` share it, `put`/`delete` hold it
/// exclusively. Every operation is in-memory and cannot fail.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_local(&self) -> Vec<Record> {
        self.records.read().values().cloned().collect()
    }

    pub fn get_local(&self, name: &str) -> Option<Record> {
        self.records.read().get(name).cloned()
    }

    pub fn put_local(&self, record: Record) {
        self.records.write().insert(record.name.clone(), record);
    }

    pub fn delete_local(&self, name: &str) {
        if self.records.write().remove(name).is_none() {
            tracing::debug!("Delete of absent record {} ignored", name);
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.list_local())
    }

    async fn get(&self, name: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.get_local(name))
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        self.put_local(record);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.delete_local(name);
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}
