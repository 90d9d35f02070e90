use super::etcd::EtcdStore;
use super::memory::MemoryStore;
use super::store::RecordStore;
use crate::config::StoreConfig;

use std::sync::Arc;

/// Chooses the record backend, once, from `config`.
///
/// No endpoints means a volatile in-memory store. With endpoints, an etcd store is built; if
/// that fails the service keeps running on a volatile store instead of refusing to start, and
/// the swap is logged at WARN so it is never silent.
pub async fn select_store(config: &StoreConfig) -> Arc<dyn RecordStore> {
    if config.endpoints.is_empty() {
        tracing::info!("ETCD_ENDPOINTS not set, record store backend: in-memory");
        return Arc::new(MemoryStore::new());
    }

    tracing::info!(
        "Connecting to etcd at {:?} with prefix {}",
        config.endpoints,
        config.prefix
    );

    match EtcdStore::connect(config).await {
        Ok(store) => {
            tracing::info!("Record store backend: etcd");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "etcd unavailable ({}); record store backend: in-memory fallback, records will not survive a restart",
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
