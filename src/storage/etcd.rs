//! etcd-backed Record Store
//!
//! Every record lives at `<prefix>/<name>` as its JSON encoding, one key per record, with no
//! secondary indexes. The adapter holds no local state: concurrent writers to the same name
//! race at etcd and the last write etcd accepts wins.
//!
//! Each remote call is bounded by `op_timeout`. A call that exceeds it, or that etcd rejects,
//! fails with an unavailable error for that call only; nothing is retried here.

use super::error::{BoxError, StoreError};
use super::store::{Backend, RecordStore};
use crate::config::StoreConfig;
use crate::records::types::Record;

use etcd_client::{Client, ConnectOptions, GetOptions};
use std::future::Future;
use std::time::Duration;

const KEY_SEPARATOR: char = '/';

/// The raw key/value calls `EtcdStore` needs from its client.
///
/// Implemented for `etcd_client::Client`; tests substitute an in-process map.
#[async_trait::async_trait]
pub trait KvClient: Send + Sync + 'static {
    /// Every `(key, value)` pair whose key starts with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, BoxError>;

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError>;

    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), BoxError>;

    /// Removes `key`, returning how many keys were deleted.
    async fn remove(&self, key: &str) -> Result<i64, BoxError>;
}

// The etcd client wraps a shared gRPC channel; clones are cheap and hand each call its own
// `&mut` handle without serializing callers.
#[async_trait::async_trait]
impl KvClient for Client {
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, BoxError> {
        let mut client = self.clone();
        let response = client
            .get(prefix, Some(GetOptions::new().with_prefix()))
            .await?;

        Ok(response
            .kvs()
            .iter()
            .map(|kv| {
                (
                    String::from_utf8_lossy(kv.key()).into_owned(),
                    kv.value().to_vec(),
                )
            })
            .collect())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError> {
        let mut client = self.clone();
        let response = client.get(key, None).await?;
        Ok(response.kvs().first().map(|kv| kv.value().to_vec()))
    }

    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), BoxError> {
        let mut client = self.clone();
        client.put(key, value, None).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<i64, BoxError> {
        let mut client = self.clone();
        let response = client.delete(key, None).await?;
        Ok(response.deleted())
    }
}

/// Strips trailing separators so that `/ns` and `/ns/` name the same namespace.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches(KEY_SEPARATOR).to_string()
}

/// The etcd key of `name` under an already-normalized `prefix`.
pub fn record_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{KEY_SEPARATOR}{name}")
}

pub struct EtcdStore<C: KvClient = Client> {
    client: C,
    prefix: String,
    op_timeout: Duration,
}

impl EtcdStore<Client> {
    /// Connects to etcd and counts the records under the namespace once.
    ///
    /// `etcd_client` may connect lazily, so that count is what turns an unreachable cluster
    /// into a construction failure instead of a failure on the first request.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let endpoints = config.endpoints.join(",");
        let connect_err = |source: BoxError| StoreError::Connect {
            endpoints: endpoints.clone(),
            source,
        };

        let options = ConnectOptions::new()
            .with_connect_timeout(config.dial_timeout)
            .with_timeout(config.op_timeout);

        let client = tokio::time::timeout(
            config.dial_timeout,
            Client::connect(&config.endpoints, Some(options)),
        )
        .await
        .map_err(|_| {
            connect_err(format!("no connection within {:?}", config.dial_timeout).into())
        })?
        .map_err(|e| connect_err(e.into()))?;

        let store = Self::with_client(client, &config.prefix, config.op_timeout);
        store.count_existing(config.dial_timeout).await.map_err(connect_err)?;

        tracing::info!(
            "Connected to etcd at {} with prefix {}",
            endpoints,
            store.prefix
        );
        Ok(store)
    }

    async fn count_existing(&self, within: Duration) -> Result<(), BoxError> {
        let mut client = self.client.clone();
        let options = GetOptions::new().with_prefix().with_count_only();
        let response = tokio::time::timeout(within, client.get(self.namespace(), Some(options)))
            .await
            .map_err(|_| format!("record count did not complete within {within:?}"))??;

        tracing::debug!(
            "etcd already holds {} existing record(s) under {}",
            response.count(),
            self.prefix
        );
        Ok(())
    }
}

impl<C: KvClient> EtcdStore<C> {
    pub fn with_client(client: C, prefix: &str, op_timeout: Duration) -> Self {
        Self {
            client,
            prefix: normalize_prefix(prefix),
            op_timeout,
        }
    }

    pub fn key_for(&self, name: &str) -> String {
        record_key(&self.prefix, name)
    }

    // Scanning `<prefix>/` rather than `<prefix>` keeps sibling namespaces such as `/ns2`
    // out of a listing of `/ns`.
    fn namespace(&self) -> String {
        format!("{}{}", self.prefix, KEY_SEPARATOR)
    }

    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, BoxError>>,
    {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(StoreError::Unavailable { op, source }),
            Err(_) => Err(StoreError::Timeout {
                op,
                after: self.op_timeout,
            }),
        }
    }
}

#[async_trait::async_trait]
impl<C: KvClient> RecordStore for EtcdStore<C> {
    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let entries = self
            .bounded("list", self.client.scan_prefix(&self.namespace()))
            .await?;

        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match serde_json::from_slice::<Record>(&value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed record at {}: {}", key, e);
                }
            }
        }
        Ok(records)
    }

    async fn get(&self, name: &str) -> Result<Option<Record>, StoreError> {
        let key = self.key_for(name);
        let Some(value) = self.bounded("get", self.client.fetch(&key)).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&value)
            .map(Some)
            .map_err(|source| StoreError::Serialization { key, source })
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        let key = self.key_for(&record.name);
        let value = serde_json::to_vec(&record).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;

        self.bounded("put", self.client.store(&key, value)).await
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let key = self.key_for(name);
        let deleted = self.bounded("delete", self.client.remove(&key)).await?;
        if deleted == 0 {
            tracing::debug!("Delete of absent key {} ignored", key);
        }
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::Etcd
    }
}

impl<C: KvClient> Drop for EtcdStore<C> {
    fn drop(&mut self) {
        tracing::info!("Releasing etcd connection for prefix {}", self.prefix);
    }
}
