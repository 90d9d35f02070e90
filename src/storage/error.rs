use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of a single store call.
///
/// The volatile backend never produces one of these. Every failure of the etcd backend maps to
/// exactly one variant; none of them is retried inside the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The remote service could not be reached or rejected the call.
    #[error("{op}: backend unavailable: {source}")]
    Unavailable {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// The remote call did not complete within the per-operation timeout.
    #[error("{op}: backend did not answer within {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// Stored bytes under `key` are not a valid record.
    #[error("malformed record at {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The initial connection to the remote service failed.
    #[error("failed to connect to etcd at {endpoints}: {source}")]
    Connect {
        endpoints: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// True for the "backend unavailable" family: unreachable, rejected, or timed out.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. } | StoreError::Connect { .. }
        )
    }
}
