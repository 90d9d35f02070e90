//! Process Configuration
//!
//! Everything the service reads from its environment is collected here, once, into plain
//! structs. Nothing below `main` looks at environment variables directly; the selector and
//! the server receive these values as arguments.
//!
//! | variable | default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `SHUTDOWN_TIMEOUT_SECS` | `30` |
//! | `REQUEST_TIMEOUT_SECS` | `15` |
//! | `ETCD_ENDPOINTS` | unset (volatile store) |
//! | `ETCD_PREFIX` | `/polycloud/records` |
//! | `ETCD_DIAL_TIMEOUT_MS` | `5000` |
//! | `ETCD_OP_TIMEOUT_MS` | `5000` |

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PREFIX: &str = "/polycloud/records";

const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the record store.
///
/// An empty `endpoints` list means "no remote backend": the selector builds a volatile
/// in-memory store instead.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// etcd endpoints, already split and whitespace-trimmed.
    pub endpoints: Vec<String>,
    /// Namespace under which every record key is written.
    pub prefix: String,
    /// Upper bound on establishing the initial etcd connection.
    pub dial_timeout: Duration,
    /// Upper bound on every individual etcd call.
    pub op_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoints = lookup("ETCD_ENDPOINTS")
            .map(|raw| parse_endpoints(&raw))
            .unwrap_or_default();

        let prefix = lookup("ETCD_PREFIX")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let dial_timeout = parse_millis(&lookup, "ETCD_DIAL_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_DIAL_TIMEOUT);
        let op_timeout =
            parse_millis(&lookup, "ETCD_OP_TIMEOUT_MS")?.unwrap_or(DEFAULT_OP_TIMEOUT);

        Ok(Self {
            endpoints,
            prefix,
            dial_timeout,
            op_timeout,
        })
    }
}

/// Top-level configuration of the `record-service` binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// How long in-flight requests get to drain after a shutdown signal.
    pub shutdown_timeout: Duration,
    /// Upper bound on handling a single HTTP request; slower requests get 408.
    pub request_timeout: Duration,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        let shutdown_timeout =
            parse_secs(&lookup, "SHUTDOWN_TIMEOUT_SECS")?.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        let request_timeout =
            parse_secs(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            bind_addr,
            shutdown_timeout,
            request_timeout,
            store: StoreConfig::from_lookup(lookup)?,
        })
    }
}

/// Splits a comma-delimited endpoint list, trimming each entry and dropping blanks.
pub fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("{key} is not a number of milliseconds: {raw}"))
        })
        .transpose()
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} is not a number: {raw}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.store.endpoints.is_empty());
        assert_eq!(config.store.prefix, DEFAULT_PREFIX);
        assert_eq!(config.store.dial_timeout, Duration::from_secs(5));
        assert_eq!(config.store.op_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_endpoints_are_split_and_trimmed() {
        let endpoints = parse_endpoints(" http://10.0.0.1:2379 ,http://10.0.0.2:2379,  ");

        assert_eq!(
            endpoints,
            vec!["http://10.0.0.1:2379", "http://10.0.0.2:2379"]
        );
    }

    #[test]
    fn test_blank_endpoints_mean_no_remote_store() {
        let config = StoreConfig::from_lookup(lookup_from(&[("ETCD_ENDPOINTS", " , ")])).unwrap();

        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_empty_prefix_falls_back_to_default() {
        let config = StoreConfig::from_lookup(lookup_from(&[("ETCD_PREFIX", "")])).unwrap();

        assert_eq!(config.prefix, DEFAULT_PREFIX);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SHUTDOWN_TIMEOUT_SECS", "3"),
            ("REQUEST_TIMEOUT_SECS", "2"),
            ("ETCD_ENDPOINTS", "127.0.0.1:2379"),
            ("ETCD_PREFIX", "/ns"),
            ("ETCD_DIAL_TIMEOUT_MS", "250"),
            ("ETCD_OP_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.store.endpoints, vec!["127.0.0.1:2379"]);
        assert_eq!(config.store.prefix, "/ns");
        assert_eq!(config.store.dial_timeout, Duration::from_millis(250));
        assert_eq!(config.store.op_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let result = StoreConfig::from_lookup(lookup_from(&[("ETCD_OP_TIMEOUT_MS", "soon")]));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("ETCD_OP_TIMEOUT_MS"));
    }

    #[test]
    fn test_invalid_request_timeout_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "-1")]));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_bind_addr_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("BIND_ADDR", "not-an-addr")]));

        assert!(result.is_err());
    }
}
