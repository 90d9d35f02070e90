//! Name-Record Management Service Library
//!
//! This library crate defines the modules behind the `record-service` binary (`main.rs`).
//! Clients create, read, update, delete and list DNS-like records over HTTP; the records
//! themselves live in a swappable persistence backend chosen once at startup.
//!
//! ## Architecture Modules
//! - **`config`**: Environment-driven process configuration (bind address, etcd endpoints,
//!   key prefix, timeouts).
//! - **`records`**: The `Record` type and its wire form, the validation/defaulting layer that
//!   runs before anything is stored, and the Axum handlers for the CRUD surface.
//! - **`storage`**: The `RecordStore` capability and its two backends: a volatile in-process
//!   map (`MemoryStore`) and an etcd-backed adapter (`EtcdStore`), plus the selector that
//!   decides between them.
//! - **`server`**: The per-request deadline around the router and the serve loop with its
//!   bounded graceful shutdown.

pub mod config;
pub mod records;
pub mod server;
pub mod storage;
