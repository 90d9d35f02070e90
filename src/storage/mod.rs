//! Record Storage Module
//!
//! Implements the persistence layer behind the CRUD surface.
//!
//! ## Core Concepts
//! - **Capability**: `RecordStore` is the single contract (`list`, `get`, `put`, `delete`) that
//!   every caller holds, as `Arc<dyn RecordStore>`. Nothing above this module knows which
//!   backend is active.
//! - **Volatile backend**: `MemoryStore` keeps records in a process-local map behind one
//!   reader/writer lock. Its contents die with the process.
//! - **Distributed backend**: `EtcdStore` maps every record to `<prefix>/<name>` in etcd, with a
//!   per-call timeout and no local state.
//! - **Selection**: `select_store` picks the backend once at startup and falls back to memory
//!   (loudly) when etcd cannot be reached.
//!
//! Not-found is never an error: `get` returns `Ok(None)` and `delete` of an absent name succeeds.

pub mod error;
pub mod etcd;
pub mod memory;
pub mod selector;
pub mod store;
