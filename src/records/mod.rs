//! Records Module
//!
//! The unit of storage and the HTTP surface around it.
//!
//! ## Layers
//! - **`types`**: `Record` (the one wire encoding shared by clients and the etcd backend) and the
//!   request/response DTOs.
//! - **`error`**: `ValidationError` and `ApiError`, the latter mapping failures onto HTTP statuses.
//! - **`handlers`**: Axum handlers for `/healthz` and `/records`. Validation and defaulting
//!   (`type` → `"A"`, `ttl` → 60) happen here, before a record ever reaches the store.

pub mod error;
pub mod handlers;
pub mod types;
