//! Core logic for Karma.
//!
//! This crate contains the domain model and the service gateways, with no
//! web-framework or database dependencies. The database layer implements
//! the repository traits defined here.
//!
//! # Modules
//!
//! - `model` - Ledgers, categories, transactions, embedded attachments
//! - `storage` - Object storage gateway (S3-compatible / local filesystem)
//! - `identity` - Bearer-token verification and auth-service admin client
//! - `attachment` - Attachment lifecycle coordination (best-effort cleanup)
//! - `store` - In-memory client data store mirroring the record store

pub mod attachment;
pub mod identity;
pub mod model;
pub mod storage;
pub mod store;
