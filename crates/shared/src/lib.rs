//! Shared configuration and error types for Karma.
//!
//! This crate provides the pieces every other crate needs:
//! - Layered application configuration
//! - Application-wide error taxonomy

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::AppError;
