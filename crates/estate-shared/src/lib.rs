//! # Estate Shared
//!
//! Shared configuration, telemetry, and primitive types for the marketplace
//! backend.

pub mod constants;
pub mod types;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use types::*;
pub use error::AppError;
