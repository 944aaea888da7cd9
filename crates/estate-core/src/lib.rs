//! # Estate Core
//!
//! Domain entities, the verification workflow, repository ports, and the
//! services that drive the marketplace.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
