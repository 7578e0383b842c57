//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Entities: Objects with identity (sessions, dispatches, campaigns)
//! - Value Objects: Immutable objects without identity
//! - State machines: Guarded lifecycle transitions
//! - Repository Interfaces: Ports for persistence

pub mod agent;
pub mod campaign;
pub mod dispatch;
pub mod session;
pub mod shared;
pub mod trunk;

// Re-export commonly used types
pub use shared::{DomainError, Result};
