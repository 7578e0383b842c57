//! Vocalis - call orchestration backend for AI voice agents
//!
//! This is a Domain-Driven Design (DDD) implementation of the call-session
//! orchestration and campaign-dispatch subsystem behind a multi-tenant
//! voice-agent platform: real-time session lifecycle, scoped access
//! credentials, agent dispatch, and the outbound campaign state machine.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
