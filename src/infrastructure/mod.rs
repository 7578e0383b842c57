//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Media control-plane clients (sessions, dispatch, access tokens)
//! - Repository implementations
//! - External service integrations

pub mod media;
pub mod persistence;
