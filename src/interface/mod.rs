//! Interface layer - External interfaces (REST API)
//!
//! This layer handles:
//! - REST API endpoints
//! - Bearer authentication against the identity provider boundary
//! - Request/response formatting

pub mod api;
