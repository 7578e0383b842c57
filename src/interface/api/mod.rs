//! API interface implementations

pub mod auth;
pub mod calls_handler;
pub mod campaign_handler;
pub mod dto;
pub mod metrics_handler;
pub mod router;

use crate::application::{CallOrchestrator, CampaignService};
use std::sync::Arc;

pub use auth::{IdentityVerifier, OrgContext, StaticTokenVerifier};
pub use dto::{ApiError, ApiResponse};
pub use metrics_handler::init_metrics;
pub use router::build_router;

/// Shared state behind every API handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<CallOrchestrator>,
    pub campaigns: Arc<CampaignService>,
    pub identity: Arc<dyn IdentityVerifier>,
}
