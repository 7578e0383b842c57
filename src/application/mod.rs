//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects and infrastructure ports to
//! fulfill use cases. It's responsible for:
//! - Composing the media control-plane leaves into call protocols
//! - Organization-scope enforcement at the orchestration boundary
//! - Campaign lifecycle operations and outcome recording

pub mod campaign_service;
pub mod orchestrator;

pub use campaign_service::CampaignService;
pub use orchestrator::CallOrchestrator;
