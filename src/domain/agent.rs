//! Agent references
//!
//! Full agent management (prompts, voices, knowledge bases) lives in an
//! external service. The orchestration core only needs a reference with
//! ownership and publication status: calls can only be placed against
//! agents the caller's organization owns, and campaigns can only start
//! against a published agent.

use crate::domain::shared::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Still being edited, not dispatchable for campaigns
    Draft,
    /// Live and available to campaigns
    Published,
    /// Retired, kept for history
    Archived,
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Draft => "draft",
            AgentStatus::Published => "published",
            AgentStatus::Archived => "archived",
        }
    }
}

/// Reference to an AI agent worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRef {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Worker queue name used for dispatch
    pub name: String,
    /// Human-facing name shown to call participants
    pub display_name: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

impl AgentRef {
    pub fn new(organization_id: Uuid, name: String, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            display_name,
            status: AgentStatus::Draft,
            created_at: Utc::now(),
        }
    }

    pub fn publish(&mut self) {
        self.status = AgentStatus::Published;
    }

    pub fn is_published(&self) -> bool {
        self.status == AgentStatus::Published
    }
}

/// Repository trait for agent references
#[async_trait::async_trait]
pub trait AgentRepository: Send + Sync {
    /// Get an agent by ID
    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentRef>>;

    /// Insert or replace an agent reference
    async fn put(&self, agent: AgentRef) -> Result<()>;
}
