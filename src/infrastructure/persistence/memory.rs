//! In-memory repositories
//!
//! Campaign mutations run inside the store's write lock, which is what
//! makes guarded transitions and concurrent stats folds safe: there is a
//! single writer per store, never a read-then-write across lock releases.

use crate::domain::agent::{AgentRef, AgentRepository};
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::shared::{DomainError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory campaign store
#[derive(Default)]
pub struct InMemoryCampaignStore {
    campaigns: RwLock<HashMap<Uuid, Campaign>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible(campaign: &Campaign, organization_id: Uuid) -> bool {
    campaign.organization_id == organization_id && !campaign.is_deleted()
}

#[async_trait::async_trait]
impl CampaignRepository for InMemoryCampaignStore {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Option<Campaign>> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns
            .get(&campaign_id)
            .filter(|c| visible(c, organization_id))
            .cloned())
    }

    async fn list(&self, organization_id: Uuid) -> Result<Vec<Campaign>> {
        let campaigns = self.campaigns.read().await;
        let mut result: Vec<Campaign> = campaigns
            .values()
            .filter(|c| visible(c, organization_id))
            .cloned()
            .collect();
        result.sort_by_key(|c| c.created_at);
        Ok(result)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        mutate: &(dyn for<'a> Fn(&'a mut Campaign) -> Result<()> + Send + Sync),
    ) -> Result<Campaign> {
        let mut campaigns = self.campaigns.write().await;
        let slot = campaigns
            .get_mut(&campaign_id)
            .filter(|c| visible(c, organization_id))
            .ok_or_else(|| DomainError::NotFound(format!("campaign {}", campaign_id)))?;

        // Stage the mutation on a copy; a failed guard writes nothing back
        let mut staged = slot.clone();
        mutate(&mut staged)?;
        *slot = staged.clone();
        Ok(staged)
    }
}

/// In-memory agent reference store
#[derive(Default)]
pub struct InMemoryAgentStore {
    agents: RwLock<HashMap<Uuid, AgentRef>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AgentRepository for InMemoryAgentStore {
    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentRef>> {
        let agents = self.agents.read().await;
        Ok(agents.get(&agent_id).cloned())
    }

    async fn put(&self, agent: AgentRef) -> Result<()> {
        let mut agents = self.agents.write().await;
        agents.insert(agent.id, agent);
        Ok(())
    }
}
