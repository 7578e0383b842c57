//! Campaign use cases
//!
//! Organization-scoped access to campaigns with guarded lifecycle
//! transitions. No scheduler runs here: outcome recording and schedule
//! queries are driven by the external dial loop through these entry
//! points, with time supplied by the injected [`Clock`].

use crate::domain::agent::{AgentRepository, AgentStatus};
use crate::domain::campaign::{
    CallConfig, Campaign, CampaignRepository, CampaignStats, CampaignStatus, Clock, DialOutcome,
};
use crate::domain::shared::{DomainError, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub agent_id: Uuid,
    #[serde(default)]
    pub call_config: Option<CallConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
}

/// Analytics snapshot returned to dashboards and the dial loop
#[derive(Debug, Clone, Serialize)]
pub struct CampaignAnalytics {
    pub campaign_id: Uuid,
    pub status: CampaignStatus,
    pub stats: CampaignStats,
    /// Whether the dial window is open right now
    pub window_open: bool,
}

pub struct CampaignService {
    campaigns: Arc<dyn CampaignRepository>,
    agents: Arc<dyn AgentRepository>,
    clock: Arc<dyn Clock>,
}

impl CampaignService {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        agents: Arc<dyn AgentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            campaigns,
            agents,
            clock,
        }
    }

    /// Create a campaign in draft, bound to one owned agent
    pub async fn create(
        &self,
        organization_id: Uuid,
        created_by: Uuid,
        new_campaign: NewCampaign,
    ) -> Result<Campaign> {
        if new_campaign.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "campaign name must not be empty".to_string(),
            ));
        }
        match self.agents.get(new_campaign.agent_id).await? {
            Some(agent) if agent.organization_id == organization_id => {}
            _ => {
                return Err(DomainError::NotFound(format!(
                    "agent {}",
                    new_campaign.agent_id
                )));
            }
        }

        let mut campaign = Campaign::new(
            organization_id,
            created_by,
            new_campaign.agent_id,
            new_campaign.name,
        );
        if let Some(config) = new_campaign.call_config {
            campaign.set_call_config(config)?;
        }

        let campaign = self.campaigns.insert(campaign).await?;
        info!(campaign = %campaign.id, organization = %organization_id, "campaign created");
        Ok(campaign)
    }

    pub async fn get(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        self.campaigns
            .get(organization_id, campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("campaign {}", campaign_id)))
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Campaign>> {
        self.campaigns.list(organization_id).await
    }

    /// Rename and/or explicit status update (draft -> scheduled, pauses,
    /// cancellations). Running/completed stay behind start/complete.
    pub async fn update(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        update: CampaignUpdate,
    ) -> Result<Campaign> {
        self.campaigns
            .update(organization_id, campaign_id, &move |campaign| {
                if let Some(name) = &update.name {
                    if name.trim().is_empty() {
                        return Err(DomainError::ValidationError(
                            "campaign name must not be empty".to_string(),
                        ));
                    }
                    campaign.name = name.clone();
                }
                if let Some(status) = update.status {
                    campaign.update_status(status)?;
                }
                Ok(())
            })
            .await
    }

    /// Replace the dial configuration; idempotent, non-terminal states only
    pub async fn update_call_config(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        config: CallConfig,
    ) -> Result<Campaign> {
        self.campaigns
            .update(organization_id, campaign_id, &move |campaign| {
                campaign.set_call_config(config.clone())
            })
            .await
    }

    pub async fn start(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        let agent_status = self.agent_status(organization_id, campaign_id).await?;
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &move |campaign| {
                campaign.start(agent_status)
            })
            .await?;
        info!(campaign = %campaign_id, "campaign started");
        Ok(campaign)
    }

    pub async fn pause(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &|campaign| campaign.pause())
            .await?;
        info!(campaign = %campaign_id, "campaign paused");
        Ok(campaign)
    }

    pub async fn resume(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        let agent_status = self.agent_status(organization_id, campaign_id).await?;
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &move |campaign| {
                campaign.resume(agent_status)
            })
            .await?;
        info!(campaign = %campaign_id, "campaign resumed");
        Ok(campaign)
    }

    pub async fn complete(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &|campaign| {
                campaign.complete()
            })
            .await?;
        info!(campaign = %campaign_id, "campaign completed");
        Ok(campaign)
    }

    pub async fn cancel(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Campaign> {
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &|campaign| campaign.cancel())
            .await?;
        info!(campaign = %campaign_id, "campaign cancelled");
        Ok(campaign)
    }

    /// Fold one completed dial attempt into the campaign statistics.
    /// The repository applies this under its write lock, so concurrent
    /// outcomes from parallel dial attempts never lose updates.
    pub async fn record_outcome(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        outcome: DialOutcome,
    ) -> Result<CampaignStats> {
        let campaign = self
            .campaigns
            .update(organization_id, campaign_id, &move |campaign| {
                campaign.stats.record(&outcome);
                Ok(())
            })
            .await?;

        let result = if outcome.successful { "success" } else { "failure" };
        counter!("campaign_dial_outcomes_total", "result" => result).increment(1);
        Ok(campaign.stats)
    }

    pub async fn analytics(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<CampaignAnalytics> {
        let campaign = self.get(organization_id, campaign_id).await?;
        let window_open = campaign
            .call_config
            .as_ref()
            .map(|config| config.window_open_at(self.clock.now()))
            .unwrap_or(false);
        Ok(CampaignAnalytics {
            campaign_id: campaign.id,
            status: campaign.status,
            stats: campaign.stats,
            window_open,
        })
    }

    /// Soft delete; refused while the campaign is running
    pub async fn delete(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<()> {
        self.campaigns
            .update(organization_id, campaign_id, &|campaign| {
                campaign.soft_delete()
            })
            .await?;
        info!(campaign = %campaign_id, "campaign soft-deleted");
        Ok(())
    }

    async fn agent_status(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<AgentStatus> {
        let campaign = self.get(organization_id, campaign_id).await?;
        match self.agents.get(campaign.agent_id).await? {
            Some(agent) if agent.organization_id == organization_id => Ok(agent.status),
            // Bound agent vanished: the campaign cannot run
            _ => Err(DomainError::Conflict(format!(
                "agent {} is no longer available",
                campaign.agent_id
            ))),
        }
    }
}
