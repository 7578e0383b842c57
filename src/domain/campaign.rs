//! Outbound calling campaigns
//!
//! A campaign is a bulk outbound-calling job bound to one agent, a dial
//! window and a retry/cooldown policy. The state machine below guards
//! every transition before anything is persisted. The dial loop itself is
//! driven externally: each completed attempt reports its outcome through
//! the service layer, and schedule decisions use the pure helpers on
//! [`CallConfig`] together with an injected [`Clock`].

use crate::domain::agent::AgentStatus;
use crate::domain::shared::{DomainError, Result};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Running => "running",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    /// The legal transition table. Terminal states allow nothing.
    pub fn can_transition_to(&self, to: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, to),
            (Draft, Scheduled)
                | (Draft, Cancelled)
                | (Scheduled, Running)
                | (Scheduled, Paused)
                | (Scheduled, Cancelled)
                | (Running, Paused)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Paused, Running)
                | (Paused, Completed)
                | (Paused, Cancelled)
        )
    }
}

/// Absolute window during which the campaign may run at all
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Daily recurring slot, minutes from local midnight.
/// A slot with `start_minute > end_minute` wraps over midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_minute: u16,
    pub end_minute: u16,
}

impl TimeSlot {
    pub fn contains(&self, minute_of_day: u16) -> bool {
        if self.start_minute <= self.end_minute {
            minute_of_day >= self.start_minute && minute_of_day < self.end_minute
        } else {
            minute_of_day >= self.start_minute || minute_of_day < self.end_minute
        }
    }
}

/// Retry policy for unanswered or failed dial attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cool_down_secs: u64,
}

/// Dial configuration; must be set at least once before `start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
    pub dial_window: DialWindow,
    /// Empty means any time of day inside the dial window
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    /// Fixed UTC offset of the campaign's local time, in minutes
    #[serde(default)]
    pub utc_offset_mins: i32,
    pub retry_policy: RetryPolicy,
    pub max_call_duration_secs: u64,
    pub inactive_timeout_secs: u64,
}

impl CallConfig {
    /// Whether a dial attempt may be placed at `now`
    pub fn window_open_at(&self, now: DateTime<Utc>) -> bool {
        if now < self.dial_window.starts_at || now >= self.dial_window.ends_at {
            return false;
        }
        if self.time_slots.is_empty() {
            return true;
        }
        let local = now + Duration::minutes(self.utc_offset_mins as i64);
        let minute = (local.time().hour() * 60 + local.time().minute()) as u16;
        self.time_slots.iter().any(|slot| slot.contains(minute))
    }

    /// Earliest time for the next retry after a failed attempt, or `None`
    /// when the attempt budget is exhausted.
    pub fn next_attempt_after(
        &self,
        last_attempt: DateTime<Utc>,
        attempts_made: u32,
    ) -> Option<DateTime<Utc>> {
        if attempts_made >= self.retry_policy.max_attempts {
            return None;
        }
        Some(last_attempt + Duration::seconds(self.retry_policy.cool_down_secs as i64))
    }
}

/// Outcome of one completed dial attempt
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DialOutcome {
    pub successful: bool,
    /// Talk time of the attempt in seconds; 0 for unanswered calls
    #[serde(default)]
    pub duration_secs: f64,
}

/// Aggregate campaign statistics.
///
/// Invariants: `total_calls == successful_calls + failed_calls` and
/// `conversion_rate` stays within `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub average_call_duration: f64,
    pub conversion_rate: f64,
}

impl CampaignStats {
    /// Fold one dial outcome into the aggregate. Callers must hold the
    /// single writer lock for the campaign; a plain read-then-write of the
    /// running mean is not safe under concurrent outcomes.
    pub fn record(&mut self, outcome: &DialOutcome) {
        self.total_calls += 1;
        if outcome.successful {
            self.successful_calls += 1;
        } else {
            self.failed_calls += 1;
        }

        let n = self.total_calls as f64;
        self.average_call_duration =
            (self.average_call_duration * (n - 1.0) + outcome.duration_secs) / n;
        self.conversion_rate = self.successful_calls as f64 / n * 100.0;
    }
}

/// An outbound calling campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub agent_id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub call_config: Option<CallConfig>,
    pub stats: CampaignStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Create a new campaign in `draft`
    pub fn new(organization_id: Uuid, created_by: Uuid, agent_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            created_by,
            agent_id,
            name,
            status: CampaignStatus::Draft,
            call_config: None,
            stats: CampaignStats::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn transition_to(&mut self, to: CampaignStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition(format!(
                "campaign cannot go from {} to {}",
                self.status.as_str(),
                to.as_str()
            )));
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Start dialing. Requires call configuration, a published agent, and
    /// a startable status.
    pub fn start(&mut self, agent_status: AgentStatus) -> Result<()> {
        match self.status {
            CampaignStatus::Draft | CampaignStatus::Scheduled | CampaignStatus::Paused => {}
            other => {
                return Err(DomainError::ValidationError(format!(
                    "campaign in status {} cannot be started",
                    other.as_str()
                )));
            }
        }
        if self.call_config.is_none() {
            return Err(DomainError::ValidationError(
                "call configuration required before start".to_string(),
            ));
        }
        if agent_status != AgentStatus::Published {
            return Err(DomainError::Conflict(format!(
                "agent is {}, must be published to start a campaign",
                agent_status.as_str()
            )));
        }
        self.status = CampaignStatus::Running;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Pause dialing. In-flight call sessions are not terminated here;
    /// ending them is the caller's responsibility.
    pub fn pause(&mut self) -> Result<()> {
        self.transition_to(CampaignStatus::Paused)
    }

    /// Resume a paused campaign through the `start` guards
    pub fn resume(&mut self, agent_status: AgentStatus) -> Result<()> {
        if self.status != CampaignStatus::Paused {
            return Err(DomainError::ValidationError(format!(
                "campaign in status {} cannot be resumed",
                self.status.as_str()
            )));
        }
        self.start(agent_status)
    }

    pub fn complete(&mut self) -> Result<()> {
        match self.status {
            CampaignStatus::Running | CampaignStatus::Paused => {
                self.transition_to(CampaignStatus::Completed)
            }
            other => Err(DomainError::ValidationError(format!(
                "campaign in status {} cannot be completed",
                other.as_str()
            ))),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition_to(CampaignStatus::Cancelled)
    }

    /// Explicit status update path (draft -> scheduled, cancellations,
    /// scheduled -> paused). Running and completed are reserved for their
    /// dedicated operations so the guards cannot be bypassed.
    pub fn update_status(&mut self, to: CampaignStatus) -> Result<()> {
        match to {
            CampaignStatus::Running => Err(DomainError::ValidationError(
                "use start to run a campaign".to_string(),
            )),
            CampaignStatus::Completed => Err(DomainError::ValidationError(
                "use complete to finish a campaign".to_string(),
            )),
            _ => self.transition_to(to),
        }
    }

    /// Replace the dial configuration. Idempotent; allowed in any
    /// non-terminal state.
    pub fn set_call_config(&mut self, config: CallConfig) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::ValidationError(format!(
                "campaign in status {} can no longer be configured",
                self.status.as_str()
            )));
        }
        if config.dial_window.ends_at <= config.dial_window.starts_at {
            return Err(DomainError::ValidationError(
                "dial window must end after it starts".to_string(),
            ));
        }
        for slot in &config.time_slots {
            // start is a minute of day; end is an exclusive bound, so
            // 1440 means midnight
            if slot.start_minute >= MINUTES_PER_DAY || slot.end_minute > MINUTES_PER_DAY {
                return Err(DomainError::ValidationError(format!(
                    "time slot {}..{} is out of the minute-of-day range",
                    slot.start_minute, slot.end_minute
                )));
            }
        }
        self.call_config = Some(config);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Soft delete. Refused while the campaign is running.
    pub fn soft_delete(&mut self) -> Result<()> {
        if self.status == CampaignStatus::Running {
            return Err(DomainError::Conflict(
                "cannot delete a running campaign".to_string(),
            ));
        }
        self.deleted_at = Some(Utc::now());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Injected time source so schedule decisions stay testable and the
/// campaign layer never grows its own timer loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Repository trait for campaign persistence.
///
/// `update` applies the mutation inside the store's write lock, giving
/// every guarded transition and stats fold single-writer semantics.
#[async_trait::async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Insert a new campaign
    async fn insert(&self, campaign: Campaign) -> Result<Campaign>;

    /// Get a live (not soft-deleted) campaign scoped to an organization
    async fn get(&self, organization_id: Uuid, campaign_id: Uuid) -> Result<Option<Campaign>>;

    /// List live campaigns for an organization
    async fn list(&self, organization_id: Uuid) -> Result<Vec<Campaign>>;

    /// Atomically mutate a campaign under the store lock. Returns the
    /// updated campaign, or `NotFound` when it is absent, soft-deleted or
    /// owned by another organization.
    async fn update(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        mutate: &(dyn for<'a> Fn(&'a mut Campaign) -> Result<()> + Send + Sync),
    ) -> Result<Campaign>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_campaign() -> Campaign {
        Campaign::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Q3 renewals".to_string(),
        )
    }

    fn test_config() -> CallConfig {
        CallConfig {
            dial_window: DialWindow {
                starts_at: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2026, 9, 30, 0, 0, 0).unwrap(),
            },
            time_slots: vec![TimeSlot {
                start_minute: 9 * 60,
                end_minute: 17 * 60,
            }],
            utc_offset_mins: 0,
            retry_policy: RetryPolicy {
                max_attempts: 3,
                cool_down_secs: 600,
            },
            max_call_duration_secs: 600,
            inactive_timeout_secs: 30,
        }
    }

    #[test]
    fn test_new_campaign_is_draft() {
        let campaign = test_campaign();
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert!(campaign.call_config.is_none());
        assert_eq!(campaign.stats.total_calls, 0);
    }

    #[test]
    fn test_start_requires_call_config() {
        let mut campaign = test_campaign();
        let err = campaign.start(AgentStatus::Published).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
        assert_eq!(campaign.status, CampaignStatus::Draft);
    }

    #[test]
    fn test_start_requires_published_agent() {
        let mut campaign = test_campaign();
        campaign.set_call_config(test_config()).unwrap();

        let err = campaign.start(AgentStatus::Draft).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(campaign.status, CampaignStatus::Draft);

        campaign.start(AgentStatus::Published).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Running);
    }

    #[test]
    fn test_start_rejected_from_running() {
        let mut campaign = test_campaign();
        campaign.set_call_config(test_config()).unwrap();
        campaign.start(AgentStatus::Published).unwrap();

        let err = campaign.start(AgentStatus::Published).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut campaign = test_campaign();
        campaign.set_call_config(test_config()).unwrap();
        campaign.start(AgentStatus::Published).unwrap();

        campaign.pause().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Paused);

        // Agent was unpublished while paused: resume must refuse
        let err = campaign.resume(AgentStatus::Draft).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        campaign.resume(AgentStatus::Published).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Running);
    }

    #[test]
    fn test_complete_only_from_running_or_paused() {
        let mut campaign = test_campaign();
        assert!(campaign.complete().is_err());

        campaign.set_call_config(test_config()).unwrap();
        campaign.start(AgentStatus::Published).unwrap();
        campaign.complete().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);

        // Terminal: nothing moves any more
        assert!(campaign.cancel().is_err());
        assert!(campaign.pause().is_err());
    }

    #[test]
    fn test_update_status_reserved_targets() {
        let mut campaign = test_campaign();
        assert!(campaign.update_status(CampaignStatus::Running).is_err());
        assert!(campaign.update_status(CampaignStatus::Completed).is_err());

        campaign.update_status(CampaignStatus::Scheduled).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Scheduled);
        campaign.update_status(CampaignStatus::Cancelled).unwrap();
        assert!(campaign.status.is_terminal());
    }

    #[test]
    fn test_delete_refused_while_running() {
        let mut campaign = test_campaign();
        campaign.set_call_config(test_config()).unwrap();
        campaign.start(AgentStatus::Published).unwrap();

        let err = campaign.soft_delete().unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        campaign.pause().unwrap();
        campaign.soft_delete().unwrap();
        assert!(campaign.is_deleted());
    }

    #[test]
    fn test_call_config_rejected_when_terminal() {
        let mut campaign = test_campaign();
        campaign.cancel().unwrap();
        assert!(campaign.set_call_config(test_config()).is_err());
    }

    #[test]
    fn test_call_config_rejects_out_of_range_slots() {
        let mut campaign = test_campaign();

        let mut config = test_config();
        config.time_slots = vec![TimeSlot {
            start_minute: 2000,
            end_minute: 2100,
        }];
        let err = campaign.set_call_config(config).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));

        // 1440 is a valid exclusive end: the slot runs to midnight
        let mut config = test_config();
        config.time_slots = vec![TimeSlot {
            start_minute: 0,
            end_minute: 24 * 60,
        }];
        campaign.set_call_config(config).unwrap();
    }

    #[test]
    fn test_stats_record_keeps_invariants() {
        let mut stats = CampaignStats::default();
        stats.record(&DialOutcome {
            successful: true,
            duration_secs: 120.0,
        });
        stats.record(&DialOutcome {
            successful: false,
            duration_secs: 0.0,
        });
        stats.record(&DialOutcome {
            successful: true,
            duration_secs: 60.0,
        });

        assert_eq!(stats.total_calls, 3);
        assert_eq!(
            stats.total_calls,
            stats.successful_calls + stats.failed_calls
        );
        assert!((stats.average_call_duration - 60.0).abs() < 1e-9);
        assert!((stats.conversion_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!(stats.conversion_rate >= 0.0 && stats.conversion_rate <= 100.0);
    }

    #[test]
    fn test_stats_running_mean_matches_batch_mean() {
        let mut stats = CampaignStats::default();
        let durations = [12.0, 300.0, 45.5, 0.0, 88.25];
        for d in durations {
            stats.record(&DialOutcome {
                successful: d > 0.0,
                duration_secs: d,
            });
        }
        let expected = durations.iter().sum::<f64>() / durations.len() as f64;
        assert!((stats.average_call_duration - expected).abs() < 1e-9);
    }

    #[test]
    fn test_window_open_inside_slot() {
        let config = test_config();
        let inside = Utc.with_ymd_and_hms(2026, 9, 10, 10, 30, 0).unwrap();
        let before_slot = Utc.with_ymd_and_hms(2026, 9, 10, 7, 0, 0).unwrap();
        let outside_window = Utc.with_ymd_and_hms(2026, 10, 2, 10, 30, 0).unwrap();

        assert!(config.window_open_at(inside));
        assert!(!config.window_open_at(before_slot));
        assert!(!config.window_open_at(outside_window));
    }

    #[test]
    fn test_window_respects_utc_offset() {
        let mut config = test_config();
        // Local time is UTC-5: 13:00 UTC is 08:00 local, before the slot
        config.utc_offset_mins = -300;
        let now = Utc.with_ymd_and_hms(2026, 9, 10, 13, 0, 0).unwrap();
        assert!(!config.window_open_at(now));
        // 15:00 UTC is 10:00 local, inside
        let later = Utc.with_ymd_and_hms(2026, 9, 10, 15, 0, 0).unwrap();
        assert!(config.window_open_at(later));
    }

    #[test]
    fn test_overnight_slot_wraps_midnight() {
        let slot = TimeSlot {
            start_minute: 22 * 60,
            end_minute: 2 * 60,
        };
        assert!(slot.contains(23 * 60));
        assert!(slot.contains(60));
        assert!(!slot.contains(12 * 60));
    }

    #[test]
    fn test_retry_budget() {
        let config = test_config();
        let last = Utc.with_ymd_and_hms(2026, 9, 10, 10, 0, 0).unwrap();

        let next = config.next_attempt_after(last, 1).unwrap();
        assert_eq!(next, last + Duration::seconds(600));
        assert!(config.next_attempt_after(last, 3).is_none());
    }
}
