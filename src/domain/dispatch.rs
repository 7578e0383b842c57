//! Agent dispatch records
//!
//! A dispatch attaches an AI-agent worker to a session. The record models
//! intent: creation does not guarantee the worker joined. Confirmation
//! arrives later, correlated to the dispatch id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dispatch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// Request sent to the worker pool, join not yet confirmed
    Dispatched,
    /// Worker confirmed joined into the session
    Active,
    /// Cancelled; terminal, advisory only
    Cancelled,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DispatchStatus::Dispatched => "dispatched",
            DispatchStatus::Active => "active",
            DispatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchStatus::Cancelled)
    }
}

/// A single agent-to-session dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub id: Uuid,
    pub agent_name: String,
    pub session_name: String,
    pub status: DispatchStatus,
    pub created_at: DateTime<Utc>,
    /// Opaque metadata bag, JSON-encoded
    pub metadata: String,
}

impl DispatchRecord {
    pub fn new(session_name: String, agent_name: String, metadata: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_name,
            session_name,
            status: DispatchStatus::Dispatched,
            created_at: Utc::now(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dispatch_is_pending() {
        let record = DispatchRecord::new(
            "call_abc".to_string(),
            "support-agent".to_string(),
            "{}".to_string(),
        );
        assert_eq!(record.status, DispatchStatus::Dispatched);
        assert!(!record.status.is_terminal());
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(DispatchStatus::Cancelled.is_terminal());
        assert_eq!(DispatchStatus::Cancelled.as_str(), "cancelled");
    }
}
