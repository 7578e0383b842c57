//! Call session entities
//!
//! A call session is an ephemeral real-time room joined by one human
//! participant and one or more dispatched AI-agent workers. Sessions are
//! owned by the media control plane; this module models what the backend
//! tracks about them.

use crate::domain::trunk::SipTrunkConfig;
use crate::domain::shared::{DomainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Call type determines session namespace, idle timeout and credential bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Web,
    Sip,
}

impl CallType {
    pub fn as_str(&self) -> &str {
        match self {
            CallType::Web => "web",
            CallType::Sip => "sip",
        }
    }

    /// Session-name namespace prefix
    pub fn name_prefix(&self) -> &str {
        match self {
            CallType::Web => "call",
            CallType::Sip => "sip",
        }
    }

    /// Default credential lifetime in seconds
    pub fn default_ttl_secs(&self) -> i64 {
        match self {
            CallType::Web => 3600,
            CallType::Sip => 1800,
        }
    }

    /// Hard upper bound on credential lifetime in seconds
    pub fn max_ttl_secs(&self) -> i64 {
        match self {
            CallType::Web => 7200,
            CallType::Sip => 3600,
        }
    }

    /// Idle timeout before the control plane reclaims an empty session.
    /// SIP legs must connect fast, so their window is tight.
    pub fn empty_timeout_secs(&self) -> u32 {
        match self {
            CallType::Web => 300,
            CallType::Sip => 60,
        }
    }
}

/// Connection state of a session participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// A participant inside a session (human caller or agent worker)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub identity: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub connection_state: ConnectionState,
}

impl Participant {
    pub fn new(identity: String, display_name: String) -> Self {
        Self {
            identity,
            display_name,
            joined_at: Utc::now(),
            connection_state: ConnectionState::Connecting,
        }
    }
}

/// Options for session creation on the control plane
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub call_type: CallType,
    pub empty_timeout_secs: u32,
    pub max_participants: u32,
    pub metadata: String,
}

/// A live call session as reported by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub name: String,
    pub call_type: CallType,
    pub participants: Vec<Participant>,
    /// Opaque metadata bag, JSON-encoded (see [`CallMetadata`])
    pub metadata: String,
    pub max_participants: u32,
    pub empty_timeout_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl CallSession {
    pub fn from_options(name: &str, options: &SessionOptions) -> Self {
        Self {
            name: name.to_string(),
            call_type: options.call_type,
            participants: Vec::new(),
            metadata: options.metadata.clone(),
            max_participants: options.max_participants,
            empty_timeout_secs: options.empty_timeout_secs,
            created_at: Utc::now(),
        }
    }
}

/// Typed metadata attached to a session and its dispatches.
///
/// Known fields are first-class; anything else rides in the flattened
/// extension map so callers can tag sessions without schema changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMetadata {
    pub organization_id: Uuid,
    pub requester_id: Uuid,
    pub agent_id: Uuid,
    pub call_type: CallType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunk: Option<SipTrunkConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CallMetadata {
    pub fn new(
        organization_id: Uuid,
        requester_id: Uuid,
        agent_id: Uuid,
        call_type: CallType,
    ) -> Self {
        Self {
            organization_id,
            requester_id,
            agent_id,
            call_type,
            phone_number: None,
            trunk: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::ValidationError(format!("Invalid call metadata: {}", e)))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::ValidationError(format!("Invalid call metadata: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_type_bounds() {
        assert_eq!(CallType::Web.default_ttl_secs(), 3600);
        assert_eq!(CallType::Web.max_ttl_secs(), 7200);
        assert_eq!(CallType::Sip.default_ttl_secs(), 1800);
        assert_eq!(CallType::Sip.max_ttl_secs(), 3600);
        assert_eq!(CallType::Sip.empty_timeout_secs(), 60);
    }

    #[test]
    fn test_metadata_roundtrip_with_extensions() {
        let mut meta = CallMetadata::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            CallType::Web,
        );
        meta.extra
            .insert("crm_ticket".to_string(), serde_json::json!("T-1042"));

        let raw = meta.to_json().unwrap();
        let parsed = CallMetadata::parse(&raw).unwrap();

        assert_eq!(parsed.organization_id, meta.organization_id);
        assert_eq!(parsed.call_type, CallType::Web);
        assert_eq!(parsed.extra["crm_ticket"], serde_json::json!("T-1042"));
    }

    #[test]
    fn test_metadata_parse_rejects_garbage() {
        assert!(CallMetadata::parse("not json").is_err());
    }
}
