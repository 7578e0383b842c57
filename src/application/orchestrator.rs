//! Call session orchestration
//!
//! Composes the media control-plane leaves into the web-call and SIP-call
//! establishment protocols. Steps always run in the same order: ensure
//! the session exists, issue the scoped credential, dispatch the agent.
//!
//! Every read or mutation of an existing session is organization-scoped:
//! a session owned by another tenant is reported exactly like a session
//! that does not exist, so cross-tenant probing learns nothing.

use crate::domain::agent::{AgentRef, AgentRepository};
use crate::domain::dispatch::DispatchRecord;
use crate::domain::session::{CallMetadata, CallSession, CallType, SessionOptions};
use crate::domain::shared::{DomainError, Result};
use crate::domain::trunk::{SipTrunkConfig, TrunkOverrides};
use crate::infrastructure::media::{
    AccessTokenIssuer, AgentDispatchClient, MediaCapabilities, SessionRegistry,
};
use metrics::counter;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything a caller needs to join the session it just created
#[derive(Debug, Clone, Serialize)]
pub struct CallBundle {
    pub session_name: String,
    pub credential: String,
    pub participant_identity: String,
    pub dispatch: DispatchRecord,
    pub metadata: CallMetadata,
}

/// Session status plus its dispatch records
#[derive(Debug, Clone, Serialize)]
pub struct CallStatusView {
    pub session: CallSession,
    pub dispatches: Vec<DispatchRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebCallOptions {
    pub participant_name: Option<String>,
    pub enable_video: bool,
    pub enable_audio: bool,
    pub duration_secs: Option<i64>,
    /// Worker queue name override; defaults to the agent's own
    pub agent_name: Option<String>,
    /// Extra metadata tags carried on session and dispatch
    pub agent_metadata: Map<String, Value>,
}

impl Default for WebCallOptions {
    fn default() -> Self {
        Self {
            participant_name: None,
            enable_video: false,
            enable_audio: true,
            duration_secs: None,
            agent_name: None,
            agent_metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SipCallOptions {
    pub participant_name: Option<String>,
    pub duration_secs: Option<i64>,
    pub sip_options: TrunkOverrides,
    pub agent_name: Option<String>,
    pub agent_metadata: Map<String, Value>,
}

/// Orchestrates session, credential and dispatch into one call setup
pub struct CallOrchestrator {
    registry: Arc<dyn SessionRegistry>,
    dispatcher: Arc<dyn AgentDispatchClient>,
    agents: Arc<dyn AgentRepository>,
    tokens: AccessTokenIssuer,
    default_trunk: SipTrunkConfig,
}

impl CallOrchestrator {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        dispatcher: Arc<dyn AgentDispatchClient>,
        agents: Arc<dyn AgentRepository>,
        tokens: AccessTokenIssuer,
        default_trunk: SipTrunkConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            agents,
            tokens,
            default_trunk,
        }
    }

    /// Establish a web call: browser participant plus dispatched agent
    pub async fn create_web_call(
        &self,
        agent_id: Uuid,
        requester_id: Uuid,
        organization_id: Uuid,
        options: WebCallOptions,
    ) -> Result<CallBundle> {
        let agent = self.resolve_agent(agent_id, organization_id).await?;
        let call_type = CallType::Web;
        let session_name = generate_session_name(call_type);

        let mut metadata = CallMetadata::new(organization_id, requester_id, agent_id, call_type);
        metadata.extra.extend(options.agent_metadata.clone());
        let metadata_json = metadata.to_json()?;

        let session = self
            .registry
            .ensure_exists(
                &session_name,
                SessionOptions {
                    call_type,
                    empty_timeout_secs: call_type.empty_timeout_secs(),
                    max_participants: 10,
                    metadata: metadata_json.clone(),
                },
            )
            .await?;

        let identity = participant_identity();
        let display_name = options
            .participant_name
            .clone()
            .unwrap_or_else(|| "Guest".to_string());
        let ttl = clamp_ttl(call_type, options.duration_secs)?;
        let credential = self.tokens.issue(
            &session.name,
            &identity,
            &display_name,
            ttl,
            MediaCapabilities::web(options.enable_video, options.enable_audio),
        )?;

        let worker = options.agent_name.clone().unwrap_or_else(|| agent.name.clone());
        let dispatch = self
            .dispatcher
            .dispatch(&session.name, &worker, metadata_json)
            .await?;

        counter!("calls_created_total", "call_type" => "web").increment(1);
        info!(
            session = %session.name,
            agent = %agent_id,
            organization = %organization_id,
            "web call established"
        );

        Ok(CallBundle {
            session_name: session.name,
            credential,
            participant_identity: identity,
            dispatch,
            metadata,
        })
    }

    /// Establish a SIP call: phone leg via trunk plus dispatched agent
    pub async fn create_sip_call(
        &self,
        agent_id: Uuid,
        phone_number: &str,
        requester_id: Uuid,
        organization_id: Uuid,
        options: SipCallOptions,
    ) -> Result<CallBundle> {
        validate_phone_number(phone_number)?;
        let agent = self.resolve_agent(agent_id, organization_id).await?;
        let call_type = CallType::Sip;
        let session_name = generate_session_name(call_type);

        let mut metadata = CallMetadata::new(organization_id, requester_id, agent_id, call_type);
        metadata.phone_number = Some(phone_number.to_string());
        metadata.trunk = Some(self.default_trunk.apply(&options.sip_options));
        metadata.extra.extend(options.agent_metadata.clone());
        let metadata_json = metadata.to_json()?;

        let session = self
            .registry
            .ensure_exists(
                &session_name,
                SessionOptions {
                    call_type,
                    empty_timeout_secs: call_type.empty_timeout_secs(),
                    max_participants: 10,
                    metadata: metadata_json.clone(),
                },
            )
            .await?;

        let identity = participant_identity();
        let display_name = options
            .participant_name
            .clone()
            .unwrap_or_else(|| phone_number.to_string());
        let ttl = clamp_ttl(call_type, options.duration_secs)?;
        // SIP legs never carry video, regardless of what was asked upstream
        let credential = self.tokens.issue(
            &session.name,
            &identity,
            &display_name,
            ttl,
            MediaCapabilities::sip_audio_only(),
        )?;

        let worker = options.agent_name.clone().unwrap_or_else(|| agent.name.clone());
        let dispatch = self
            .dispatcher
            .dispatch(&session.name, &worker, metadata_json)
            .await?;

        counter!("calls_created_total", "call_type" => "sip").increment(1);
        info!(
            session = %session.name,
            agent = %agent_id,
            organization = %organization_id,
            "sip call established"
        );

        Ok(CallBundle {
            session_name: session.name,
            credential,
            participant_identity: identity,
            dispatch,
            metadata,
        })
    }

    /// Session status plus dispatch records, organization-scoped
    pub async fn get_status(
        &self,
        organization_id: Uuid,
        session_name: &str,
    ) -> Result<CallStatusView> {
        let (session, _) = self.load_owned(organization_id, session_name).await?;
        let dispatches = self.dispatcher.list(session_name).await?;
        Ok(CallStatusView {
            session,
            dispatches,
        })
    }

    /// End a call. Idempotent: ending an absent or already-ended session
    /// succeeds. Sessions invisible to the caller are treated as absent.
    pub async fn end_call(
        &self,
        organization_id: Uuid,
        session_name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        match self.registry.status(session_name).await? {
            None => {
                debug!(session = session_name, "end call on absent session");
                Ok(())
            }
            Some(session) => match CallMetadata::parse(&session.metadata) {
                Ok(meta) if meta.organization_id == organization_id => {
                    info!(
                        session = session_name,
                        reason = reason.unwrap_or("unspecified"),
                        "ending call"
                    );
                    self.registry.terminate(session_name).await?;
                    counter!("calls_ended_total").increment(1);
                    Ok(())
                }
                _ => {
                    warn!(
                        session = session_name,
                        organization = %organization_id,
                        "end call on session not visible to caller"
                    );
                    Ok(())
                }
            },
        }
    }

    /// All live sessions belonging to the organization. Full registry
    /// scan; fine at moderate concurrent-session counts.
    pub async fn list_active_calls(&self, organization_id: Uuid) -> Result<Vec<CallSession>> {
        let sessions = self.registry.list().await?;
        Ok(sessions
            .into_iter()
            .filter(|s| {
                CallMetadata::parse(&s.metadata)
                    .map(|m| m.organization_id == organization_id)
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Merge `patch` into the session metadata; patch wins on conflict.
    /// Tenancy fields cannot be patched away.
    pub async fn update_call_metadata(
        &self,
        organization_id: Uuid,
        session_name: &str,
        patch: Map<String, Value>,
    ) -> Result<CallMetadata> {
        let (_, existing) = self.load_owned(organization_id, session_name).await?;

        let mut merged = match serde_json::to_value(&existing) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key, value);
        }

        let mut metadata: CallMetadata = serde_json::from_value(Value::Object(merged))
            .map_err(|e| DomainError::ValidationError(format!("invalid metadata patch: {}", e)))?;
        // Identity of the session is not patchable
        metadata.organization_id = existing.organization_id;
        metadata.call_type = existing.call_type;
        metadata.agent_id = existing.agent_id;

        self.registry
            .update_metadata(session_name, metadata.to_json()?)
            .await?;
        Ok(metadata)
    }

    /// Attach one more agent worker to an existing session
    pub async fn dispatch_agent(
        &self,
        organization_id: Uuid,
        session_name: &str,
        agent_name: &str,
        extra: Map<String, Value>,
    ) -> Result<DispatchRecord> {
        let (_, mut metadata) = self.load_owned(organization_id, session_name).await?;
        metadata.extra.extend(extra);

        let record = self
            .dispatcher
            .dispatch(session_name, agent_name, metadata.to_json()?)
            .await?;
        counter!("agent_dispatches_total").increment(1);
        Ok(record)
    }

    pub async fn list_dispatches(
        &self,
        organization_id: Uuid,
        session_name: &str,
    ) -> Result<Vec<DispatchRecord>> {
        self.load_owned(organization_id, session_name).await?;
        self.dispatcher.list(session_name).await
    }

    /// Cancel a dispatch. Idempotent, and invisible dispatches (unknown
    /// id, or another tenant's session) are treated as already gone.
    pub async fn cancel_dispatch(&self, organization_id: Uuid, dispatch_id: Uuid) -> Result<()> {
        let record = match self.dispatcher.get(dispatch_id).await? {
            Some(record) => record,
            None => return Ok(()),
        };

        // Ownership comes from the record itself; the session may already
        // be gone by the time the cancel arrives
        let owned = CallMetadata::parse(&record.metadata)
            .map(|m| m.organization_id == organization_id)
            .unwrap_or(false);
        if !owned {
            warn!(dispatch = %dispatch_id, "cancel on dispatch not visible to caller");
            return Ok(());
        }

        self.dispatcher.cancel(dispatch_id).await
    }

    /// Worker join confirmation correlated to a dispatch id
    pub async fn confirm_dispatch(
        &self,
        organization_id: Uuid,
        dispatch_id: Uuid,
    ) -> Result<DispatchRecord> {
        let record = self
            .dispatcher
            .get(dispatch_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("dispatch {}", dispatch_id)))?;
        self.load_owned(organization_id, &record.session_name)
            .await?;
        self.dispatcher.confirm_joined(dispatch_id).await
    }

    async fn resolve_agent(&self, agent_id: Uuid, organization_id: Uuid) -> Result<AgentRef> {
        match self.agents.get(agent_id).await? {
            Some(agent) if agent.organization_id == organization_id => Ok(agent),
            _ => Err(DomainError::NotFound(format!("agent {}", agent_id))),
        }
    }

    /// Load a session the caller's organization owns. Absent and foreign
    /// sessions produce the identical NotFound.
    async fn load_owned(
        &self,
        organization_id: Uuid,
        session_name: &str,
    ) -> Result<(CallSession, CallMetadata)> {
        let not_found = || DomainError::NotFound(format!("session {}", session_name));

        let session = self
            .registry
            .status(session_name)
            .await?
            .ok_or_else(not_found)?;
        let metadata = CallMetadata::parse(&session.metadata).map_err(|_| not_found())?;
        if metadata.organization_id != organization_id {
            return Err(not_found());
        }
        Ok((session, metadata))
    }
}

fn generate_session_name(call_type: CallType) -> String {
    format!("{}_{}", call_type.name_prefix(), random_suffix(12))
}

fn participant_identity() -> String {
    format!("user_{}", random_suffix(10))
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn clamp_ttl(call_type: CallType, requested_secs: Option<i64>) -> Result<i64> {
    let requested = requested_secs.unwrap_or_else(|| call_type.default_ttl_secs());
    if requested <= 0 {
        return Err(DomainError::ValidationError(
            "call duration must be positive".to_string(),
        ));
    }
    Ok(requested.min(call_type.max_ttl_secs()))
}

fn validate_phone_number(phone_number: &str) -> Result<()> {
    let digits = phone_number.chars().filter(|c| c.is_ascii_digit()).count();
    let valid_chars = phone_number
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if digits < 4 || !valid_chars {
        return Err(DomainError::ValidationError(format!(
            "invalid phone number: {}",
            phone_number
        )));
    }
    Ok(())
}
