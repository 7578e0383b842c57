//! Session registry - the session lifecycle port of the media control plane
//!
//! Every operation models a network call and is therefore async. Transport
//! failures from a real control-plane client surface unchanged as
//! `DomainError::ExternalService`; the in-memory implementation below is
//! used by tests and the default single-node wiring.

use crate::domain::session::{CallSession, Participant, SessionOptions};
use crate::domain::shared::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Idempotent create: a second call with the same name is a no-op
    /// returning the existing session.
    async fn ensure_exists(&self, name: &str, options: SessionOptions) -> Result<CallSession>;

    /// Session status; absence is typed, not an error
    async fn status(&self, name: &str) -> Result<Option<CallSession>>;

    /// Participants currently in the session (empty when absent)
    async fn participants(&self, name: &str) -> Result<Vec<Participant>>;

    /// Full metadata replace, last-write-wins
    async fn update_metadata(&self, name: &str, metadata: String) -> Result<()>;

    /// Remove all participants, then delete. Deleting an absent session
    /// is a no-op success.
    async fn terminate(&self, name: &str) -> Result<()>;

    /// Registry-wide scan over live sessions
    async fn list(&self) -> Result<Vec<CallSession>>;
}

/// In-process session registry
#[derive(Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<String, CallSession>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/simulation hook: record a participant join
    pub async fn add_participant(&self, name: &str, participant: Participant) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(name) {
            Some(session) => {
                session.participants.push(participant);
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn ensure_exists(&self, name: &str, options: SessionOptions) -> Result<CallSession> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(name) {
            debug!(session = name, "session already exists");
            return Ok(existing.clone());
        }

        let session = CallSession::from_options(name, &options);
        sessions.insert(name.to_string(), session.clone());
        info!(
            session = name,
            call_type = options.call_type.as_str(),
            "session created"
        );
        Ok(session)
    }

    async fn status(&self, name: &str) -> Result<Option<CallSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(name).cloned())
    }

    async fn participants(&self, name: &str) -> Result<Vec<Participant>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(name)
            .map(|s| s.participants.clone())
            .unwrap_or_default())
    }

    async fn update_metadata(&self, name: &str, metadata: String) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(name) {
            Some(session) => {
                session.metadata = metadata;
                Ok(())
            }
            None => Err(crate::domain::shared::DomainError::NotFound(format!(
                "session {}",
                name
            ))),
        }
    }

    async fn terminate(&self, name: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(mut session) = sessions.remove(name) {
            // Drain participants before deleting the session itself
            let drained = session.participants.len();
            session.participants.clear();
            info!(session = name, participants = drained, "session terminated");
        } else {
            debug!(session = name, "terminate on absent session, no-op");
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CallSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().cloned().collect())
    }
}
