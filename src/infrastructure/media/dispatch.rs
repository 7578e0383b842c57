//! Agent dispatch - attaching AI workers to sessions
//!
//! Dispatch models intent: the record is created when the request is
//! handed to the worker pool, and flips to active only once the worker's
//! join is confirmed against the dispatch id. Cancellation is advisory
//! and idempotent; it does not guarantee the worker disconnected.

use crate::domain::dispatch::{DispatchRecord, DispatchStatus};
use crate::domain::shared::{DomainError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait AgentDispatchClient: Send + Sync {
    /// Create a dispatch record for `agent_name` into `session_name`.
    /// Concurrent dispatches for the same session coexist.
    async fn dispatch(
        &self,
        session_name: &str,
        agent_name: &str,
        metadata: String,
    ) -> Result<DispatchRecord>;

    /// Get one dispatch by id
    async fn get(&self, dispatch_id: Uuid) -> Result<Option<DispatchRecord>>;

    /// All dispatches for a session
    async fn list(&self, session_name: &str) -> Result<Vec<DispatchRecord>>;

    /// Cancel a dispatch. Idempotent: cancelling an already-cancelled or
    /// unknown dispatch is a no-op success.
    async fn cancel(&self, dispatch_id: Uuid) -> Result<()>;

    /// Join confirmation correlated to the dispatch id; flips
    /// dispatched -> active. Confirming a cancelled dispatch is a conflict.
    async fn confirm_joined(&self, dispatch_id: Uuid) -> Result<DispatchRecord>;
}

/// In-process dispatch client
#[derive(Default)]
pub struct InMemoryDispatchClient {
    dispatches: RwLock<HashMap<Uuid, DispatchRecord>>,
}

impl InMemoryDispatchClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AgentDispatchClient for InMemoryDispatchClient {
    async fn dispatch(
        &self,
        session_name: &str,
        agent_name: &str,
        metadata: String,
    ) -> Result<DispatchRecord> {
        let record = DispatchRecord::new(
            session_name.to_string(),
            agent_name.to_string(),
            metadata,
        );
        let mut dispatches = self.dispatches.write().await;
        dispatches.insert(record.id, record.clone());
        info!(
            dispatch = %record.id,
            session = session_name,
            agent = agent_name,
            "agent dispatched"
        );
        Ok(record)
    }

    async fn get(&self, dispatch_id: Uuid) -> Result<Option<DispatchRecord>> {
        let dispatches = self.dispatches.read().await;
        Ok(dispatches.get(&dispatch_id).cloned())
    }

    async fn list(&self, session_name: &str) -> Result<Vec<DispatchRecord>> {
        let dispatches = self.dispatches.read().await;
        let mut records: Vec<DispatchRecord> = dispatches
            .values()
            .filter(|d| d.session_name == session_name)
            .cloned()
            .collect();
        records.sort_by_key(|d| d.created_at);
        Ok(records)
    }

    async fn cancel(&self, dispatch_id: Uuid) -> Result<()> {
        let mut dispatches = self.dispatches.write().await;
        match dispatches.get_mut(&dispatch_id) {
            Some(record) => {
                if record.status != DispatchStatus::Cancelled {
                    record.status = DispatchStatus::Cancelled;
                    info!(dispatch = %dispatch_id, "dispatch cancelled");
                }
                Ok(())
            }
            None => {
                debug!(dispatch = %dispatch_id, "cancel on unknown dispatch, no-op");
                Ok(())
            }
        }
    }

    async fn confirm_joined(&self, dispatch_id: Uuid) -> Result<DispatchRecord> {
        let mut dispatches = self.dispatches.write().await;
        let record = dispatches
            .get_mut(&dispatch_id)
            .ok_or_else(|| DomainError::NotFound(format!("dispatch {}", dispatch_id)))?;

        match record.status {
            DispatchStatus::Cancelled => Err(DomainError::Conflict(format!(
                "dispatch {} is cancelled",
                dispatch_id
            ))),
            _ => {
                record.status = DispatchStatus::Active;
                Ok(record.clone())
            }
        }
    }
}
