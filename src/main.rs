use vocalis::application::{CallOrchestrator, CampaignService};
use vocalis::config::Config;
use vocalis::domain::agent::{AgentRef, AgentRepository};
use vocalis::domain::campaign::SystemClock;
use vocalis::domain::trunk::SipTrunkConfig;
use vocalis::infrastructure::media::{
    AccessTokenIssuer, InMemoryDispatchClient, InMemorySessionRegistry, SessionRegistry,
};
use vocalis::infrastructure::persistence::{InMemoryAgentStore, InMemoryCampaignStore};
use vocalis::interface::api::metrics_handler::update_active_sessions;
use vocalis::interface::api::{build_router, init_metrics, AppState, StaticTokenVerifier};
use std::sync::Arc;
use tracing::{info, Level};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Vocalis call orchestration service");

    // Load configuration
    let config = Config::load()?;
    info!(host = %config.server.host, port = config.server.port, "Configuration loaded");

    // In-memory stores
    let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
    let dispatcher = Arc::new(InMemoryDispatchClient::new());
    let agents: Arc<dyn AgentRepository> = Arc::new(InMemoryAgentStore::new());
    let campaigns = Arc::new(InMemoryCampaignStore::new());

    // Credential issuer for the media control plane
    let tokens = AccessTokenIssuer::new(
        config.media.api_key.clone(),
        &config.media.signing_secret,
    )?;

    let orchestrator = Arc::new(CallOrchestrator::new(
        registry.clone(),
        dispatcher,
        agents.clone(),
        tokens,
        SipTrunkConfig::default(),
    ));
    let campaign_service = Arc::new(CampaignService::new(
        campaigns,
        agents.clone(),
        Arc::new(SystemClock),
    ));

    // Bearer tokens from configuration; dev fallback when none are configured
    let identity = Arc::new(StaticTokenVerifier::new());
    if config.auth.static_tokens.is_empty() {
        let organization_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        identity
            .insert("dev-token".to_string(), organization_id, user_id)
            .await;

        let mut agent = AgentRef::new(
            organization_id,
            "demo-agent".to_string(),
            "Demo Agent".to_string(),
        );
        agent.publish();
        let agent_id = agent.id;
        agents.put(agent).await?;

        info!(
            organization = %organization_id,
            agent = %agent_id,
            "No static tokens configured; seeded dev token 'dev-token' and a published demo agent"
        );
    } else {
        for entry in &config.auth.static_tokens {
            identity
                .insert(entry.token.clone(), entry.organization_id, entry.user_id)
                .await;
        }
        info!(count = config.auth.static_tokens.len(), "Loaded static bearer tokens");
    }

    // Initialize metrics exporter
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics();

    // Active sessions gauge updater
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(sessions) = registry.list().await {
                    update_active_sessions(sessions.len());
                }
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        });
        info!("Metrics updater task started");
    }

    let state = AppState {
        orchestrator,
        campaigns: campaign_service,
        identity,
    };
    let app = build_router(state, prometheus_handle);

    let bind = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("REST API server listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
