//! Campaign API integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`
use uuid::Uuid;
use vocalis::application::{CallOrchestrator, CampaignService};
use vocalis::domain::agent::{AgentRef, AgentRepository};
use vocalis::domain::campaign::SystemClock;
use vocalis::domain::trunk::SipTrunkConfig;
use vocalis::infrastructure::media::{
    AccessTokenIssuer, InMemoryDispatchClient, InMemorySessionRegistry, SessionRegistry,
};
use vocalis::infrastructure::persistence::{InMemoryAgentStore, InMemoryCampaignStore};
use vocalis::interface::api::{build_router, AppState, StaticTokenVerifier};

const TEST_SECRET: &str = "8344edc12f4a1bb5ae48a3a102253a3fd0dee9f5b3a5c8d27e9d1b64c0ffee00";

struct TestEnv {
    app: Router,
    agent_id: Uuid,
}

async fn setup() -> TestEnv {
    let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
    let dispatcher = Arc::new(InMemoryDispatchClient::new());
    let agents: Arc<dyn AgentRepository> = Arc::new(InMemoryAgentStore::new());
    let campaigns = Arc::new(InMemoryCampaignStore::new());

    let organization_id = Uuid::new_v4();
    let other_org = Uuid::new_v4();

    let mut agent = AgentRef::new(
        organization_id,
        "dialer-agent".to_string(),
        "Dialer Agent".to_string(),
    );
    agent.publish();
    let agent_id = agent.id;
    agents.put(agent).await.unwrap();

    let identity = Arc::new(StaticTokenVerifier::new());
    identity
        .insert("test-key".to_string(), organization_id, Uuid::new_v4())
        .await;
    identity
        .insert("other-key".to_string(), other_org, Uuid::new_v4())
        .await;

    let tokens = AccessTokenIssuer::new("test-api-key", TEST_SECRET).unwrap();
    let orchestrator = Arc::new(CallOrchestrator::new(
        registry,
        dispatcher,
        agents.clone(),
        tokens,
        SipTrunkConfig::default(),
    ));
    let campaigns = Arc::new(CampaignService::new(
        campaigns,
        agents,
        Arc::new(SystemClock),
    ));

    let state = AppState {
        orchestrator,
        campaigns,
        identity,
    };
    let prometheus_handle = PrometheusBuilder::new().build_recorder().handle();

    TestEnv {
        app: build_router(state, prometheus_handle),
        agent_id,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Dial window open right now, no time slot restriction
fn call_config() -> Value {
    json!({
        "dial_window": {
            "starts_at": Utc::now() - Duration::hours(1),
            "ends_at": Utc::now() + Duration::days(30)
        },
        "retry_policy": { "max_attempts": 3, "cool_down_secs": 600 },
        "max_call_duration_secs": 1800,
        "inactive_timeout_secs": 60
    })
}

async fn create_campaign(env: &TestEnv, name: &str) -> Uuid {
    let response = env
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/campaigns",
            Some("test-key"),
            Some(json!({ "name": name, "agent_id": env.agent_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "draft");
    json["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_create_campaign_requires_owned_agent() {
    let env = setup().await;

    let foreign = env
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/campaigns",
            Some("other-key"),
            Some(json!({ "name": "q4 push", "agent_id": env.agent_id })),
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let unknown = env
        .app
        .oneshot(request(
            "POST",
            "/campaigns",
            Some("test-key"),
            Some(json!({ "name": "q4 push", "agent_id": Uuid::new_v4() })),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_requires_call_config() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    let response = env
        .app
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/start", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("call configuration required"));
}

#[tokio::test]
async fn test_campaign_lifecycle() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    let configured = env
        .app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/campaigns/{}/call-config", id),
            Some("test-key"),
            Some(call_config()),
        ))
        .await
        .unwrap();
    assert_eq!(configured.status(), StatusCode::OK);

    for (step, expected) in [
        ("start", "running"),
        ("pause", "paused"),
        ("resume", "running"),
        ("complete", "completed"),
    ] {
        let response = env
            .app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/campaigns/{}/{}", id, step),
                Some("test-key"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "step {}", step);
        assert_eq!(body_json(response).await["data"]["status"], expected);
    }

    // Completed is terminal
    let restart = env
        .app
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/start", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(restart.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pause_draft_is_conflict() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    let response = env
        .app
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/pause", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_status_cannot_bypass_start() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    // draft -> scheduled through the explicit path is fine
    let scheduled = env
        .app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/campaigns/{}", id),
            Some("test-key"),
            Some(json!({ "status": "scheduled" })),
        ))
        .await
        .unwrap();
    assert_eq!(scheduled.status(), StatusCode::OK);
    assert_eq!(body_json(scheduled).await["data"]["status"], "scheduled");

    // running is reserved for start, which enforces the guards
    let running = env
        .app
        .oneshot(request(
            "PUT",
            &format!("/campaigns/{}", id),
            Some("test-key"),
            Some(json!({ "status": "running" })),
        ))
        .await
        .unwrap();
    assert_eq!(running.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_outcomes_update_stats() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    env.app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/campaigns/{}/call-config", id),
            Some("test-key"),
            Some(call_config()),
        ))
        .await
        .unwrap();
    env.app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/start", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();

    for outcome in [
        json!({ "successful": true, "duration_secs": 90.0 }),
        json!({ "successful": true, "duration_secs": 150.0 }),
        json!({ "successful": false }),
    ] {
        let response = env
            .app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/campaigns/{}/outcomes", id),
                Some("test-key"),
                Some(outcome),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let analytics = env
        .app
        .oneshot(request(
            "GET",
            &format!("/campaigns/{}/analytics", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(analytics.status(), StatusCode::OK);

    let json = body_json(analytics).await;
    assert_eq!(json["data"]["stats"]["total_calls"], 3);
    assert_eq!(json["data"]["stats"]["successful_calls"], 2);
    assert_eq!(json["data"]["stats"]["failed_calls"], 1);
    assert_eq!(json["data"]["stats"]["average_call_duration"], 80.0);
    assert_eq!(json["data"]["window_open"], true);
}

#[tokio::test]
async fn test_delete_refused_while_running() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    env.app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/campaigns/{}/call-config", id),
            Some("test-key"),
            Some(call_config()),
        ))
        .await
        .unwrap();
    env.app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/start", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();

    let refused = env
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/campaigns/{}", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::CONFLICT);

    env.app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/campaigns/{}/pause", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();

    let deleted = env
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/campaigns/{}", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    // Soft-deleted campaigns are gone from reads
    let gone = env
        .app
        .oneshot(request(
            "GET",
            &format!("/campaigns/{}", id),
            Some("test-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_campaigns_are_tenant_scoped() {
    let env = setup().await;
    let id = create_campaign(&env, "q4 push").await;

    let foreign = env
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/campaigns/{}", id),
            Some("other-key"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let listed = env
        .app
        .oneshot(request("GET", "/campaigns", Some("other-key"), None))
        .await
        .unwrap();
    assert_eq!(body_json(listed).await["data"].as_array().unwrap().len(), 0);
}
