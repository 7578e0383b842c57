//! Call API handlers

use super::auth::OrgContext;
use super::dto::{ApiError, ApiResponse};
use super::AppState;
use crate::application::orchestrator::{
    CallBundle, CallStatusView, SipCallOptions, WebCallOptions,
};
use crate::domain::dispatch::DispatchRecord;
use crate::domain::session::{CallMetadata, CallSession};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateWebCallRequest {
    pub agent_id: Uuid,
    #[serde(flatten)]
    pub options: WebCallOptions,
}

#[derive(Debug, Deserialize)]
pub struct CreateSipCallRequest {
    pub agent_id: Uuid,
    pub phone_number: String,
    #[serde(flatten)]
    pub options: SipCallOptions,
}

#[derive(Debug, Deserialize)]
pub struct EndCallRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMetadataRequest {
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchAgentRequest {
    pub session_name: String,
    pub agent_name: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Create a browser call session
pub async fn create_web_call(
    State(state): State<AppState>,
    context: OrgContext,
    Json(request): Json<CreateWebCallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CallBundle>>), ApiError> {
    info!(
        organization = %context.organization_id,
        agent = %request.agent_id,
        "API: Creating web call"
    );

    let bundle = state
        .orchestrator
        .create_web_call(
            request.agent_id,
            context.user_id,
            context.organization_id,
            request.options,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(bundle))))
}

/// Create an outbound SIP call session
pub async fn create_sip_call(
    State(state): State<AppState>,
    context: OrgContext,
    Json(request): Json<CreateSipCallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CallBundle>>), ApiError> {
    info!(
        organization = %context.organization_id,
        agent = %request.agent_id,
        "API: Creating SIP call"
    );

    let bundle = state
        .orchestrator
        .create_sip_call(
            request.agent_id,
            &request.phone_number,
            context.user_id,
            context.organization_id,
            request.options,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(bundle))))
}

/// List active call sessions for the caller's organization
pub async fn list_active_calls(
    State(state): State<AppState>,
    context: OrgContext,
) -> Result<Json<ApiResponse<Vec<CallSession>>>, ApiError> {
    let sessions = state
        .orchestrator
        .list_active_calls(context.organization_id)
        .await?;
    Ok(Json(ApiResponse::success(sessions)))
}

/// Get live status of one call session
pub async fn get_call_status(
    State(state): State<AppState>,
    context: OrgContext,
    Path(session_name): Path<String>,
) -> Result<Json<ApiResponse<CallStatusView>>, ApiError> {
    let status = state
        .orchestrator
        .get_status(context.organization_id, &session_name)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// End a call session
pub async fn end_call(
    State(state): State<AppState>,
    context: OrgContext,
    Path(session_name): Path<String>,
    body: Option<Json<EndCallRequest>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let reason = body.and_then(|Json(request)| request.reason);

    info!(
        organization = %context.organization_id,
        session = %session_name,
        "API: Ending call"
    );

    state
        .orchestrator
        .end_call(context.organization_id, &session_name, reason.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(())))
}

/// Merge a metadata patch into a call session
pub async fn update_call_metadata(
    State(state): State<AppState>,
    context: OrgContext,
    Path(session_name): Path<String>,
    Json(request): Json<UpdateMetadataRequest>,
) -> Result<Json<ApiResponse<CallMetadata>>, ApiError> {
    let merged = state
        .orchestrator
        .update_call_metadata(context.organization_id, &session_name, request.metadata)
        .await?;
    Ok(Json(ApiResponse::success(merged)))
}

/// Dispatch an additional agent into an existing session
pub async fn dispatch_agent(
    State(state): State<AppState>,
    context: OrgContext,
    Json(request): Json<DispatchAgentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DispatchRecord>>), ApiError> {
    info!(
        organization = %context.organization_id,
        session = %request.session_name,
        agent = %request.agent_name,
        "API: Dispatching agent"
    );

    let record = state
        .orchestrator
        .dispatch_agent(
            context.organization_id,
            &request.session_name,
            &request.agent_name,
            request.metadata,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

/// List agent dispatches for a session
pub async fn list_dispatches(
    State(state): State<AppState>,
    context: OrgContext,
    Path(session_name): Path<String>,
) -> Result<Json<ApiResponse<Vec<DispatchRecord>>>, ApiError> {
    let records = state
        .orchestrator
        .list_dispatches(context.organization_id, &session_name)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

/// Cancel an agent dispatch
pub async fn cancel_dispatch(
    State(state): State<AppState>,
    context: OrgContext,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .orchestrator
        .cancel_dispatch(context.organization_id, dispatch_id)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

/// Confirm an agent joined its session
pub async fn confirm_dispatch(
    State(state): State<AppState>,
    context: OrgContext,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DispatchRecord>>, ApiError> {
    let record = state
        .orchestrator
        .confirm_dispatch(context.organization_id, dispatch_id)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}
