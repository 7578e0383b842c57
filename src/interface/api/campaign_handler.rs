//! Campaign API handlers

use super::auth::OrgContext;
use super::dto::{ApiError, ApiResponse};
use super::AppState;
use crate::application::campaign_service::{CampaignAnalytics, CampaignUpdate, NewCampaign};
use crate::domain::campaign::{CallConfig, Campaign, CampaignStats, DialOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

/// Create a campaign in draft
pub async fn create_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Json(request): Json<NewCampaign>,
) -> Result<(StatusCode, Json<ApiResponse<Campaign>>), ApiError> {
    info!(
        organization = %context.organization_id,
        name = %request.name,
        "API: Creating campaign"
    );

    let campaign = state
        .campaigns
        .create(context.organization_id, context.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(campaign))))
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    context: OrgContext,
) -> Result<Json<ApiResponse<Vec<Campaign>>>, ApiError> {
    let campaigns = state.campaigns.list(context.organization_id).await?;
    Ok(Json(ApiResponse::success(campaigns)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .get(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Rename and/or explicit status update
pub async fn update_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<CampaignUpdate>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .update(context.organization_id, campaign_id, request)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Replace the dial configuration
pub async fn update_call_config(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
    Json(config): Json<CallConfig>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .update_call_config(context.organization_id, campaign_id, config)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn start_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .start(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn pause_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .pause(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn resume_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .resume(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn complete_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .complete(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn cancel_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let campaign = state
        .campaigns
        .cancel(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Record one completed dial attempt
pub async fn record_outcome(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
    Json(outcome): Json<DialOutcome>,
) -> Result<Json<ApiResponse<CampaignStats>>, ApiError> {
    let stats = state
        .campaigns
        .record_outcome(context.organization_id, campaign_id, outcome)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn campaign_analytics(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CampaignAnalytics>>, ApiError> {
    let analytics = state
        .campaigns
        .analytics(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(analytics)))
}

/// Soft delete; refused while the campaign is running
pub async fn delete_campaign(
    State(state): State<AppState>,
    context: OrgContext,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    info!(
        organization = %context.organization_id,
        campaign = %campaign_id,
        "API: Deleting campaign"
    );

    state
        .campaigns
        .delete(context.organization_id, campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(())))
}
