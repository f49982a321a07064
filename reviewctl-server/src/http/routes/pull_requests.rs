//! Pull request endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use reviewctl_core::model::check_length;
use reviewctl_core::{PrId, PullRequest, UserId};

use crate::http::error::ApiError;
use crate::http::extractors::ApiJson;
use crate::http::server::AppState;

/// Create pull request request
#[derive(Deserialize)]
pub struct CreatePrRequest {
    pub pull_request_id: PrId,
    pub pull_request_name: String,
    pub author_id: UserId,
}

/// Merge request
#[derive(Deserialize)]
pub struct MergePrRequest {
    pub pull_request_id: PrId,
}

/// Reassign request
#[derive(Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: PrId,
    pub old_user_id: UserId,
}

#[derive(Serialize)]
pub struct PrResponse {
    pub pr: PullRequest,
}

#[derive(Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    pub replaced_by: String,
}

/// POST /pullRequest/create - create a PR and assign reviewers
async fn create_pr(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePrRequest>,
) -> Result<(StatusCode, Json<PrResponse>), ApiError> {
    check_length("pull_request_name", &req.pull_request_name)?;

    let pr = state
        .service
        .create_pr(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PrResponse { pr })))
}

/// POST /pullRequest/merge - merge a PR (idempotent)
async fn merge_pr(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<MergePrRequest>,
) -> Result<Json<PrResponse>, ApiError> {
    let pr = state.service.merge_pr(&req.pull_request_id).await?;
    Ok(Json(PrResponse { pr }))
}

/// POST /pullRequest/reassign - swap one reviewer for a teammate
async fn reassign(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let outcome = state
        .service
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: outcome.pr,
        replaced_by: outcome.replaced_by,
    }))
}

/// Pull request routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pullRequest/create", post(create_pr))
        .route("/pullRequest/merge", post(merge_pr))
        .route("/pullRequest/reassign", post(reassign))
}
