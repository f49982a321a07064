//! User endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use reviewctl_core::{User, UserId, UserReviews};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery};
use crate::http::server::AppState;

/// Set-active request
#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub user_id: UserId,
    pub is_active: bool,
}

/// `?user_id=` query
#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: UserId,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// POST /users/setIsActive - flip a user's active flag
async fn set_is_active(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .service
        .set_user_active(&req.user_id, req.is_active)
        .await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview - pull requests the user is reviewing
async fn get_review(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<UserReviews>, ApiError> {
    let reviews = state.service.user_reviews(&query.user_id).await?;
    Ok(Json(reviews))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}
