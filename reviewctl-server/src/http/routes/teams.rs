//! Team endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use reviewctl_core::model::check_length;
use reviewctl_core::{Team, TeamMember, TeamName, UserId};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery};
use crate::http::server::AppState;

/// Member entry in a create-team request
#[derive(Deserialize)]
pub struct MemberRequest {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

/// Create team request
#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: TeamName,
    #[serde(default)]
    pub members: Vec<MemberRequest>,
}

/// `?team_name=` query
#[derive(Deserialize)]
pub struct TeamQuery {
    pub team_name: TeamName,
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

impl CreateTeamRequest {
    fn into_team(self) -> Result<Team, ApiError> {
        let members = self
            .members
            .into_iter()
            .map(|m| {
                check_length("username", &m.username)?;
                Ok(TeamMember {
                    user_id: m.user_id.into_string(),
                    username: m.username,
                    is_active: m.is_active,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(Team {
            team_name: self.team_name.into_string(),
            members,
        })
    }
}

/// POST /team/add - create a team and upsert its members
async fn add_team(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let team = state.service.create_team(req.into_team()?).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get - a team with its members
async fn get_team(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TeamQuery>,
) -> Result<Json<Team>, ApiError> {
    let team = state.service.get_team(&query.team_name).await?;
    Ok(Json(team))
}

/// Team routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
}
