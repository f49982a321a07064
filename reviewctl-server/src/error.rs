//! Error kinds shared by the store and the service layer
//!
//! Every business-rule failure has its own variant so callers can match
//! exhaustively. `Database` and `InvalidData` are internal faults.

use reviewctl_core::NoCandidate;
use thiserror::Error;

pub type ReviewResult<T> = Result<T, ReviewError>;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("team '{0}' already exists")]
    TeamExists(String),

    #[error("pull request '{0}' already exists")]
    PrExists(String),

    #[error("pull request '{0}' is merged")]
    PrMerged(String),

    #[error("user '{user_id}' is not assigned to pull request '{pr_id}'")]
    NotAssigned { pr_id: String, user_id: String },

    #[error("no active replacement candidate in team '{0}'")]
    NoCandidate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl ReviewError {
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "user",
            id: id.into(),
        }
    }

    pub fn team_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "team",
            id: id.into(),
        }
    }

    pub fn pr_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "pull request",
            id: id.into(),
        }
    }

    /// Attach the team that ran out of candidates.
    pub fn no_candidate(team_name: impl Into<String>) -> impl FnOnce(NoCandidate) -> Self {
        let team_name = team_name.into();
        move |_| Self::NoCandidate(team_name)
    }

    /// True for storage or data faults that must not leak to clients.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::InvalidData(_))
    }
}
