//! Pull requests and their review state

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// PR lifecycle: `OPEN -> MERGED`, and MERGED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            other => Err(ValidationError::InvalidVariant {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }
}

/// A pull request with its currently assigned reviewers.
///
/// `merged_at` is `Some` exactly when `status` is [`PrStatus::Merged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    pub fn to_short(&self) -> PullRequestShort {
        PullRequestShort {
            pull_request_id: self.pull_request_id.clone(),
            pull_request_name: self.pull_request_name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }
}

/// PR summary used in per-user review listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
}

/// PRs a user is currently reviewing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_pr() -> PullRequest {
        PullRequest {
            pull_request_id: "pr-1".into(),
            pull_request_name: "Add search".into(),
            author_id: "a".into(),
            status: PrStatus::Open,
            assigned_reviewers: vec!["b".into(), "c".into()],
            created_at: Utc::now(),
            merged_at: None,
        }
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("OPEN".parse::<PrStatus>().unwrap(), PrStatus::Open);
        assert_eq!(PrStatus::Merged.as_str().parse::<PrStatus>().unwrap(), PrStatus::Merged);
        assert!("open".parse::<PrStatus>().is_err());
    }

    #[test]
    fn open_pr_omits_merged_at() {
        let json = serde_json::to_value(open_pr()).unwrap();
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"], serde_json::json!(["b", "c"]));
        assert!(json.get("merged_at").is_none());
    }

    #[test]
    fn reviewer_lookup() {
        let pr = open_pr();
        assert!(pr.has_reviewer("b"));
        assert!(!pr.has_reviewer("a"));
        assert!(!pr.is_merged());
        assert_eq!(pr.to_short().status, PrStatus::Open);
    }
}
