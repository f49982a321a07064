//! Use-case orchestration
//!
//! Sequences store reads and writes around the assignment engine.
//! PR lifecycle is `OPEN -> MERGED`; reviewers can only change while OPEN.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use reviewctl_core::{AssignmentEngine, PrId, PullRequest, Team, TeamName, User, UserId, UserReviews};

use crate::db::{NewPullRequest, ReviewStore};
use crate::error::{ReviewError, ReviewResult};

/// Result of a successful reassignment
#[derive(Debug, Clone)]
pub struct Reassignment {
    pub pr: PullRequest,
    pub replaced_by: String,
}

/// Review-assignment use cases over a store and an assignment engine.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    engine: AssignmentEngine,
}

/// Current time at the precision PostgreSQL keeps (microseconds), so a
/// freshly returned entity compares equal to a later read.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>, engine: AssignmentEngine) -> Self {
        Self { store, engine }
    }

    pub async fn create_team(&self, team: Team) -> ReviewResult<Team> {
        let created = self.store.create_team(&team).await?;
        tracing::info!(
            team = %created.team_name,
            members = created.members.len(),
            "team created"
        );
        Ok(created)
    }

    pub async fn get_team(&self, team_name: &TeamName) -> ReviewResult<Team> {
        self.store.get_team(team_name.as_str()).await
    }

    pub async fn set_user_active(&self, user_id: &UserId, is_active: bool) -> ReviewResult<User> {
        let user = self
            .store
            .set_user_active(user_id.as_str(), is_active)
            .await?;
        tracing::info!(user = %user.user_id, is_active, "user activity updated");
        Ok(user)
    }

    /// Create an OPEN pull request with up to two reviewers from the
    /// author's team.
    pub async fn create_pr(
        &self,
        pr_id: &PrId,
        pr_name: &str,
        author_id: &UserId,
    ) -> ReviewResult<PullRequest> {
        let author = self.store.get_user(author_id.as_str()).await?;

        let teammates = self
            .store
            .active_team_members(&author.team_name, &[author.user_id.clone()])
            .await?;
        let reviewers = self.engine.pick_initial(&author.user_id, &teammates);

        let new_pr = NewPullRequest {
            pull_request_id: pr_id.as_str().to_owned(),
            pull_request_name: pr_name.to_owned(),
            author_id: author.user_id,
            created_at: now(),
        };
        let pr = self.store.create_pr(&new_pr, &reviewers).await?;

        tracing::info!(
            pr = %pr.pull_request_id,
            author = %pr.author_id,
            reviewers = ?pr.assigned_reviewers,
            "pull request created"
        );
        Ok(pr)
    }

    /// Merge a pull request. Repeated calls return the merged state.
    pub async fn merge_pr(&self, pr_id: &PrId) -> ReviewResult<PullRequest> {
        let pr = self.store.merge_pr(pr_id.as_str(), now()).await?;
        tracing::info!(pr = %pr.pull_request_id, merged_at = ?pr.merged_at, "pull request merged");
        Ok(pr)
    }

    /// Replace `old_user_id` on an OPEN pull request with a random active
    /// member of the old reviewer's team. The author is never eligible.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &PrId,
        old_user_id: &UserId,
    ) -> ReviewResult<Reassignment> {
        let pr = self.store.get_pr(pr_id.as_str()).await?;

        if pr.is_merged() {
            return Err(ReviewError::PrMerged(pr.pull_request_id));
        }
        if !pr.has_reviewer(old_user_id.as_str()) {
            return Err(ReviewError::NotAssigned {
                pr_id: pr.pull_request_id,
                user_id: old_user_id.as_str().to_owned(),
            });
        }

        let old_reviewer = self.store.get_user(old_user_id.as_str()).await?;
        let replacement = self
            .store
            .random_eligible_replacement(
                &old_reviewer.team_name,
                &pr.author_id,
                &old_reviewer.user_id,
                &pr.assigned_reviewers,
                &self.engine,
            )
            .await?;

        self.store
            .reassign_reviewer(&pr.pull_request_id, &old_reviewer.user_id, &replacement.user_id)
            .await?;
        let refreshed = self.store.get_pr(&pr.pull_request_id).await?;

        tracing::info!(
            pr = %refreshed.pull_request_id,
            old = %old_reviewer.user_id,
            new = %replacement.user_id,
            "reviewer reassigned"
        );
        Ok(Reassignment {
            pr: refreshed,
            replaced_by: replacement.user_id,
        })
    }

    /// PRs the user currently reviews. Unknown users are `NotFound`.
    pub async fn user_reviews(&self, user_id: &UserId) -> ReviewResult<UserReviews> {
        let user = self.store.get_user(user_id.as_str()).await?;
        let pull_requests = self.store.user_reviews(&user.user_id).await?;

        Ok(UserReviews {
            user_id: user.user_id,
            pull_requests,
        })
    }
}
