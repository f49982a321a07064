//! The `ReviewStore` trait: persistence contract for the service layer

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewctl_core::{AssignmentEngine, PullRequest, PullRequestShort, Team, User};

use crate::error::{ReviewError, ReviewResult};

/// Pull request fields supplied on creation. Status always starts OPEN.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// Storage for teams, users, pull requests and reviewer links.
///
/// Implementations must make every multi-row write atomic.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a team and upsert all of its members.
    ///
    /// Fails with [`ReviewError::TeamExists`] if the name is taken; no
    /// member is written in that case.
    async fn create_team(&self, team: &Team) -> ReviewResult<Team>;

    /// Team with all current members, ordered by user ID.
    ///
    /// A team without members reports [`ReviewError::NotFound`].
    async fn get_team(&self, team_name: &str) -> ReviewResult<Team>;

    async fn set_user_active(&self, user_id: &str, is_active: bool) -> ReviewResult<User>;

    async fn get_user(&self, user_id: &str) -> ReviewResult<User>;

    /// Active members of a team, minus the excluded user IDs.
    async fn active_team_members(
        &self,
        team_name: &str,
        exclude: &[String],
    ) -> ReviewResult<Vec<User>>;

    /// Insert an OPEN pull request and one link per reviewer.
    async fn create_pr(&self, pr: &NewPullRequest, reviewers: &[String])
        -> ReviewResult<PullRequest>;

    async fn get_pr(&self, pr_id: &str) -> ReviewResult<PullRequest>;

    /// Mark a pull request MERGED. Already merged PRs come back unchanged.
    async fn merge_pr(&self, pr_id: &str, merged_at: DateTime<Utc>) -> ReviewResult<PullRequest>;

    /// Swap `old_reviewer` for `new_reviewer` on an OPEN pull request.
    ///
    /// Status and both links are checked again under the write. If
    /// `new_reviewer` already reviews the PR (a concurrent swap drew the same
    /// user) the call fails with [`ReviewError::NoCandidate`] naming the new
    /// reviewer's team. Other eligibility rules are the caller's job.
    async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> ReviewResult<()>;

    /// PRs the user currently reviews, newest first.
    async fn user_reviews(&self, user_id: &str) -> ReviewResult<Vec<PullRequestShort>>;

    /// One random active member of `team_name` that is not the PR author,
    /// not `departing` and not in `current`.
    async fn random_eligible_replacement(
        &self,
        team_name: &str,
        author_id: &str,
        departing: &str,
        current: &[String],
        engine: &AssignmentEngine,
    ) -> ReviewResult<User> {
        let mut exclude = current.to_vec();
        exclude.push(author_id.to_owned());
        exclude.push(departing.to_owned());

        let candidates = self.active_team_members(team_name, &exclude).await?;
        let picked = engine
            .pick_replacement(author_id, departing, current, &candidates)
            .map_err(ReviewError::no_candidate(team_name))?;

        candidates
            .into_iter()
            .find(|u| u.user_id == picked)
            .ok_or_else(|| ReviewError::user_not_found(picked))
    }
}
