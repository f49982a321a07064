//! In-memory implementation of `ReviewStore`.
//!
//! All tables live behind one `RwLock`. Each write operation validates
//! first and mutates only after every check has passed, all while holding
//! the write guard, so a failed operation leaves nothing behind.
//! All state is lost on restart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use reviewctl_core::{PrStatus, PullRequest, PullRequestShort, Team, TeamMember, User};

use super::store::{NewPullRequest, ReviewStore};
use crate::error::{ReviewError, ReviewResult};

#[derive(Default)]
struct Tables {
    teams: BTreeSet<String>,
    /// Keyed by user ID, so iteration is ordered by user ID
    users: BTreeMap<String, User>,
    prs: HashMap<String, PullRequest>,
}

/// In-memory review store.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_team(&self, team: &Team) -> ReviewResult<Team> {
        let mut tables = self.tables.write().await;

        if !tables.teams.insert(team.team_name.clone()) {
            return Err(ReviewError::TeamExists(team.team_name.clone()));
        }
        for user in team.users() {
            tables.users.insert(user.user_id.clone(), user);
        }

        Ok(team.clone())
    }

    async fn get_team(&self, team_name: &str) -> ReviewResult<Team> {
        let tables = self.tables.read().await;

        let members: Vec<TeamMember> = tables
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .map(TeamMember::from)
            .collect();

        if members.is_empty() {
            return Err(ReviewError::team_not_found(team_name));
        }

        Ok(Team {
            team_name: team_name.to_owned(),
            members,
        })
    }

    async fn set_user_active(&self, user_id: &str, is_active: bool) -> ReviewResult<User> {
        let mut tables = self.tables.write().await;

        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| ReviewError::user_not_found(user_id))?;
        user.is_active = is_active;

        Ok(user.clone())
    }

    async fn get_user(&self, user_id: &str) -> ReviewResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ReviewError::user_not_found(user_id))
    }

    async fn active_team_members(
        &self,
        team_name: &str,
        exclude: &[String],
    ) -> ReviewResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active && !exclude.contains(&u.user_id))
            .cloned()
            .collect())
    }

    async fn create_pr(
        &self,
        pr: &NewPullRequest,
        reviewers: &[String],
    ) -> ReviewResult<PullRequest> {
        let mut tables = self.tables.write().await;

        if tables.prs.contains_key(&pr.pull_request_id) {
            return Err(ReviewError::PrExists(pr.pull_request_id.clone()));
        }
        // Foreign keys, as the relational schema enforces them
        if !tables.users.contains_key(&pr.author_id) {
            return Err(ReviewError::user_not_found(&pr.author_id));
        }
        if let Some(missing) = reviewers.iter().find(|r| !tables.users.contains_key(*r)) {
            return Err(ReviewError::user_not_found(missing));
        }

        let mut assigned: Vec<String> = reviewers.to_vec();
        assigned.sort();
        assigned.dedup();

        let created = PullRequest {
            pull_request_id: pr.pull_request_id.clone(),
            pull_request_name: pr.pull_request_name.clone(),
            author_id: pr.author_id.clone(),
            status: PrStatus::Open,
            assigned_reviewers: assigned,
            created_at: pr.created_at,
            merged_at: None,
        };
        tables
            .prs
            .insert(created.pull_request_id.clone(), created.clone());

        Ok(created)
    }

    async fn get_pr(&self, pr_id: &str) -> ReviewResult<PullRequest> {
        let tables = self.tables.read().await;
        tables
            .prs
            .get(pr_id)
            .cloned()
            .ok_or_else(|| ReviewError::pr_not_found(pr_id))
    }

    async fn merge_pr(&self, pr_id: &str, merged_at: DateTime<Utc>) -> ReviewResult<PullRequest> {
        let mut tables = self.tables.write().await;

        let pr = tables
            .prs
            .get_mut(pr_id)
            .ok_or_else(|| ReviewError::pr_not_found(pr_id))?;

        if !pr.is_merged() {
            pr.status = PrStatus::Merged;
            pr.merged_at = Some(merged_at);
        }

        Ok(pr.clone())
    }

    async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> ReviewResult<()> {
        let mut tables = self.tables.write().await;

        let new_team = tables
            .users
            .get(new_reviewer)
            .map(|u| u.team_name.clone())
            .ok_or_else(|| ReviewError::user_not_found(new_reviewer))?;

        let pr = tables
            .prs
            .get_mut(pr_id)
            .ok_or_else(|| ReviewError::pr_not_found(pr_id))?;

        if pr.is_merged() {
            return Err(ReviewError::PrMerged(pr_id.to_owned()));
        }

        let Some(slot) = pr.assigned_reviewers.iter().position(|r| r == old_reviewer) else {
            return Err(ReviewError::NotAssigned {
                pr_id: pr_id.to_owned(),
                user_id: old_reviewer.to_owned(),
            });
        };

        // A concurrent swap already took this candidate
        if pr.has_reviewer(new_reviewer) {
            return Err(ReviewError::NoCandidate(new_team));
        }

        pr.assigned_reviewers[slot] = new_reviewer.to_owned();
        pr.assigned_reviewers.sort();
        Ok(())
    }

    async fn user_reviews(&self, user_id: &str) -> ReviewResult<Vec<PullRequestShort>> {
        let tables = self.tables.read().await;

        let mut reviewing: Vec<&PullRequest> = tables
            .prs
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .collect();
        reviewing.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });

        Ok(reviewing.into_iter().map(PullRequest::to_short).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn member(id: &str, active: bool) -> TeamMember {
        TeamMember {
            user_id: id.into(),
            username: format!("User {id}"),
            is_active: active,
        }
    }

    fn team(name: &str, members: Vec<TeamMember>) -> Team {
        Team {
            team_name: name.into(),
            members,
        }
    }

    fn new_pr(id: &str, author: &str, created_at: DateTime<Utc>) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.into(),
            pull_request_name: format!("PR {id}"),
            author_id: author.into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn duplicate_team_leaves_members_unchanged() {
        let store = MemoryStore::new();
        store
            .create_team(&team("core", vec![member("a", true), member("b", true)]))
            .await
            .unwrap();

        let err = store
            .create_team(&team("core", vec![member("a", false), member("z", true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::TeamExists(_)));

        let stored = store.get_team("core").await.unwrap();
        assert_eq!(stored.members, vec![member("a", true), member("b", true)]);
        assert!(store.get_user("z").await.is_err());
    }

    #[tokio::test]
    async fn team_creation_moves_existing_users() {
        let store = MemoryStore::new();
        store
            .create_team(&team("old", vec![member("a", true)]))
            .await
            .unwrap();
        store
            .create_team(&team("new", vec![member("a", false)]))
            .await
            .unwrap();

        let user = store.get_user("a").await.unwrap();
        assert_eq!(user.team_name, "new");
        assert!(!user.is_active);

        // "old" has no members left, which reads as missing
        let err = store.get_team("old").await.unwrap_err();
        assert!(matches!(err, ReviewError::NotFound { resource: "team", .. }));
    }

    #[tokio::test]
    async fn active_members_respect_exclusions() {
        let store = MemoryStore::new();
        store
            .create_team(&team(
                "core",
                vec![member("a", true), member("b", true), member("c", false), member("d", true)],
            ))
            .await
            .unwrap();

        let users = store
            .active_team_members("core", &["a".into(), "d".into()])
            .await
            .unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn merge_keeps_first_timestamp() {
        let store = MemoryStore::new();
        store
            .create_team(&team("core", vec![member("a", true)]))
            .await
            .unwrap();
        let now = Utc::now();
        store.create_pr(&new_pr("pr-1", "a", now), &[]).await.unwrap();

        let first = store.merge_pr("pr-1", now).await.unwrap();
        let second = store
            .merge_pr("pr-1", now + Duration::seconds(30))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.merged_at, Some(now));
    }

    #[tokio::test]
    async fn reassign_checks_status_and_link() {
        let store = MemoryStore::new();
        store
            .create_team(&team(
                "core",
                vec![member("a", true), member("b", true), member("c", true)],
            ))
            .await
            .unwrap();
        store
            .create_pr(&new_pr("pr-1", "a", Utc::now()), &["b".into()])
            .await
            .unwrap();

        let err = store.reassign_reviewer("pr-1", "c", "a").await.unwrap_err();
        assert!(matches!(err, ReviewError::NotAssigned { .. }));

        store.reassign_reviewer("pr-1", "b", "c").await.unwrap();
        assert_eq!(
            store.get_pr("pr-1").await.unwrap().assigned_reviewers,
            vec!["c".to_string()]
        );

        store.merge_pr("pr-1", Utc::now()).await.unwrap();
        let err = store.reassign_reviewer("pr-1", "c", "b").await.unwrap_err();
        assert!(matches!(err, ReviewError::PrMerged(_)));
        assert_eq!(
            store.get_pr("pr-1").await.unwrap().assigned_reviewers,
            vec!["c".to_string()]
        );
    }

    #[tokio::test]
    async fn reassign_to_a_current_reviewer_is_no_candidate() {
        let store = MemoryStore::new();
        store
            .create_team(&team(
                "core",
                vec![member("a", true), member("b", true), member("c", true), member("d", true)],
            ))
            .await
            .unwrap();
        store
            .create_pr(&new_pr("pr-1", "a", Utc::now()), &["b".into(), "c".into()])
            .await
            .unwrap();

        // Two swaps that drew the same user: the second one loses
        store.reassign_reviewer("pr-1", "b", "d").await.unwrap();
        let err = store.reassign_reviewer("pr-1", "c", "d").await.unwrap_err();
        assert!(matches!(err, ReviewError::NoCandidate(ref t) if t == "core"));
        assert!(!err.is_internal());
        assert_eq!(
            store.get_pr("pr-1").await.unwrap().assigned_reviewers,
            vec!["c".to_string(), "d".to_string()]
        );
    }

    #[tokio::test]
    async fn user_reviews_newest_first() {
        let store = MemoryStore::new();
        store
            .create_team(&team("core", vec![member("a", true), member("b", true)]))
            .await
            .unwrap();
        let t0 = Utc::now();
        store
            .create_pr(&new_pr("pr-old", "a", t0), &["b".into()])
            .await
            .unwrap();
        store
            .create_pr(&new_pr("pr-new", "a", t0 + Duration::minutes(1)), &["b".into()])
            .await
            .unwrap();

        let prs = store.user_reviews("b").await.unwrap();
        let ids: Vec<_> = prs.iter().map(|p| p.pull_request_id.as_str()).collect();
        assert_eq!(ids, vec!["pr-new", "pr-old"]);

        assert!(store.user_reviews("a").await.unwrap().is_empty());
    }
}
