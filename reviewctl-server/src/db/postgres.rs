//! PostgreSQL store
//!
//! Multi-statement operations hold one `sqlx::Transaction` for their whole
//! duration. Early returns drop it, which rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use reviewctl_core::{PrStatus, PullRequest, PullRequestShort, Team, TeamMember, User};

use super::store::{NewPullRequest, ReviewStore};
use crate::error::{ReviewError, ReviewResult};

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: String,
    username: String,
    team_name: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            user_id: r.user_id,
            username: r.username,
            team_name: r.team_name,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
struct PrRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct PrShortRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
}

fn parse_status(s: &str) -> ReviewResult<PrStatus> {
    s.parse()
        .map_err(|e: reviewctl_core::ValidationError| ReviewError::InvalidData(e.to_string()))
}

/// Load a PR and its reviewers on one connection (pooled or transactional).
async fn load_pr(conn: &mut PgConnection, pr_id: &str) -> ReviewResult<Option<PullRequest>> {
    let Some(row) = sqlx::query_as::<_, PrRow>(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = $1
        "#,
    )
    .bind(pr_id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let reviewers: Vec<String> = sqlx::query_scalar(
        "SELECT reviewer_id FROM pr_reviewers WHERE pr_id = $1 ORDER BY reviewer_id",
    )
    .bind(pr_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(PullRequest {
        status: parse_status(&row.status)?,
        pull_request_id: row.pull_request_id,
        pull_request_name: row.pull_request_name,
        author_id: row.author_id,
        assigned_reviewers: reviewers,
        created_at: row.created_at,
        merged_at: row.merged_at,
    }))
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_team(&self, team: &Team) -> ReviewResult<Team> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO teams (team_name) VALUES ($1) ON CONFLICT (team_name) DO NOTHING",
        )
        .bind(&team.team_name)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(ReviewError::TeamExists(team.team_name.clone()));
        }

        for member in &team.members {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id)
                DO UPDATE SET username = EXCLUDED.username,
                              team_name = EXCLUDED.team_name,
                              is_active = EXCLUDED.is_active
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(&team.team_name)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(team.clone())
    }

    async fn get_team(&self, team_name: &str) -> ReviewResult<Team> {
        let members: Vec<TeamMember> = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = $1
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| TeamMember::from(User::from(r)))
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
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET is_active = $2
            WHERE user_id = $1
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ReviewError::user_not_found(user_id))?;

        Ok(row.into())
    }

    async fn get_user(&self, user_id: &str) -> ReviewResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ReviewError::user_not_found(user_id))?;

        Ok(row.into())
    }

    async fn active_team_members(
        &self,
        team_name: &str,
        exclude: &[String],
    ) -> ReviewResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = $1 AND is_active AND user_id <> ALL($2)
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_pr(
        &self,
        pr: &NewPullRequest,
        reviewers: &[String],
    ) -> ReviewResult<PullRequest> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (pull_request_id) DO NOTHING
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .bind(PrStatus::Open.as_str())
        .bind(pr.created_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(ReviewError::PrExists(pr.pull_request_id.clone()));
        }

        for reviewer in reviewers {
            sqlx::query("INSERT INTO pr_reviewers (pr_id, reviewer_id) VALUES ($1, $2)")
                .bind(&pr.pull_request_id)
                .bind(reviewer)
                .execute(&mut *tx)
                .await?;
        }

        let created = load_pr(&mut *tx, &pr.pull_request_id)
            .await?
            .ok_or_else(|| ReviewError::pr_not_found(&pr.pull_request_id))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_pr(&self, pr_id: &str) -> ReviewResult<PullRequest> {
        let mut conn = self.pool.acquire().await?;
        load_pr(&mut *conn, pr_id)
            .await?
            .ok_or_else(|| ReviewError::pr_not_found(pr_id))
    }

    async fn merge_pr(&self, pr_id: &str, merged_at: DateTime<Utc>) -> ReviewResult<PullRequest> {
        let mut tx = self.pool.begin().await?;

        // No-op for MERGED rows, which keeps the first merge time
        sqlx::query(
            r#"
            UPDATE pull_requests
            SET status = $2, merged_at = $3
            WHERE pull_request_id = $1 AND status = $4
            "#,
        )
        .bind(pr_id)
        .bind(PrStatus::Merged.as_str())
        .bind(merged_at)
        .bind(PrStatus::Open.as_str())
        .execute(&mut *tx)
        .await?;

        let pr = load_pr(&mut *tx, pr_id)
            .await?
            .ok_or_else(|| ReviewError::pr_not_found(pr_id))?;

        tx.commit().await?;
        Ok(pr)
    }

    async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> ReviewResult<()> {
        let mut tx = self.pool.begin().await?;

        let status: String = sqlx::query_scalar(
            "SELECT status FROM pull_requests WHERE pull_request_id = $1 FOR UPDATE",
        )
        .bind(pr_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ReviewError::pr_not_found(pr_id))?;

        if parse_status(&status)? == PrStatus::Merged {
            return Err(ReviewError::PrMerged(pr_id.to_owned()));
        }

        // The row lock above serializes swaps on this PR, so a link that
        // exists now was committed by a concurrent swap that drew the same user
        let taken_in: Option<String> = sqlx::query_scalar(
            r#"
            SELECT u.team_name
            FROM pr_reviewers r
            JOIN users u ON u.user_id = r.reviewer_id
            WHERE r.pr_id = $1 AND r.reviewer_id = $2
            "#,
        )
        .bind(pr_id)
        .bind(new_reviewer)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(team_name) = taken_in {
            return Err(ReviewError::NoCandidate(team_name));
        }

        let swapped = sqlx::query(
            "UPDATE pr_reviewers SET reviewer_id = $3 WHERE pr_id = $1 AND reviewer_id = $2",
        )
        .bind(pr_id)
        .bind(old_reviewer)
        .bind(new_reviewer)
        .execute(&mut *tx)
        .await?;

        if swapped.rows_affected() == 0 {
            return Err(ReviewError::NotAssigned {
                pr_id: pr_id.to_owned(),
                user_id: old_reviewer.to_owned(),
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn user_reviews(&self, user_id: &str) -> ReviewResult<Vec<PullRequestShort>> {
        let rows = sqlx::query_as::<_, PrShortRow>(
            r#"
            SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
            FROM pull_requests p
            JOIN pr_reviewers r ON r.pr_id = p.pull_request_id
            WHERE r.reviewer_id = $1
            ORDER BY p.created_at DESC, p.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(PullRequestShort {
                    status: parse_status(&r.status)?,
                    pull_request_id: r.pull_request_id,
                    pull_request_name: r.pull_request_name,
                    author_id: r.author_id,
                })
            })
            .collect()
    }
}
