//! Schema setup for teams, users, pull requests and reviewer links

use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        team_name VARCHAR(255) PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id VARCHAR(255) PRIMARY KEY,
        username VARCHAR(255) NOT NULL,
        team_name VARCHAR(255) NOT NULL REFERENCES teams(team_name),
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_team_active ON users (team_name, is_active)",
    r#"
    CREATE TABLE IF NOT EXISTS pull_requests (
        pull_request_id VARCHAR(255) PRIMARY KEY,
        pull_request_name VARCHAR(255) NOT NULL,
        author_id VARCHAR(255) NOT NULL REFERENCES users(user_id),
        status VARCHAR(16) NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'MERGED')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        merged_at TIMESTAMPTZ,
        CHECK ((status = 'MERGED') = (merged_at IS NOT NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pr_reviewers (
        pr_id VARCHAR(255) NOT NULL REFERENCES pull_requests(pull_request_id) ON DELETE CASCADE,
        reviewer_id VARCHAR(255) NOT NULL REFERENCES users(user_id),
        PRIMARY KEY (pr_id, reviewer_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_pr_reviewers_reviewer ON pr_reviewers (reviewer_id)",
];

/// Create tables and indexes if they do not exist.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running schema migrations...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = SCHEMA.len(), "Schema up to date");
    Ok(())
}
