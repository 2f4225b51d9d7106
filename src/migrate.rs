use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Open the configured database and create the schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes on an already open pool. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create matches table. Rows reference documents but are only ever
    // written as a side effect of ingesting `document_id`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            document_id TEXT NOT NULL,
            matched_document_id TEXT NOT NULL,
            similarity REAL NOT NULL,
            UNIQUE(document_id, matched_document_id),
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE,
            FOREIGN KEY (matched_document_id) REFERENCES documents(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create scans table (analytics: one row per successful ingestion)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            document_id TEXT NOT NULL,
            scanned_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create credit_accounts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_accounts (
            user_id TEXT PRIMARY KEY,
            balance INTEGER NOT NULL CHECK (balance >= 0),
            last_reset_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create credit_requests table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_requests (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            requested_at INTEGER NOT NULL,
            processed_at INTEGER,
            FOREIGN KEY (user_id) REFERENCES credit_accounts(user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create admin_logs table (audit trail for request resolution)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admin_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL,
            logged_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_owner_id ON documents(owner_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_document_id ON matches(document_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_user_id ON scans(user_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_credit_requests_user_id ON credit_requests(user_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_credit_requests_status ON credit_requests(status)")
        .execute(pool)
        .await?;

    Ok(())
}
