//! Document ingestion.
//!
//! [`ingest`] is the one multi-step, invariant-bearing unit in the
//! system: credit check, document insert, corpus scan, match insert, and
//! credit debit all run inside a single SQLite transaction. Either the
//! whole unit commits or none of it is observable — a failure at any
//! step leaves no document, no matches, no scan row, and no debit.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::error::EngineError;
use crate::models::{Document, RankedMatch};
use crate::rank::rank_matches;

/// Result of a successful ingestion.
///
/// `credits_remaining` is computed from the balance read at the start of
/// the unit (`balance - 1`), not re-read after commit; a fresh read could
/// race a concurrent ledger mutation and report a surprising number.
#[derive(Debug)]
pub struct IngestOutcome {
    pub document: Document,
    pub matches: Vec<RankedMatch>,
    pub credits_remaining: i64,
}

/// Ingest a document for `owner_id`, spending one credit.
///
/// Runs as one transaction:
/// 1. check the owner's balance (abort before any write when `< 1`),
/// 2. insert the document and its analytics scan row,
/// 3. load the existing corpus and rank it against the new document,
/// 4. insert the matches at or above `threshold`,
/// 5. debit one credit (guarded, so a concurrent drain aborts the unit),
/// 6. commit.
pub async fn ingest(
    pool: &SqlitePool,
    owner_id: &str,
    title: &str,
    body: &str,
    threshold: f64,
) -> std::result::Result<IngestOutcome, EngineError> {
    if title.trim().is_empty() {
        return Err(EngineError::MalformedInput("title must not be empty"));
    }
    if body.trim().is_empty() {
        return Err(EngineError::MalformedInput("document text must not be empty"));
    }

    let mut tx = pool.begin().await?;

    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM credit_accounts WHERE user_id = ?")
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;
    let balance = balance.unwrap_or(0);
    if balance < 1 {
        return Err(EngineError::InsufficientCredit);
    }

    let document = Document {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        created_at: Utc::now().timestamp(),
    };

    sqlx::query(
        "INSERT INTO documents (id, owner_id, title, body, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&document.id)
    .bind(&document.owner_id)
    .bind(&document.title)
    .bind(&document.body)
    .bind(document.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO scans (user_id, document_id, scanned_at) VALUES (?, ?, ?)")
        .bind(owner_id)
        .bind(&document.id)
        .bind(document.created_at)
        .execute(&mut *tx)
        .await?;

    // The corpus visible here is whatever was committed before this
    // transaction began, plus our own insert — excluded by id. Uncommitted
    // concurrent ingestions are never visible.
    let corpus: Vec<Document> = sqlx::query_as(
        "SELECT id, owner_id, title, body, created_at FROM documents WHERE id != ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(&document.id)
    .fetch_all(&mut *tx)
    .await?;

    let matches = rank_matches(&document, &corpus, threshold);

    for m in &matches {
        sqlx::query(
            "INSERT INTO matches (document_id, matched_document_id, similarity) VALUES (?, ?, ?)",
        )
        .bind(&document.id)
        .bind(&m.document_id)
        .bind(m.similarity)
        .execute(&mut *tx)
        .await?;
    }

    // Guarded debit inside the same transaction: if another unit drained
    // the balance since the read above, this affects zero rows and the
    // whole unit rolls back instead of double-spending the last credit.
    let debited = sqlx::query(
        "UPDATE credit_accounts SET balance = balance - 1 WHERE user_id = ? AND balance >= 1",
    )
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;
    if debited.rows_affected() == 0 {
        return Err(EngineError::InsufficientCredit);
    }

    tx.commit().await?;

    tracing::debug!(
        document_id = %document.id,
        owner_id = %owner_id,
        matches = matches.len(),
        "document ingested"
    );

    Ok(IngestOutcome {
        document,
        matches,
        credits_remaining: balance - 1,
    })
}

/// Run the `ingest` command: read the text, ingest, print the report.
pub async fn run_ingest(
    config: &Config,
    owner_id: &str,
    title: &str,
    file: Option<std::path::PathBuf>,
    text: Option<String>,
    threshold: Option<f64>,
) -> Result<()> {
    let body = match (file, text) {
        (Some(path), None) => std::fs::read_to_string(&path)?,
        (None, Some(text)) => text,
        _ => anyhow::bail!("Provide exactly one of --file or --text"),
    };

    let threshold = threshold.unwrap_or(config.matching.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("threshold must be in [0.0, 1.0]");
    }

    let pool = db::connect(config).await?;
    let outcome = ingest(&pool, owner_id, title, &body, threshold).await?;

    println!("ingested document");
    println!("  id: {}", outcome.document.id);
    println!("  owner: {}", outcome.document.owner_id);
    println!("  title: {}", outcome.document.title);
    println!("  credits remaining: {}", outcome.credits_remaining);
    println!("  matches: {}", outcome.matches.len());
    for m in &outcome.matches {
        println!(
            "    {:.2}  {}  (owner {})  {}",
            m.similarity, m.document_id, m.owner_id, m.title
        );
    }
    println!("ok");

    pool.close().await;
    Ok(())
}
