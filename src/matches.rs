//! Stored match retrieval.
//!
//! Read path over the `matches` table: the ranked report persisted when
//! a document was ingested, re-joined with document metadata for
//! display.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::error::EngineError;
use crate::models::RankedMatch;

/// Ranked matches persisted for `document_id`, best first.
///
/// Ordering mirrors the ranker: descending similarity, insertion order
/// on ties.
pub async fn get_matches(
    pool: &SqlitePool,
    document_id: &str,
) -> std::result::Result<Vec<RankedMatch>, EngineError> {
    let rows = sqlx::query(
        r#"
        SELECT d.id, d.title, d.owner_id, m.similarity
        FROM matches m
        JOIN documents d ON m.matched_document_id = d.id
        WHERE m.document_id = ?
        ORDER BY m.similarity DESC, m.rowid ASC
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| RankedMatch {
            document_id: row.get("id"),
            title: row.get("title"),
            owner_id: row.get("owner_id"),
            similarity: row.get("similarity"),
        })
        .collect())
}

/// Run the `matches` command: print the stored report for a document.
pub async fn run_matches(config: &Config, document_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM documents WHERE id = ?")
        .bind(document_id)
        .fetch_one(&pool)
        .await?;
    if !exists {
        pool.close().await;
        anyhow::bail!("Document not found: {}", document_id);
    }

    let matches = get_matches(&pool, document_id).await?;

    if matches.is_empty() {
        println!("No matches.");
    } else {
        println!("matches for {}", document_id);
        for m in &matches {
            println!(
                "  {:.2}  {}  (owner {})  {}",
                m.similarity, m.document_id, m.owner_id, m.title
            );
        }
    }

    pool.close().await;
    Ok(())
}
