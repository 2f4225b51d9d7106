//! Database statistics and health overview.
//!
//! Quick summary of what the scanner holds: document, match, and scan
//! counts, credit-request outcomes, and the most active users. Used by
//! `docscan stats` to confirm ingestions and credit workflows are
//! behaving as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-user activity row for the top-users table.
struct UserStats {
    user_id: String,
    scan_count: i64,
    approved_requests: i64,
    approved_credits: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await?;

    let total_matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches")
        .fetch_one(&pool)
        .await?;

    let total_scans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans")
        .fetch_one(&pool)
        .await?;

    let total_accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit_accounts")
        .fetch_one(&pool)
        .await?;

    let total_balance: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(balance), 0) FROM credit_accounts")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Doc Scanner — Database Stats");
    println!("============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", total_docs);
    println!("  Matches:     {}", total_matches);
    println!("  Scans:       {}", total_scans);
    println!("  Accounts:    {}", total_accounts);
    println!("  Credits:     {}", total_balance);

    // Credit request breakdown
    let request_row = sqlx::query(
        r#"
        SELECT
            COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending,
            COUNT(CASE WHEN status = 'approved' THEN 1 END) AS approved,
            COUNT(CASE WHEN status = 'denied' THEN 1 END) AS denied,
            COALESCE(SUM(CASE WHEN status = 'approved' THEN amount ELSE 0 END), 0) AS approved_total,
            AVG(CASE WHEN status = 'approved' THEN amount END) AS approved_avg
        FROM credit_requests
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let pending: i64 = request_row.get("pending");
    let approved: i64 = request_row.get("approved");
    let denied: i64 = request_row.get("denied");
    if pending + approved + denied > 0 {
        let approved_total: i64 = request_row.get("approved_total");
        let approved_avg: Option<f64> = request_row.get("approved_avg");
        println!();
        println!("  Credit requests:");
        println!("    pending:    {}", pending);
        println!("    approved:   {}  ({} credits granted)", approved, approved_total);
        println!("    denied:     {}", denied);
        if let Some(avg) = approved_avg {
            println!("    avg grant:  {:.1}", avg);
        }
    }

    // Top users by scan count
    let user_rows = sqlx::query(
        r#"
        SELECT
            a.user_id,
            COUNT(s.id) AS scan_count,
            (SELECT COUNT(*) FROM credit_requests r
             WHERE r.user_id = a.user_id AND r.status = 'approved') AS approved_requests,
            (SELECT COALESCE(SUM(amount), 0) FROM credit_requests r
             WHERE r.user_id = a.user_id AND r.status = 'approved') AS approved_credits
        FROM credit_accounts a
        LEFT JOIN scans s ON s.user_id = a.user_id
        GROUP BY a.user_id
        ORDER BY scan_count DESC, a.user_id ASC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let user_stats: Vec<UserStats> = user_rows
        .iter()
        .map(|row| UserStats {
            user_id: row.get("user_id"),
            scan_count: row.get("scan_count"),
            approved_requests: row.get("approved_requests"),
            approved_credits: row.get("approved_credits"),
        })
        .collect();

    if !user_stats.is_empty() {
        println!();
        println!("  Top users:");
        println!(
            "  {:<24} {:>6} {:>10} {:>10}",
            "USER", "SCANS", "APPROVALS", "GRANTED"
        );
        println!("  {}", "-".repeat(54));
        for u in &user_stats {
            println!(
                "  {:<24} {:>6} {:>10} {:>10}",
                u.user_id, u.scan_count, u.approved_requests, u.approved_credits
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
