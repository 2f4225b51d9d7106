//! CLI-facing wrappers for account and credit commands.
//!
//! Thin orchestration over [`crate::ledger`]: open the pool, call the
//! ledger operation, print a human-readable summary. All policy lives in
//! the ledger itself.

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::db;
use crate::ledger;
use crate::models::{CreditRequest, Decision};

pub async fn run_account_add(config: &Config, user_id: &str, balance: Option<i64>) -> Result<()> {
    let pool = db::connect(config).await?;

    let initial = balance.unwrap_or(config.credits.initial_balance);
    let created = ledger::open_account(&pool, user_id, initial).await?;
    if created {
        println!("account created");
        println!("  user: {}", user_id);
        println!("  balance: {}", initial);
    } else {
        println!("account already exists: {}", user_id);
    }

    pool.close().await;
    Ok(())
}

pub async fn run_account_balance(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let balance = ledger::balance(&pool, user_id).await?;
    println!("  user: {}", user_id);
    println!("  balance: {}", balance);
    pool.close().await;
    Ok(())
}

pub async fn run_request(config: &Config, user_id: &str, amount: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let request = ledger::request_credit(&pool, user_id, amount).await?;
    println!("credit request created");
    println!("  id: {}", request.id);
    println!("  user: {}", request.user_id);
    println!("  amount: {}", request.amount);
    println!("  status: {}", request.status.as_str());
    pool.close().await;
    Ok(())
}

pub async fn run_pending(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let requests = ledger::pending_requests(&pool).await?;
    print_requests(&requests);
    pool.close().await;
    Ok(())
}

pub async fn run_history(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let requests = ledger::request_history(&pool, user_id).await?;
    print_requests(&requests);
    pool.close().await;
    Ok(())
}

pub async fn run_resolve(
    config: &Config,
    request_id: &str,
    decision: &str,
    admin_id: &str,
) -> Result<()> {
    let decision = match decision {
        "approve" => Decision::Approve,
        "deny" => Decision::Deny,
        other => anyhow::bail!("Unknown decision: '{}'. Use approve or deny.", other),
    };

    let pool = db::connect(config).await?;
    let resolved = ledger::resolve_credit_request(&pool, request_id, decision, admin_id).await?;
    println!("request resolved");
    println!("  id: {}", resolved.id);
    println!("  status: {}", resolved.status.as_str());
    if decision == Decision::Approve {
        let balance = ledger::balance(&pool, &resolved.user_id).await?;
        println!("  user balance: {}", balance);
    }
    pool.close().await;
    Ok(())
}

pub async fn run_sweep(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let now = Utc::now().timestamp();
    let period_secs = config.credits.reset_period_hours * 60 * 60;
    let count =
        ledger::sweep_stale_accounts(&pool, now, period_secs, config.credits.reset_floor).await?;
    println!("credit sweep");
    println!("  accounts reset: {}", count);
    println!("ok");
    pool.close().await;
    Ok(())
}

fn print_requests(requests: &[CreditRequest]) {
    if requests.is_empty() {
        println!("No requests.");
        return;
    }
    println!(
        "  {:<38} {:<12} {:>8}  {:<10}",
        "ID", "USER", "AMOUNT", "STATUS"
    );
    for r in requests {
        println!(
            "  {:<38} {:<12} {:>8}  {:<10}",
            r.id,
            r.user_id,
            r.amount,
            r.status.as_str()
        );
    }
}
