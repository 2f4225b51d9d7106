//! Per-user credit ledger.
//!
//! Balances move only through [`debit`] and [`credit`], each a single
//! guarded UPDATE so concurrent mutations on the same user serialize in
//! the store. The credit-request workflow (request → administrator
//! approve/deny → audit log) runs inside one transaction per resolution;
//! any failure rolls the whole resolution back, leaving the request
//! pending and the balance untouched.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{CreditAccount, CreditRequest, Decision, RequestStatus};

/// Default interval between stale-balance resets.
pub const DEFAULT_RESET_PERIOD_SECS: i64 = 24 * 60 * 60;

/// Default balance floor restored by a reset.
pub const DEFAULT_RESET_FLOOR: i64 = 20;

/// Create a credit account for `user_id` if none exists.
///
/// Returns `true` when a row was created, `false` when the account
/// already existed (the existing balance is left alone).
pub async fn open_account(pool: &SqlitePool, user_id: &str, initial_balance: i64) -> Result<bool> {
    if initial_balance < 0 {
        return Err(EngineError::MalformedInput(
            "initial balance must not be negative",
        ));
    }

    let now = Utc::now().timestamp();
    let result = sqlx::query(
        r#"
        INSERT INTO credit_accounts (user_id, balance, last_reset_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(initial_balance)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch the full account row, if the user has one.
pub async fn account(pool: &SqlitePool, user_id: &str) -> Result<Option<CreditAccount>> {
    let account = sqlx::query_as::<_, CreditAccount>(
        "SELECT user_id, balance, last_reset_at FROM credit_accounts WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Current spendable balance for `user_id`.
pub async fn balance(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM credit_accounts WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    balance.ok_or_else(|| EngineError::AccountNotFound(user_id.to_string()))
}

/// Atomically subtract `amount` from the user's balance.
///
/// The predicate `balance >= amount` lives in the UPDATE itself, so a
/// concurrent spender can never push the balance below zero.
pub async fn debit(pool: &SqlitePool, user_id: &str, amount: i64) -> Result<()> {
    if amount < 1 {
        return Err(EngineError::MalformedInput("debit amount must be >= 1"));
    }

    let result = sqlx::query(
        "UPDATE credit_accounts SET balance = balance - ?2 WHERE user_id = ?1 AND balance >= ?2",
    )
    .bind(user_id)
    .bind(amount)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish a missing account from a short balance.
        balance(pool, user_id).await?;
        return Err(EngineError::InsufficientCredit);
    }

    Ok(())
}

/// Atomically add `amount` to the user's balance. No upper bound.
pub async fn credit(pool: &SqlitePool, user_id: &str, amount: i64) -> Result<()> {
    if amount < 1 {
        return Err(EngineError::MalformedInput("credit amount must be >= 1"));
    }

    let result =
        sqlx::query("UPDATE credit_accounts SET balance = balance + ?2 WHERE user_id = ?1")
            .bind(user_id)
            .bind(amount)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::AccountNotFound(user_id.to_string()));
    }

    Ok(())
}

/// Restore the user's balance to at least `floor` when the last reset is
/// `period_secs` or more in the past.
///
/// A single guarded UPDATE: the staleness check, the `max(balance,
/// floor)` raise, and the timestamp bump are one atomic unit. Returns
/// `true` when the account was reset, `false` when it was still fresh.
pub async fn reset_if_stale(
    pool: &SqlitePool,
    user_id: &str,
    now: i64,
    period_secs: i64,
    floor: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE credit_accounts
        SET balance = MAX(balance, ?3), last_reset_at = ?2
        WHERE user_id = ?1 AND ?2 - last_reset_at >= ?4
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(floor)
    .bind(period_secs)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(true);
    }

    // No-op for a fresh account; missing accounts are still an error.
    balance(pool, user_id).await?;
    Ok(false)
}

/// Run [`reset_if_stale`] across every account.
///
/// Each user's reset is an independent atomic unit: a failure on one
/// user is logged and does not block the rest of the sweep. Returns the
/// number of accounts actually reset.
pub async fn sweep_stale_accounts(
    pool: &SqlitePool,
    now: i64,
    period_secs: i64,
    floor: i64,
) -> Result<u64> {
    let user_ids: Vec<String> = sqlx::query_scalar("SELECT user_id FROM credit_accounts")
        .fetch_all(pool)
        .await?;

    let mut reset_count = 0u64;
    for user_id in &user_ids {
        match reset_if_stale(pool, user_id, now, period_secs, floor).await {
            Ok(true) => reset_count += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "credit reset failed, continuing sweep");
            }
        }
    }

    Ok(reset_count)
}

/// Create a pending credit request for `user_id`.
pub async fn request_credit(pool: &SqlitePool, user_id: &str, amount: i64) -> Result<CreditRequest> {
    if amount < 1 {
        return Err(EngineError::MalformedInput("request amount must be >= 1"));
    }

    // The request must belong to an existing account.
    balance(pool, user_id).await?;

    let request = CreditRequest {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        amount,
        status: RequestStatus::Pending,
        requested_at: Utc::now().timestamp(),
        processed_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO credit_requests (id, user_id, amount, status, requested_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.id)
    .bind(&request.user_id)
    .bind(request.amount)
    .bind(request.status.as_str())
    .bind(request.requested_at)
    .execute(pool)
    .await?;

    Ok(request)
}

/// All requests still awaiting an administrator decision, oldest first.
pub async fn pending_requests(pool: &SqlitePool) -> Result<Vec<CreditRequest>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, amount, status, requested_at, processed_at
        FROM credit_requests
        WHERE status = 'pending'
        ORDER BY requested_at ASC, rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(request_from_row).collect()
}

/// A user's full request history, newest first.
pub async fn request_history(pool: &SqlitePool, user_id: &str) -> Result<Vec<CreditRequest>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, amount, status, requested_at, processed_at
        FROM credit_requests
        WHERE user_id = ?
        ORDER BY requested_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(request_from_row).collect()
}

/// Resolve a pending credit request in one transaction.
///
/// Verifies the request is still pending, marks it resolved, applies the
/// balance increment on approval, and writes the audit row. Any failure
/// rolls the whole unit back: the request stays pending and the balance
/// is unchanged.
pub async fn resolve_credit_request(
    pool: &SqlitePool,
    request_id: &str,
    decision: Decision,
    admin_id: &str,
) -> Result<CreditRequest> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        SELECT id, user_id, amount, status, requested_at, processed_at
        FROM credit_requests
        WHERE id = ?
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Err(EngineError::RequestNotFound(request_id.to_string()));
    };
    let request = request_from_row(&row)?;

    if request.status != RequestStatus::Pending {
        return Err(EngineError::RequestAlreadyResolved(request_id.to_string()));
    }

    let now = Utc::now().timestamp();
    let status = decision.status();

    sqlx::query("UPDATE credit_requests SET status = ?, processed_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

    if decision == Decision::Approve {
        let result =
            sqlx::query("UPDATE credit_accounts SET balance = balance + ?2 WHERE user_id = ?1")
                .bind(&request.user_id)
                .bind(request.amount)
                .execute(&mut *tx)
                .await?;

        // Dropping the transaction here rolls the status flip back too.
        if result.rows_affected() == 0 {
            return Err(EngineError::AccountNotFound(request.user_id));
        }
    }

    let details = serde_json::json!({
        "request_id": &request.id,
        "user_id": &request.user_id,
        "amount": request.amount,
    })
    .to_string();

    sqlx::query("INSERT INTO admin_logs (admin_id, action, details, logged_at) VALUES (?, ?, ?, ?)")
        .bind(admin_id)
        .bind(decision.action())
        .bind(&details)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(CreditRequest {
        status,
        processed_at: Some(now),
        ..request
    })
}

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CreditRequest> {
    let status_str: String = row.get("status");
    let status = RequestStatus::parse(&status_str).ok_or_else(|| {
        EngineError::StoreUnavailable(sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown request status '{}'", status_str).into(),
        })
    })?;

    Ok(CreditRequest {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        status,
        requested_at: row.get("requested_at"),
        processed_at: row.get("processed_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn test_pool() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("test.sqlite");
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
                .unwrap()
                .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        (tmp, pool)
    }

    #[tokio::test]
    async fn test_open_account_and_balance() {
        let (_tmp, pool) = test_pool().await;

        assert!(open_account(&pool, "alice", 20).await.unwrap());
        assert_eq!(balance(&pool, "alice").await.unwrap(), 20);

        // Second open is a no-op and keeps the existing balance.
        assert!(!open_account(&pool, "alice", 5).await.unwrap());
        assert_eq!(balance(&pool, "alice").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_balance_missing_account() {
        let (_tmp, pool) = test_pool().await;
        let err = balance(&pool, "ghost").await.unwrap_err();
        assert!(matches!(err, EngineError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_debit_and_credit() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 10).await.unwrap();

        debit(&pool, "alice", 3).await.unwrap();
        assert_eq!(balance(&pool, "alice").await.unwrap(), 7);

        credit(&pool, "alice", 5).await.unwrap();
        assert_eq!(balance(&pool, "alice").await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_debit_insufficient() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 2).await.unwrap();

        let err = debit(&pool, "alice", 3).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientCredit));
        // Balance untouched.
        assert_eq!(balance(&pool, "alice").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_debit_missing_account() {
        let (_tmp, pool) = test_pool().await;
        let err = debit(&pool, "ghost", 1).await.unwrap_err();
        assert!(matches!(err, EngineError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_reset_if_stale_raises_low_balance() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 5).await.unwrap();

        // Push last_reset_at 25 hours into the past.
        let now = Utc::now().timestamp();
        sqlx::query("UPDATE credit_accounts SET last_reset_at = ? WHERE user_id = 'alice'")
            .bind(now - 25 * 3600)
            .execute(&pool)
            .await
            .unwrap();

        let reset = reset_if_stale(&pool, "alice", now, DEFAULT_RESET_PERIOD_SECS, 20)
            .await
            .unwrap();
        assert!(reset);
        assert_eq!(balance(&pool, "alice").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_reset_if_stale_keeps_high_balance_updates_timestamp() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "bob", 30).await.unwrap();

        let now = Utc::now().timestamp();
        sqlx::query("UPDATE credit_accounts SET last_reset_at = ? WHERE user_id = 'bob'")
            .bind(now - 25 * 3600)
            .execute(&pool)
            .await
            .unwrap();

        let reset = reset_if_stale(&pool, "bob", now, DEFAULT_RESET_PERIOD_SECS, 20)
            .await
            .unwrap();
        assert!(reset);

        let acct = account(&pool, "bob").await.unwrap().unwrap();
        assert_eq!(acct.balance, 30);
        assert_eq!(acct.last_reset_at, now);
    }

    #[tokio::test]
    async fn test_reset_if_stale_fresh_account_noop() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "carol", 3).await.unwrap();

        let now = Utc::now().timestamp();
        let reset = reset_if_stale(&pool, "carol", now, DEFAULT_RESET_PERIOD_SECS, 20)
            .await
            .unwrap();
        assert!(!reset);
        assert_eq!(balance(&pool, "carol").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sweep_resets_only_stale_accounts() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "stale", 5).await.unwrap();
        open_account(&pool, "fresh", 5).await.unwrap();

        let now = Utc::now().timestamp();
        sqlx::query("UPDATE credit_accounts SET last_reset_at = ? WHERE user_id = 'stale'")
            .bind(now - 25 * 3600)
            .execute(&pool)
            .await
            .unwrap();

        let count = sweep_stale_accounts(&pool, now, DEFAULT_RESET_PERIOD_SECS, 20)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(balance(&pool, "stale").await.unwrap(), 20);
        assert_eq!(balance(&pool, "fresh").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_request_credit_pending() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 0).await.unwrap();

        let request = request_credit(&pool, "alice", 15).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.amount, 15);
        assert!(request.processed_at.is_none());

        let pending = pending_requests(&pool).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, request.id);
    }

    #[tokio::test]
    async fn test_request_credit_rejects_bad_amount_and_missing_account() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 0).await.unwrap();

        let err = request_credit(&pool, "alice", 0).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));

        let err = request_credit(&pool, "ghost", 5).await.unwrap_err();
        assert!(matches!(err, EngineError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_approve_credits_balance_and_logs() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 2).await.unwrap();
        let request = request_credit(&pool, "alice", 10).await.unwrap();

        let resolved = resolve_credit_request(&pool, &request.id, Decision::Approve, "admin-1")
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Approved);
        assert!(resolved.processed_at.is_some());
        assert_eq!(balance(&pool, "alice").await.unwrap(), 12);

        let log_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin_logs WHERE action = 'credit_approval'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(log_count, 1);
    }

    #[tokio::test]
    async fn test_resolve_deny_leaves_balance_and_logs() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 2).await.unwrap();
        let request = request_credit(&pool, "alice", 10).await.unwrap();

        let resolved = resolve_credit_request(&pool, &request.id, Decision::Deny, "admin-1")
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Denied);
        assert_eq!(balance(&pool, "alice").await.unwrap(), 2);

        let log_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin_logs WHERE action = 'credit_denial'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(log_count, 1);
    }

    #[tokio::test]
    async fn test_resolve_twice_fails_and_credits_once() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 0).await.unwrap();
        let request = request_credit(&pool, "alice", 10).await.unwrap();

        resolve_credit_request(&pool, &request.id, Decision::Approve, "admin-1")
            .await
            .unwrap();
        let err = resolve_credit_request(&pool, &request.id, Decision::Approve, "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RequestAlreadyResolved(_)));

        // Balance changed exactly once.
        assert_eq!(balance(&pool, "alice").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_resolve_missing_request() {
        let (_tmp, pool) = test_pool().await;
        let err = resolve_credit_request(&pool, "no-such-id", Decision::Deny, "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RequestNotFound(_)));
    }

    #[tokio::test]
    async fn test_request_history_newest_first() {
        let (_tmp, pool) = test_pool().await;
        open_account(&pool, "alice", 0).await.unwrap();

        let first = request_credit(&pool, "alice", 1).await.unwrap();
        let second = request_credit(&pool, "alice", 2).await.unwrap();
        resolve_credit_request(&pool, &first.id, Decision::Deny, "admin-1")
            .await
            .unwrap();

        let history = request_history(&pool, "alice").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
        assert_eq!(history[1].status, RequestStatus::Denied);
    }
}
