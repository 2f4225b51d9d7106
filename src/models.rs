//! Core data models for the document scanner.
//!
//! These types represent the documents, matches, and credit records that
//! flow through the ingestion and ledger pipelines. Timestamps are Unix
//! seconds (`i64`); identities are UUID v4 strings.

use serde::Serialize;

/// A submitted document, immutable once persisted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub body: String,
    pub created_at: i64,
}

/// A ranked similarity match, reported from the ingested document's
/// perspective. `similarity` is rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub document_id: String,
    pub title: String,
    pub owner_id: String,
    pub similarity: f64,
}

/// Per-user spendable balance. `balance` never goes below zero at any
/// committed state.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreditAccount {
    pub user_id: String,
    pub balance: i64,
    pub last_reset_at: i64,
}

/// Lifecycle state of a [`CreditRequest`]. `Pending` transitions exactly
/// once to `Approved` or `Denied`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "denied" => Some(RequestStatus::Denied),
            _ => None,
        }
    }
}

/// A user's request for additional credits, resolved by an administrator.
#[derive(Debug, Clone)]
pub struct CreditRequest {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub status: RequestStatus,
    pub requested_at: i64,
    pub processed_at: Option<i64>,
}

/// Administrator decision applied to a pending [`CreditRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// Terminal status this decision moves the request to.
    pub fn status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Deny => RequestStatus::Denied,
        }
    }

    /// Action label recorded in the audit log.
    pub fn action(&self) -> &'static str {
        match self {
            Decision::Approve => "credit_approval",
            Decision::Deny => "credit_denial",
        }
    }
}
