//! # Doc Scanner
//!
//! A credit-metered document similarity scanner.
//!
//! Registered users spend credits to submit plain-text documents; each
//! submission is compared against every previously stored document and
//! returns a ranked list of near-duplicates. Credit consumption is tied
//! atomically to successful ingestion: the document insert, the match
//! rows, and the one-credit debit commit together or not at all.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────────┐   ┌──────────┐
//! │  Caller  │──▶│   Ingestion Coordinator    │──▶│  SQLite   │
//! │  (CLI)   │   │ credit check → insert doc  │   │ documents │
//! └──────────┘   │ → rank corpus → insert     │   │ matches   │
//!                │ matches → debit → commit   │   │ ledger    │
//!                └─────────────┬─────────────┘   └──────────┘
//!                              │
//!                   ┌──────────┴──────────┐
//!                   ▼                     ▼
//!              ┌─────────┐          ┌──────────┐
//!              │ Ranker  │          │  Ledger  │
//!              │ (Jaccard)│         │ (credits)│
//!              └─────────┘          └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`tokenize`] | Text normalization into token sets |
//! | [`similarity`] | Jaccard scorer and Levenshtein distance |
//! | [`rank`] | Corpus-wide match ranking |
//! | [`ledger`] | Credit accounts, resets, and request workflow |
//! | [`ingest`] | Transactional document ingestion |
//! | [`matches`] | Stored match retrieval |
//! | [`stats`] | Database statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod credits_cmd;
pub mod db;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod matches;
pub mod migrate;
pub mod models;
pub mod rank;
pub mod similarity;
pub mod stats;
pub mod tokenize;
