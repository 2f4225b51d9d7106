//! # Doc Scanner CLI (`docscan`)
//!
//! The `docscan` binary is the operator interface for the scanner. It
//! provides commands for database initialization, credit-account
//! management, document ingestion, match reporting, and the credit
//! request workflow.
//!
//! ## Usage
//!
//! ```bash
//! docscan --config ./config/docscan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docscan init` | Create the SQLite database and run schema migrations |
//! | `docscan account add <user>` | Open a credit account |
//! | `docscan account balance <user>` | Show a user's balance |
//! | `docscan ingest <user> <title>` | Ingest a document and report matches |
//! | `docscan matches <id>` | Show the stored match report for a document |
//! | `docscan credits ...` | Request, list, resolve, and sweep credits |
//! | `docscan stats` | Corpus and credit statistics |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use doc_scanner::{config, credits_cmd, ingest, matches, migrate, stats};

/// Doc Scanner CLI — a credit-metered document similarity scanner.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docscan.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docscan",
    about = "Doc Scanner — a credit-metered document similarity scanner",
    version,
    long_about = "Doc Scanner stores submitted plain-text documents in SQLite and compares each \
    new submission against the full corpus with Jaccard similarity over word sets, charging one \
    credit per successful ingestion. Credits are governed by a ledger with periodic resets and an \
    administrator-approved top-up workflow."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docscan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (documents, matches, scans, credit_accounts, credit_requests,
    /// admin_logs). This command is idempotent — running it multiple
    /// times is safe.
    Init,

    /// Manage credit accounts.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Ingest a document and report similar documents.
    ///
    /// Spends one credit. The document insert, the match rows, and the
    /// debit commit as one unit; on any failure nothing is persisted and
    /// no credit is spent.
    Ingest {
        /// Owner (submitting user) id.
        owner: String,

        /// Document title.
        title: String,

        /// Read the document text from this file.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Pass the document text inline.
        #[arg(long)]
        text: Option<String>,

        /// Override the configured similarity threshold (0.0–1.0).
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Show the stored match report for a document.
    Matches {
        /// Document UUID.
        id: String,
    },

    /// Credit request workflow and maintenance.
    Credits {
        #[command(subcommand)]
        action: CreditsAction,
    },

    /// Show corpus and credit statistics.
    Stats,
}

/// Account management subcommands.
#[derive(Subcommand)]
enum AccountAction {
    /// Open a credit account for a user.
    ///
    /// A no-op if the account already exists; the existing balance is
    /// left alone.
    Add {
        /// User id.
        user: String,

        /// Starting balance (defaults to `credits.initial_balance`).
        #[arg(long)]
        balance: Option<i64>,
    },

    /// Show a user's current balance.
    Balance {
        /// User id.
        user: String,
    },
}

/// Credit workflow subcommands.
#[derive(Subcommand)]
enum CreditsAction {
    /// Create a pending top-up request for a user.
    Request {
        /// User id.
        user: String,
        /// Credits requested.
        amount: i64,
    },

    /// List requests awaiting an administrator decision.
    Pending,

    /// Show a user's request history, newest first.
    History {
        /// User id.
        user: String,
    },

    /// Approve or deny a pending request.
    ///
    /// Approval credits the requester's balance in the same transaction
    /// that marks the request resolved; both decisions are audit-logged.
    Resolve {
        /// Request UUID.
        id: String,
        /// Decision: `approve` or `deny`.
        decision: String,
        /// Administrator id recorded in the audit log.
        #[arg(long)]
        admin: String,
    },

    /// Reset stale balances up to the configured floor.
    ///
    /// Applies `reset_if_stale` to every account; one account's failure
    /// is logged and does not block the rest.
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Account { action } => match action {
            AccountAction::Add { user, balance } => {
                credits_cmd::run_account_add(&cfg, &user, balance).await?;
            }
            AccountAction::Balance { user } => {
                credits_cmd::run_account_balance(&cfg, &user).await?;
            }
        },
        Commands::Ingest {
            owner,
            title,
            file,
            text,
            threshold,
        } => {
            ingest::run_ingest(&cfg, &owner, &title, file, text, threshold).await?;
        }
        Commands::Matches { id } => {
            matches::run_matches(&cfg, &id).await?;
        }
        Commands::Credits { action } => match action {
            CreditsAction::Request { user, amount } => {
                credits_cmd::run_request(&cfg, &user, amount).await?;
            }
            CreditsAction::Pending => {
                credits_cmd::run_pending(&cfg).await?;
            }
            CreditsAction::History { user } => {
                credits_cmd::run_history(&cfg, &user).await?;
            }
            CreditsAction::Resolve {
                id,
                decision,
                admin,
            } => {
                credits_cmd::run_resolve(&cfg, &id, &decision, &admin).await?;
            }
            CreditsAction::Sweep => {
                credits_cmd::run_sweep(&cfg).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
