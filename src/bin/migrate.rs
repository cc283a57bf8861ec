//! Offline social-credit migration runner.
//!
//! Usage: `migrate [db-path]` (falls back to `LOCKIN_DB_PATH`, then
//! `lockin.db`). Each step is idempotent; re-run after any failure.

use std::{env, path::PathBuf, process};

use log::error;

use lockin_ledger::{AuthState, Database, EventBus, Ledger};

#[tokio::main]
async fn main() {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("LOCKIN_DB_PATH").ok())
        .unwrap_or_else(|| "lockin.db".to_string());

    if let Err(err) = run(PathBuf::from(path)).await {
        error!("Migration failed: {err}");
        process::exit(1);
    }
}

async fn run(path: PathBuf) -> lockin_ledger::Result<()> {
    let db = Database::open(path)?;
    let ledger = Ledger::new(db, AuthState::new(), EventBus::new());
    ledger.run_migration().await
}
