//! The social-credit ledger: vote transitions, leaderboard reads, and the
//! offline recomputation path, all against one document store.

mod leaderboard;
mod migration;
mod votes;

pub use leaderboard::{session_delta, MAX_FRIEND_LOOKUP};

use crate::{auth::AuthState, events::EventBus, store::Database};

#[derive(Clone)]
pub struct Ledger {
    db: Database,
    auth: AuthState,
    events: EventBus,
}

impl Ledger {
    pub fn new(db: Database, auth: AuthState, events: EventBus) -> Self {
        Self { db, auth, events }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
