mod auth;
mod error;
mod events;
mod ledger;
mod models;
mod store;

pub use auth::{create_profile, username_available, AuthState};
pub use error::{LedgerError, Result};
pub use events::{EventBus, SubscriptionId, VoteCast};
pub use ledger::{session_delta, Ledger, MAX_FRIEND_LOOKUP};
pub use models::{
    Decision, DecisionKind, LeaderboardEntry, Profile, Session, SessionStatus, VoterDecision,
};
pub use store::{
    paths, Database, Direction, Document, FieldDelta, Filter, Query, StoreTransaction, WriteBatch,
    MAX_BATCH_OPS,
};
