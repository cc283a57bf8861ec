mod decision;
mod profile;
mod session;

pub use decision::{Decision, DecisionKind, VoterDecision};
pub use profile::{LeaderboardEntry, Profile};
pub use session::{Session, SessionStatus};
