use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tick is a positive judgment, cross a negative one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DecisionKind {
    Tick,
    Cross,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Tick => "tick",
            DecisionKind::Cross => "cross",
        }
    }
}

/// A single voter's judgment on a session.
///
/// At most one decision exists per (session, voter) pair; re-voting
/// overwrites it and retraction deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    pub created_at: DateTime<Utc>,
}

/// A decision paired with the voter who cast it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterDecision {
    pub uid: String,
    #[serde(flatten)]
    pub decision: Decision,
}
