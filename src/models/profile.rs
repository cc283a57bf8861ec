use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user profile document.
///
/// `social_credit_score` is the running sum of `socialCreditDelta` across
/// every session the user owns. It is derived, never edited directly: the
/// vote engine maintains it transactionally and the migration routine is the
/// one authoritative recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub username_lower: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub label: String,
    #[serde(default)]
    pub social_credit_score: i64,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub const F_SOCIAL_CREDIT_SCORE: &'static str = "socialCreditScore";
}

/// Read-model row for the leaderboard views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub uid: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub social_credit_score: i64,
}
