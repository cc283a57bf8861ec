use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

/// One focus-session record as judged by peers.
///
/// `social_credit_delta` is not independently authoritative: it always equals
/// the net effect of the decisions currently in force on this session
/// (+1 per ticking voter, -1 per crossing voter). The count fields default to
/// zero so documents written before the backfill still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub duration_minutes: u64,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub tick_count: u64,
    #[serde(default)]
    pub cross_count: u64,
    #[serde(default)]
    pub social_credit_delta: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub const F_USER_ID: &'static str = "userId";
    pub const F_TICK_COUNT: &'static str = "tickCount";
    pub const F_CROSS_COUNT: &'static str = "crossCount";
    pub const F_SOCIAL_CREDIT_DELTA: &'static str = "socialCreditDelta";

    pub fn new(user_id: &str, duration_minutes: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: SessionStatus::Active,
            duration_minutes,
            photo_url: None,
            tick_count: 0,
            cross_count: 0,
            social_credit_delta: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let session = Session::new("user-1", 25);
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["tickCount"], 0);
        assert_eq!(value["socialCreditDelta"], 0);
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn count_fields_default_when_absent() {
        let raw = serde_json::json!({
            "id": "s1",
            "userId": "user-1",
            "status": "completed",
            "durationMinutes": 50,
            "createdAt": "2025-06-01T12:00:00Z",
        });
        let session: Session = serde_json::from_value(raw).unwrap();
        assert_eq!(session.tick_count, 0);
        assert_eq!(session.cross_count, 0);
        assert_eq!(session.social_credit_delta, 0);
    }
}
