//! Collection-path constructors.

pub const PROFILES: &str = "profiles";
pub const SESSIONS: &str = "sessions";
pub const USERNAMES: &str = "usernames";

/// Decision subcollection of one session, keyed by voter id.
pub fn decisions(session_id: &str) -> String {
    format!("sessions/{session_id}/decisions")
}
