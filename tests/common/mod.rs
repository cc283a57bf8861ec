#![allow(dead_code)]

use chrono::Utc;
use lockin_ledger::{paths, AuthState, Database, EventBus, Ledger, Profile, Session};

pub fn ledger() -> (Ledger, AuthState, EventBus) {
    let db = Database::open_in_memory().expect("in-memory store");
    let auth = AuthState::new();
    let events = EventBus::new();
    (
        Ledger::new(db, auth.clone(), events.clone()),
        auth,
        events,
    )
}

pub async fn seed_profile(ledger: &Ledger, uid: &str, username: &str, score: i64) {
    let profile = Profile {
        username: username.to_string(),
        username_lower: username.to_lowercase(),
        full_name: format!("{username} Example"),
        avatar_url: None,
        label: "New Member".to_string(),
        social_credit_score: score,
        created_at: Utc::now(),
    };
    ledger
        .database()
        .set(paths::PROFILES, uid, &profile)
        .await
        .expect("seed profile");
}

pub async fn seed_session(ledger: &Ledger, id: &str, owner: &str) {
    let mut session = Session::new(owner, 25);
    session.id = id.to_string();
    ledger
        .database()
        .set(paths::SESSIONS, id, &session)
        .await
        .expect("seed session");
}

pub async fn session(ledger: &Ledger, id: &str) -> Session {
    ledger
        .database()
        .get_as::<Session>(paths::SESSIONS, id)
        .await
        .expect("read session")
        .expect("session exists")
}
