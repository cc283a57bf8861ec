//! Anonymous identity plus first-run profile bootstrap.
//!
//! Identity here is deliberately opaque: signing in mints a fresh uuid, and
//! everything downstream only ever sees that string.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{LedgerError, Result},
    models::Profile,
    store::{paths, Database},
};

#[derive(Clone, Default)]
pub struct AuthState {
    current: Arc<Mutex<Option<String>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh anonymous identity and signs it in.
    pub fn sign_in_anonymously(&self) -> String {
        let uid = Uuid::new_v4().to_string();
        self.set_current(Some(uid.clone()));
        uid
    }

    /// Restores a previously minted identity (also used by tests).
    pub fn sign_in_as(&self, uid: &str) {
        self.set_current(Some(uid.to_string()));
    }

    pub fn sign_out(&self) {
        self.set_current(None);
    }

    pub fn current_user(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn require_user(&self) -> Result<String> {
        self.current_user().ok_or(LedgerError::Unauthenticated)
    }

    fn set_current(&self, uid: Option<String>) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = uid;
    }
}

pub async fn username_available(db: &Database, username: &str) -> Result<bool> {
    let lower = username.to_lowercase();
    Ok(db.get(paths::USERNAMES, &lower).await?.is_none())
}

/// Reserves the username and writes the initial profile in one transaction.
/// A name already reserved by another user surfaces as `TransactionConflict`.
pub async fn create_profile(
    db: &Database,
    uid: &str,
    username: &str,
    full_name: &str,
    avatar_url: Option<String>,
) -> Result<Profile> {
    let profile = Profile {
        username: username.to_string(),
        username_lower: username.to_lowercase(),
        full_name: full_name.to_string(),
        avatar_url,
        label: "New Member".to_string(),
        social_credit_score: 0,
        created_at: Utc::now(),
    };

    let uid = uid.to_string();
    let stored = profile.clone();
    db.transaction(move |tx| {
        if tx.get(paths::USERNAMES, &stored.username_lower)?.is_some() {
            return Err(LedgerError::TransactionConflict(format!(
                "username {} is already taken",
                stored.username
            )));
        }
        tx.set(
            paths::USERNAMES,
            &stored.username_lower,
            &json!({ "uid": uid }),
        )?;
        tx.set(paths::PROFILES, &uid, &stored)?;
        Ok(())
    })
    .await?;

    Ok(profile)
}
