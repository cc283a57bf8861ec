//! Aggregate recomputation: the offline backfill/disaster-recovery path.
//!
//! Each step is independently committed and idempotent, so an interrupted or
//! failed run can always be re-run from the top. Nothing here belongs on the
//! live request path.

use std::collections::BTreeMap;

use log::{error, info};
use serde_json::json;

use crate::{
    error::Result,
    models::{Profile, Session},
    store::{paths, FieldDelta, Query, MAX_BATCH_OPS},
};

use super::{leaderboard::session_delta, Ledger};

impl Ledger {
    /// Sets `socialCreditScore = 0` on every profile missing the field.
    /// Profiles that already carry a score are untouched, so re-running is
    /// safe. Returns the number of profiles initialized.
    pub async fn initialize_profile_scores(&self) -> Result<usize> {
        info!("Initializing profile social credit scores");

        let profiles = self.db.query(paths::PROFILES, Query::new()).await?;
        let mut batch = self.db.batch();
        let mut updated = 0;

        for doc in &profiles {
            if doc.has_field(Profile::F_SOCIAL_CREDIT_SCORE) {
                continue;
            }
            if batch.len() == MAX_BATCH_OPS {
                batch.commit().await?;
                batch = self.db.batch();
            }
            batch.update(
                paths::PROFILES,
                &doc.id,
                vec![(
                    Profile::F_SOCIAL_CREDIT_SCORE.to_string(),
                    FieldDelta::Set(json!(0)),
                )],
            )?;
            updated += 1;
        }

        if !batch.is_empty() {
            batch.commit().await?;
        }

        info!("Initialized {updated} of {} profiles", profiles.len());
        Ok(updated)
    }

    /// Recomputes `tickCount`/`crossCount`/`socialCreditDelta` for every
    /// session missing any of them by rescanning its decision set. Sessions
    /// already populated are skipped, so the routine is resumable: a partial
    /// run simply leaves some sessions for the next pass. Per-session
    /// failures are logged and the run continues.
    pub async fn backfill_session_decision_counts(&self) -> Result<usize> {
        info!("Backfilling session decision counts");

        let sessions = self.db.query(paths::SESSIONS, Query::new()).await?;
        let mut updated = 0;

        for doc in &sessions {
            if doc.has_field(Session::F_TICK_COUNT)
                && doc.has_field(Session::F_CROSS_COUNT)
                && doc.has_field(Session::F_SOCIAL_CREDIT_DELTA)
            {
                continue;
            }

            if let Err(err) = self.backfill_one_session(&doc.id).await {
                error!("Failed to backfill session {}: {err}", doc.id);
                continue;
            }
            updated += 1;
        }

        info!("Backfilled {updated} of {} sessions", sessions.len());
        Ok(updated)
    }

    async fn backfill_one_session(&self, session_id: &str) -> Result<()> {
        let (ticks, crosses) = self.decision_counts(session_id).await?;
        let delta = session_delta(ticks, crosses);
        self.db
            .update(
                paths::SESSIONS,
                session_id,
                vec![
                    (Session::F_TICK_COUNT.to_string(), FieldDelta::Set(json!(ticks))),
                    (
                        Session::F_CROSS_COUNT.to_string(),
                        FieldDelta::Set(json!(crosses)),
                    ),
                    (
                        Session::F_SOCIAL_CREDIT_DELTA.to_string(),
                        FieldDelta::Set(json!(delta)),
                    ),
                ],
            )
            .await
    }

    /// Overwrites every owner's `socialCreditScore` with the sum of
    /// `socialCreditDelta` over their sessions. This is the authoritative
    /// reconciliation: a full overwrite, never an increment, so drift from
    /// missed incremental updates is erased. Returns the number of profiles
    /// rewritten.
    pub async fn recalculate_user_scores(&self) -> Result<usize> {
        info!("Recalculating user social credit scores");

        let sessions = self.db.query(paths::SESSIONS, Query::new()).await?;
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for doc in &sessions {
            let Some(owner) = doc.str_field(Session::F_USER_ID) else {
                continue;
            };
            *totals.entry(owner.to_string()).or_insert(0) +=
                doc.i64_field(Session::F_SOCIAL_CREDIT_DELTA);
        }

        let mut batch = self.db.batch();
        let mut updated = 0;
        for (uid, score) in &totals {
            if batch.len() == MAX_BATCH_OPS {
                batch.commit().await?;
                batch = self.db.batch();
            }
            batch.update(
                paths::PROFILES,
                uid,
                vec![(
                    Profile::F_SOCIAL_CREDIT_SCORE.to_string(),
                    FieldDelta::Set(json!(score)),
                )],
            )?;
            updated += 1;
        }

        if !batch.is_empty() {
            batch.commit().await?;
        }

        info!("Updated {updated} user scores");
        Ok(updated)
    }

    /// Runs the three recomputation steps in strict sequence. A failing step
    /// aborts the remainder but leaves earlier steps committed; since every
    /// step is idempotent, re-running the whole sequence is always safe.
    pub async fn run_migration(&self) -> Result<()> {
        info!("Starting social credit migration");

        self.initialize_profile_scores().await?;
        self.backfill_session_decision_counts().await?;
        self.recalculate_user_scores().await?;

        info!("Social credit migration complete");
        Ok(())
    }
}
