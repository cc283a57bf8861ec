//! Leaderboard read path over profile scores.

use log::warn;

use crate::{
    error::Result,
    models::{DecisionKind, LeaderboardEntry, Profile},
    store::{paths, Direction, Document, Filter, Query},
};

use super::Ledger;

/// Most ids a friend-leaderboard lookup will fetch. Callers with more
/// friends than this silently receive a truncated result; paging past the
/// cap is a known limitation.
pub const MAX_FRIEND_LOOKUP: usize = 30;

/// Net session delta implied by its tallies.
pub fn session_delta(tick_count: u64, cross_count: u64) -> i64 {
    tick_count as i64 - cross_count as i64
}

impl Ledger {
    /// Top `limit` profiles by score, descending. The order of profiles with
    /// equal scores is not deterministic.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let docs = self
            .db
            .query(
                paths::PROFILES,
                Query::new()
                    .order_by(Profile::F_SOCIAL_CREDIT_SCORE, Direction::Descending)
                    .limit(limit),
            )
            .await?;
        Ok(docs.iter().map(entry_from_document).collect())
    }

    /// Profiles for `friend_ids` plus the caller, deduplicated and capped at
    /// [`MAX_FRIEND_LOOKUP`], sorted by score descending. Missing profiles
    /// are skipped.
    pub async fn friend_leaderboard(
        &self,
        friend_ids: &[String],
        self_id: &str,
    ) -> Result<Vec<LeaderboardEntry>> {
        let mut ids: Vec<&str> = Vec::with_capacity(friend_ids.len() + 1);
        for id in friend_ids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self_id))
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids.truncate(MAX_FRIEND_LOOKUP);

        let mut entries = Vec::with_capacity(ids.len());
        for uid in ids {
            match self.db.get(paths::PROFILES, uid).await? {
                Some(doc) => entries.push(entry_from_document(&doc)),
                None => warn!("friend leaderboard: no profile for {uid}"),
            }
        }

        entries.sort_by(|a, b| b.social_credit_score.cmp(&a.social_credit_score));
        Ok(entries)
    }

    /// 1-indexed global rank: one plus the number of profiles with a strictly
    /// greater score. Linear in the number of profiles, which is acceptable
    /// at current scale only.
    pub async fn user_rank(&self, user_id: &str) -> Result<u64> {
        let score = self.user_social_credit(user_id).await?;
        let higher = self
            .db
            .query(
                paths::PROFILES,
                Query::new().filter(Filter::GreaterThan(
                    Profile::F_SOCIAL_CREDIT_SCORE.to_string(),
                    score,
                )),
            )
            .await?;
        Ok(higher.len() as u64 + 1)
    }

    /// A user's current score; zero when the profile or field is absent.
    pub async fn user_social_credit(&self, user_id: &str) -> Result<i64> {
        Ok(self
            .db
            .get(paths::PROFILES, user_id)
            .await?
            .map(|doc| doc.i64_field(Profile::F_SOCIAL_CREDIT_SCORE))
            .unwrap_or(0))
    }

    /// Tick and cross tallies recomputed from the raw decision set.
    pub async fn decision_counts(&self, session_id: &str) -> Result<(u64, u64)> {
        let decisions = self.session_decisions(session_id).await?;
        let ticks = decisions
            .iter()
            .filter(|entry| entry.decision.kind == DecisionKind::Tick)
            .count() as u64;
        let crosses = decisions.len() as u64 - ticks;
        Ok((ticks, crosses))
    }
}

fn entry_from_document(doc: &Document) -> LeaderboardEntry {
    LeaderboardEntry {
        uid: doc.id.clone(),
        username: doc.str_field("username").unwrap_or_default().to_string(),
        full_name: doc.str_field("fullName").unwrap_or_default().to_string(),
        avatar_url: doc.str_field("avatarUrl").map(str::to_string),
        social_credit_score: doc.i64_field(Profile::F_SOCIAL_CREDIT_SCORE),
    }
}
