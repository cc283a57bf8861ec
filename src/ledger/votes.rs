//! Vote-transition engine.
//!
//! A cast, re-vote, or retraction touches three records — the decision, the
//! session tallies, and the owner's profile score — and all of them move in
//! one store transaction. The engine never splits that update and never
//! retries conflicts itself.

use chrono::Utc;
use log::info;

use crate::{
    error::{LedgerError, Result},
    events::VoteCast,
    models::{Decision, DecisionKind, Profile, Session, VoterDecision},
    store::{paths, FieldDelta, Query},
};

use super::Ledger;

/// Net score change for a voter moving from `previous` to `next`.
pub(crate) fn delta_change(previous: Option<DecisionKind>, next: DecisionKind) -> i64 {
    match (previous, next) {
        (None, DecisionKind::Tick) => 1,
        (None, DecisionKind::Cross) => -1,
        (Some(DecisionKind::Tick), DecisionKind::Cross) => -2,
        (Some(DecisionKind::Cross), DecisionKind::Tick) => 2,
        (Some(DecisionKind::Tick), DecisionKind::Tick)
        | (Some(DecisionKind::Cross), DecisionKind::Cross) => 0,
    }
}

impl Ledger {
    /// Casts or changes the signed-in voter's decision on a session.
    ///
    /// Re-voting the same kind re-affirms the decision record and changes no
    /// tallies (idempotent). Fails `Unauthenticated` when signed out and
    /// `NotFound` when the session does not exist.
    pub async fn cast(&self, session_id: &str, kind: DecisionKind) -> Result<()> {
        let voter = self.auth.require_user()?;
        let session_id = session_id.to_string();
        let decisions = paths::decisions(&session_id);
        let sid = session_id.clone();

        let owner = self
            .db
            .transaction(move |tx| {
                let previous = tx
                    .get(&decisions, &voter)?
                    .map(|doc| doc.deserialize::<Decision>())
                    .transpose()?
                    .map(|decision| decision.kind);

                let session = tx
                    .get(paths::SESSIONS, &sid)?
                    .ok_or_else(|| LedgerError::NotFound(format!("session {sid}")))?;
                let owner = session
                    .str_field(Session::F_USER_ID)
                    .unwrap_or_default()
                    .to_string();

                let decision = Decision {
                    kind,
                    created_at: Utc::now(),
                };
                tx.set(&decisions, &voter, &decision)?;

                if previous == Some(kind) {
                    // Same vote again: nothing to re-count.
                    return Ok(owner);
                }

                let mut deltas: Vec<(String, FieldDelta)> = Vec::new();
                match previous {
                    Some(DecisionKind::Tick) => {
                        deltas.push((Session::F_TICK_COUNT.to_string(), FieldDelta::Increment(-1)))
                    }
                    Some(DecisionKind::Cross) => {
                        deltas.push((Session::F_CROSS_COUNT.to_string(), FieldDelta::Increment(-1)))
                    }
                    None => {}
                }
                match kind {
                    DecisionKind::Tick => {
                        deltas.push((Session::F_TICK_COUNT.to_string(), FieldDelta::Increment(1)))
                    }
                    DecisionKind::Cross => {
                        deltas.push((Session::F_CROSS_COUNT.to_string(), FieldDelta::Increment(1)))
                    }
                }

                let change = delta_change(previous, kind);
                deltas.push((
                    Session::F_SOCIAL_CREDIT_DELTA.to_string(),
                    FieldDelta::Increment(change),
                ));
                tx.update(paths::SESSIONS, &sid, deltas)?;

                if change != 0 {
                    tx.update(
                        paths::PROFILES,
                        &owner,
                        vec![(
                            Profile::F_SOCIAL_CREDIT_SCORE.to_string(),
                            FieldDelta::Increment(change),
                        )],
                    )?;
                }

                Ok(owner)
            })
            .await?;

        info!("vote cast on session {session_id}: {}", kind.as_str());
        self.events.emit(&VoteCast {
            session_id,
            session_owner_id: owner,
        });
        Ok(())
    }

    /// Removes the signed-in voter's decision, if any. Retracting when no
    /// decision exists is a no-op, not an error.
    pub async fn retract(&self, session_id: &str) -> Result<()> {
        let voter = self.auth.require_user()?;
        let session_id = session_id.to_string();
        let decisions = paths::decisions(&session_id);
        let sid = session_id.clone();

        let outcome = self
            .db
            .transaction(move |tx| {
                let Some(doc) = tx.get(&decisions, &voter)? else {
                    return Ok(None);
                };
                let existing = doc.deserialize::<Decision>()?;

                let session = tx
                    .get(paths::SESSIONS, &sid)?
                    .ok_or_else(|| LedgerError::NotFound(format!("session {sid}")))?;
                let owner = session
                    .str_field(Session::F_USER_ID)
                    .unwrap_or_default()
                    .to_string();

                tx.delete(&decisions, &voter)?;

                let (counter, change) = match existing.kind {
                    DecisionKind::Tick => (Session::F_TICK_COUNT, -1),
                    DecisionKind::Cross => (Session::F_CROSS_COUNT, 1),
                };
                tx.update(
                    paths::SESSIONS,
                    &sid,
                    vec![
                        (counter.to_string(), FieldDelta::Increment(-1)),
                        (
                            Session::F_SOCIAL_CREDIT_DELTA.to_string(),
                            FieldDelta::Increment(change),
                        ),
                    ],
                )?;
                tx.update(
                    paths::PROFILES,
                    &owner,
                    vec![(
                        Profile::F_SOCIAL_CREDIT_SCORE.to_string(),
                        FieldDelta::Increment(change),
                    )],
                )?;

                Ok(Some(owner))
            })
            .await?;

        if let Some(owner) = outcome {
            info!("vote retracted on session {session_id}");
            self.events.emit(&VoteCast {
                session_id,
                session_owner_id: owner,
            });
        }
        Ok(())
    }

    /// The signed-in voter's current decision on a session, if any. Returns
    /// `None` when signed out rather than erroring, matching the read path's
    /// softer contract.
    pub async fn current_user_decision(&self, session_id: &str) -> Result<Option<DecisionKind>> {
        let Some(voter) = self.auth.current_user() else {
            return Ok(None);
        };
        let doc = self.db.get(&paths::decisions(session_id), &voter).await?;
        Ok(doc
            .map(|doc| doc.deserialize::<Decision>())
            .transpose()?
            .map(|decision| decision.kind))
    }

    /// Every decision currently in force on a session, with voter ids.
    pub async fn session_decisions(&self, session_id: &str) -> Result<Vec<VoterDecision>> {
        let docs = self
            .db
            .query(&paths::decisions(session_id), Query::new())
            .await?;
        docs.into_iter()
            .map(|doc| {
                let decision = doc.deserialize::<Decision>()?;
                Ok(VoterDecision {
                    uid: doc.id,
                    decision,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DecisionKind::{Cross, Tick};

    #[test]
    fn transition_table() {
        assert_eq!(delta_change(None, Tick), 1);
        assert_eq!(delta_change(None, Cross), -1);
        assert_eq!(delta_change(Some(Tick), Cross), -2);
        assert_eq!(delta_change(Some(Cross), Tick), 2);
        assert_eq!(delta_change(Some(Tick), Tick), 0);
        assert_eq!(delta_change(Some(Cross), Cross), 0);
    }

    #[test]
    fn change_of_vote_is_reversible() {
        // tick -> cross -> tick nets to the original +1.
        let first = delta_change(None, Tick);
        let flip = delta_change(Some(Tick), Cross);
        let back = delta_change(Some(Cross), Tick);
        assert_eq!(first + flip + back, 1);
    }
}
