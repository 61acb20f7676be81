//! Recompute orchestration: the callable surface the rest of the system
//! triggers after a send is logged, a reply is matched, or a pipeline
//! stage changes.
//!
//! Each recompute is one atomic read of the contact and its history, one
//! pure decision, one write. The store's write lock is held across all
//! three so a written decision is never computed from a torn snapshot.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use cadence_core::{decide, CadenceDecision, CadencePolicy, CalendarDay, ContactId};

use crate::history::send_history_of;
use crate::store::{EngagementStore, StoreError, TouchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Whether the stored record changed. False on a no-op recompute and
    /// during the schema-rollout window.
    pub updated: bool,
    pub next_engagement_date: Option<CalendarDay>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub scanned: usize,
    pub updated: usize,
}

/// The engagement cadence engine, bound to a store and a policy.
#[derive(Clone)]
pub struct CadenceEngine {
    store: EngagementStore,
    policy: CadencePolicy,
}

impl CadenceEngine {
    pub fn new(store: EngagementStore) -> Self {
        Self {
            store,
            policy: CadencePolicy::default(),
        }
    }

    pub fn with_policy(store: EngagementStore, policy: CadencePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &EngagementStore {
        &self.store
    }

    /// Read-only decision for one contact, e.g. for an on-demand
    /// "next due date" lookup. Writes nothing.
    pub async fn decide(&self, id: &ContactId) -> Result<CadenceDecision, StoreError> {
        let state = self.store.state.read().await;
        let contact = state.contact(id)?;
        let history = send_history_of(&state, contact);
        Ok(decide(contact, &history, &self.policy))
    }

    /// Recompute and persist one contact's next engagement date.
    ///
    /// Idempotent; safe to re-run at any time. During the schema-rollout
    /// window the decision is computed but not stored, reported as
    /// `updated: false`.
    pub async fn recompute(&self, id: &ContactId) -> Result<RecomputeOutcome, StoreError> {
        let mut state = self.store.state.write().await;
        let contact = state.contact(id)?.clone();
        let history = send_history_of(&state, &contact);
        let decision = decide(&contact, &history, &self.policy);

        match state.write_engagement_fields(id, &decision) {
            Ok(changed) => {
                debug!(
                    contact = %id,
                    next = ?decision.next_date,
                    purpose = ?decision.purpose,
                    updated = changed,
                    "recomputed engagement cadence"
                );
                Ok(RecomputeOutcome {
                    updated: changed,
                    next_engagement_date: decision.next_date,
                })
            }
            Err(StoreError::SchemaNotReady) => {
                debug!(contact = %id, "engagement fields not rolled out yet; decision not stored");
                Ok(RecomputeOutcome {
                    updated: false,
                    next_engagement_date: decision.next_date,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Record an outbound touch, then recompute.
    ///
    /// The touch must land even when the recompute fails, so a recompute
    /// error is downgraded to a warning here; hook callers only see touch
    /// failures.
    pub async fn recompute_after_touch(
        &self,
        id: &ContactId,
        observed: DateTime<Utc>,
    ) -> Result<TouchOutcome, StoreError> {
        let touch = self.store.record_touch(id, observed).await?;
        if let Err(e) = self.recompute(id).await {
            warn!(contact = %id, error = %e, "cadence recompute after touch failed");
        }
        Ok(touch)
    }

    /// Periodic sweep: recompute every contact, correcting any stored date
    /// that has gone stale relative to new activity.
    pub async fn sweep(&self) -> Result<SweepOutcome, StoreError> {
        let ids: Vec<ContactId> = {
            let state = self.store.state.read().await;
            state.contacts.keys().cloned().collect()
        };

        let mut out = SweepOutcome::default();
        for id in ids {
            match self.recompute(&id).await {
                Ok(res) => {
                    out.scanned += 1;
                    if res.updated {
                        out.updated += 1;
                    }
                }
                // A contact deleted mid-sweep is not the sweep's problem.
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
