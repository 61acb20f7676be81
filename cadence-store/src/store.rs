//! Engagement store: contact records plus the append-only activity log,
//! held in memory behind an `RwLock` with an optional JSON snapshot on disk.
//!
//! Also home of the two write-side engine contracts: the schema-rollout
//! tolerant persistence adapter and the monotonic touch recorder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use cadence_core::{
    ActivityId, CadenceDecision, ContactEngagementState, ContactId, ManualReminder,
    OutboundActivity, PipelineSnapshot,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("contact not found: {0}")]
    NotFound(ContactId),
    #[error("activity not found: {0:?}")]
    ActivityNotFound(ActivityId),
    /// The engagement columns have not been rolled out to this storage
    /// node yet. Expected during a mixed-version deploy; only the
    /// persistence adapter swallows it.
    #[error("engagement fields not present in storage yet")]
    SchemaNotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub updated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchOutcome {
    pub updated: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub(crate) contacts: HashMap<ContactId, ContactEngagementState>,
    /// Append-only; rows are only ever mutated to attach a matched reply.
    pub(crate) activities: Vec<OutboundActivity>,
    /// False while the engagement columns are still rolling out.
    pub(crate) engagement_fields_ready: bool,
}

impl StoreState {
    pub(crate) fn contact(&self, id: &ContactId) -> Result<&ContactEngagementState, StoreError> {
        self.contacts
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Write the engine's outcome onto the contact record. A null decision
    /// clears both fields. Returns whether the record actually changed.
    pub(crate) fn write_engagement_fields(
        &mut self,
        id: &ContactId,
        decision: &CadenceDecision,
    ) -> Result<bool, StoreError> {
        let contact = self
            .contacts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !self.engagement_fields_ready {
            return Err(StoreError::SchemaNotReady);
        }

        let purpose = if decision.next_date.is_some() {
            decision.purpose
        } else {
            None
        };
        let changed = contact.next_engagement_date != decision.next_date
            || contact.next_engagement_purpose != purpose;
        contact.next_engagement_date = decision.next_date;
        contact.next_engagement_purpose = purpose;
        Ok(changed)
    }
}

/// Shared handle to the engagement store.
#[derive(Clone)]
pub struct EngagementStore {
    pub(crate) state: Arc<RwLock<StoreState>>,
    path: Option<PathBuf>,
}

impl EngagementStore {
    /// Fresh in-memory store with the engagement columns present.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                engagement_fields_ready: true,
                ..StoreState::default()
            })),
            path: None,
        }
    }

    /// A store mid schema rollout: contacts exist, the engagement columns
    /// do not yet.
    pub fn with_engagement_fields_pending() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            path: None,
        }
    }

    /// Load a JSON snapshot, or start empty when the file does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?
        } else {
            StoreState {
                engagement_fields_ready: true,
                ..StoreState::default()
            }
        };
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            path: Some(path),
        })
    }

    /// Write the JSON snapshot if this store is file-backed.
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let state = self.state.read().await;
        let json = serde_json::to_string_pretty(&*state)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub async fn insert_contact(&self, contact: ContactEngagementState) {
        let mut state = self.state.write().await;
        state.contacts.insert(contact.id.clone(), contact);
    }

    pub async fn get_contact(&self, id: &ContactId) -> Result<ContactEngagementState, StoreError> {
        let state = self.state.read().await;
        state.contact(id).cloned()
    }

    /// Append one activity row.
    pub async fn log_activity(&self, activity: OutboundActivity) {
        let mut state = self.state.write().await;
        state.activities.push(activity);
    }

    /// Entry point for the external reply matcher: mark `send_id` as
    /// answered by `reply_id`. No matching logic lives here.
    pub async fn record_reply_match(
        &self,
        send_id: &ActivityId,
        reply_id: ActivityId,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let row = state
            .activities
            .iter_mut()
            .find(|a| a.id == *send_id)
            .ok_or_else(|| StoreError::ActivityNotFound(send_id.clone()))?;
        row.matched_reply_ref = Some(reply_id);
        Ok(())
    }

    /// Human write path: set or clear the manual reminder.
    pub async fn set_manual_reminder(
        &self,
        id: &ContactId,
        reminder: Option<ManualReminder>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let contact = state
            .contacts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        contact.manual_reminder = reminder;
        Ok(())
    }

    /// Human write path: terminal suppression.
    pub async fn set_do_not_contact(&self, id: &ContactId, value: bool) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let contact = state
            .contacts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        contact.do_not_contact_again = value;
        Ok(())
    }

    /// Pipeline-management write path: refresh the snapshot.
    pub async fn snap_pipeline(
        &self,
        id: &ContactId,
        snapshot: PipelineSnapshot,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let contact = state
            .contacts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        contact.pipeline = snapshot;
        Ok(())
    }

    /// Persistence adapter: write a decision onto the contact record.
    ///
    /// Tolerates the schema-rollout window: a `SchemaNotReady` failure is
    /// converted to `{ updated: false }` so a recompute job can run against
    /// a mixed-version fleet. Everything else propagates.
    pub async fn persist_decision(
        &self,
        id: &ContactId,
        decision: &CadenceDecision,
    ) -> Result<PersistOutcome, StoreError> {
        let mut state = self.state.write().await;
        match state.write_engagement_fields(id, decision) {
            Ok(changed) => Ok(PersistOutcome { updated: changed }),
            Err(StoreError::SchemaNotReady) => {
                debug!(contact = %id, "engagement fields not rolled out yet; skipping persist");
                Ok(PersistOutcome { updated: false })
            }
            Err(e) => Err(e),
        }
    }

    /// Monotonic touch recorder: advance `last_contacted_at`, never move
    /// it backward.
    pub async fn record_touch(
        &self,
        id: &ContactId,
        observed: DateTime<Utc>,
    ) -> Result<TouchOutcome, StoreError> {
        let mut state = self.state.write().await;
        let contact = state
            .contacts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        match contact.last_contacted_at {
            Some(current) if observed <= current => Ok(TouchOutcome { updated: false }),
            _ => {
                contact.last_contacted_at = Some(observed);
                Ok(TouchOutcome { updated: true })
            }
        }
    }
}

impl Default for EngagementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{CalendarDay, EngagementPurpose};
    use chrono::TimeZone;

    fn ts(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn decision(next: Option<&str>, purpose: Option<EngagementPurpose>) -> CadenceDecision {
        CadenceDecision {
            next_date: next.map(|s| CalendarDay::parse(s).unwrap()),
            purpose,
            is_manual_override: false,
            is_suppressed: false,
        }
    }

    #[tokio::test]
    async fn touch_recorder_never_regresses() {
        let store = EngagementStore::new();
        let id = ContactId::new("c1");
        store.insert_contact(ContactEngagementState::new("c1")).await;

        assert!(store.record_touch(&id, ts(10, 9)).await.unwrap().updated);
        assert!(store.record_touch(&id, ts(12, 9)).await.unwrap().updated);
        // Older and equal observations are no-ops.
        assert!(!store.record_touch(&id, ts(11, 9)).await.unwrap().updated);
        assert!(!store.record_touch(&id, ts(12, 9)).await.unwrap().updated);

        let c = store.get_contact(&id).await.unwrap();
        assert_eq!(c.last_contacted_at, Some(ts(12, 9)));
    }

    #[tokio::test]
    async fn touch_sequence_lands_on_maximum() {
        let store = EngagementStore::new();
        let id = ContactId::new("c1");
        store.insert_contact(ContactEngagementState::new("c1")).await;

        for d in [14, 3, 22, 9, 22] {
            let _ = store.record_touch(&id, ts(d, 12)).await.unwrap();
        }
        let c = store.get_contact(&id).await.unwrap();
        assert_eq!(c.last_contacted_at, Some(ts(22, 12)));
    }

    #[tokio::test]
    async fn persist_writes_and_clears_fields() {
        let store = EngagementStore::new();
        let id = ContactId::new("c1");
        store.insert_contact(ContactEngagementState::new("c1")).await;

        let out = store
            .persist_decision(&id, &decision(Some("2024-02-04"), Some(EngagementPurpose::Unresponsive)))
            .await
            .unwrap();
        assert!(out.updated);
        let c = store.get_contact(&id).await.unwrap();
        assert_eq!(c.next_engagement_date, Some(CalendarDay::parse("2024-02-04").unwrap()));
        assert_eq!(c.next_engagement_purpose, Some(EngagementPurpose::Unresponsive));

        let out = store.persist_decision(&id, &decision(None, None)).await.unwrap();
        assert!(out.updated);
        let c = store.get_contact(&id).await.unwrap();
        assert_eq!(c.next_engagement_date, None);
        assert_eq!(c.next_engagement_purpose, None);
    }

    #[tokio::test]
    async fn persist_is_a_noop_when_nothing_changes() {
        let store = EngagementStore::new();
        let id = ContactId::new("c1");
        store.insert_contact(ContactEngagementState::new("c1")).await;

        let d = decision(Some("2024-02-04"), Some(EngagementPurpose::Unresponsive));
        assert!(store.persist_decision(&id, &d).await.unwrap().updated);
        assert!(!store.persist_decision(&id, &d).await.unwrap().updated);
    }

    #[tokio::test]
    async fn persist_tolerates_schema_not_ready() {
        let store = EngagementStore::with_engagement_fields_pending();
        let id = ContactId::new("c1");
        store.insert_contact(ContactEngagementState::new("c1")).await;

        let out = store
            .persist_decision(&id, &decision(Some("2024-02-04"), Some(EngagementPurpose::Unresponsive)))
            .await
            .unwrap();
        assert!(!out.updated);
        // The record is untouched.
        let c = store.get_contact(&id).await.unwrap();
        assert_eq!(c.next_engagement_date, None);
    }

    #[tokio::test]
    async fn persist_still_reports_missing_contacts() {
        let store = EngagementStore::new();
        let err = store
            .persist_decision(&ContactId::new("ghost"), &decision(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("cadence-store-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("snapshot.json");

        let store = EngagementStore::load(&path).await.unwrap();
        let id = ContactId::new("c1");
        store
            .insert_contact(
                ContactEngagementState::new("c1").with_last_contacted(ts(10, 9)),
            )
            .await;
        store.save().await.unwrap();

        let reloaded = EngagementStore::load(&path).await.unwrap();
        let c = reloaded.get_contact(&id).await.unwrap();
        assert_eq!(c.last_contacted_at, Some(ts(10, 9)));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
