//! Send/response history reader. Read-only scans over the activity log
//! plus the contact's denormalized `last_contacted_at`.

use chrono::{DateTime, Utc};

use cadence_core::{ContactEngagementState, ContactId, OutboundActivity, SendHistory};

use crate::store::{EngagementStore, StoreError, StoreState};

/// How many recent activity rows a history scan considers per contact.
pub const RECENT_SEND_WINDOW: usize = 50;

fn recent_sends<'a>(
    state: &'a StoreState,
    contact_id: &'a ContactId,
) -> impl Iterator<Item = &'a OutboundActivity> {
    state
        .activities
        .iter()
        .rev()
        .filter(move |a| a.contact_id == *contact_id && a.qualifies_as_send())
        .take(RECENT_SEND_WINDOW)
}

/// Latest known outbound send: the max effective send time across the
/// recent qualifying rows and `last_contacted_at`, which may lag the log.
pub(crate) fn last_send(
    state: &StoreState,
    contact: &ContactEngagementState,
) -> Option<DateTime<Utc>> {
    let from_log = recent_sends(state, &contact.id)
        .map(|a| a.effective_send_time())
        .max();
    from_log
        .into_iter()
        .chain(contact.last_contacted_at)
        .max()
}

/// Response time to the most recent qualifying send, if the reply matcher
/// has attached one. No matching logic here; the linked row is trusted.
pub(crate) fn responded_after_last_send(
    state: &StoreState,
    contact_id: &ContactId,
) -> Option<DateTime<Utc>> {
    let last_send_row = recent_sends(state, contact_id)
        .max_by_key(|a| a.effective_send_time())?;
    let reply_id = last_send_row.matched_reply_ref.as_ref()?;
    let reply = state.activities.iter().find(|a| a.id == *reply_id)?;
    Some(reply.effective_send_time())
}

pub(crate) fn send_history_of(
    state: &StoreState,
    contact: &ContactEngagementState,
) -> SendHistory {
    SendHistory {
        last_send: last_send(state, contact),
        responded_at: responded_after_last_send(state, &contact.id),
    }
}

impl EngagementStore {
    /// Both history answers for one contact under a single read lock.
    pub async fn send_history(&self, id: &ContactId) -> Result<SendHistory, StoreError> {
        let state = self.state.read().await;
        let contact = state.contact(id)?;
        Ok(send_history_of(&state, contact))
    }

    pub async fn last_send(&self, id: &ContactId) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.send_history(id).await?.last_send)
    }

    pub async fn responded_after_last_send(
        &self,
        id: &ContactId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.send_history(id).await?.responded_at)
    }
}
