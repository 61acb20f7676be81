//! Outbound activity rows: the append-only log the history reader scans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::ContactId;

/// Opaque activity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Sent,
    Received,
    Opened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelSource {
    Platform,
    OffPlatform,
}

/// One row of the append-only activity log. Rows are never mutated here
/// except by the external reply matcher setting `matched_reply_ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundActivity {
    pub id: ActivityId,
    pub contact_id: ContactId,
    pub event_kind: EventKind,
    pub channel_source: ChannelSource,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Set by the reply matcher when an inbound message is determined to
    /// answer this send. Consumed here, never written.
    pub matched_reply_ref: Option<ActivityId>,
}

impl OutboundActivity {
    pub fn new(
        id: impl Into<String>,
        contact_id: ContactId,
        event_kind: EventKind,
        channel_source: ChannelSource,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new(id),
            contact_id,
            event_kind,
            channel_source,
            sent_at: None,
            created_at,
            matched_reply_ref: None,
        }
    }

    pub fn with_sent_at(mut self, at: DateTime<Utc>) -> Self {
        self.sent_at = Some(at);
        self
    }

    pub fn with_matched_reply(mut self, reply: ActivityId) -> Self {
        self.matched_reply_ref = Some(reply);
        self
    }

    /// Effective send time: `sent_at` where recorded, else row creation.
    pub fn effective_send_time(&self) -> DateTime<Utc> {
        self.sent_at.unwrap_or(self.created_at)
    }

    /// Whether this row counts as an outbound send for cadence purposes.
    /// Off-platform rows qualify regardless of event kind.
    pub fn qualifies_as_send(&self) -> bool {
        self.event_kind == EventKind::Sent || self.channel_source == ChannelSource::OffPlatform
    }
}
