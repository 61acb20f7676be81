//! Contact engagement state: the per-contact record the cadence engine
//! reads from and writes its outcome back onto.
//!
//! Note: we keep this small + serializable. Storage lives in `cadence-store`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;

/// Opaque contact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl ContactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline a contact is being worked through. Closed over the names the
/// engine branches on; anything else is carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipelineName {
    Connector,
    Other(String),
}

impl From<String> for PipelineName {
    fn from(s: String) -> Self {
        match s.as_str() {
            "connector" => PipelineName::Connector,
            _ => PipelineName::Other(s),
        }
    }
}

impl From<PipelineName> for String {
    fn from(p: PipelineName) -> String {
        match p {
            PipelineName::Connector => "connector".to_string(),
            PipelineName::Other(s) => s,
        }
    }
}

/// Stage within a pipeline, same closed-over-what-we-branch-on shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageName {
    Forwarded,
    IntroductionMade,
    Other(String),
}

impl From<String> for StageName {
    fn from(s: String) -> Self {
        match s.as_str() {
            "forwarded" => StageName::Forwarded,
            "introduction-made" => StageName::IntroductionMade,
            _ => StageName::Other(s),
        }
    }
}

impl From<StageName> for String {
    fn from(s: StageName) -> String {
        match s {
            StageName::Forwarded => "forwarded".to_string(),
            StageName::IntroductionMade => "introduction-made".to_string(),
            StageName::Other(s) => s,
        }
    }
}

/// The contact's pipeline/stage as of the last time pipeline-management
/// logic snapped it. Read-only here; freshness is the snapper's problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub pipeline: Option<PipelineName>,
    pub stage: Option<StageName>,
}

impl PipelineSnapshot {
    pub fn new(pipeline: PipelineName, stage: StageName) -> Self {
        Self {
            pipeline: Some(pipeline),
            stage: Some(stage),
        }
    }
}

/// Why the engine chose a next engagement date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementPurpose {
    /// The contact has not responded to the latest send.
    Unresponsive,
    /// The contact responded but sits in an intermediate forwarded stage.
    PeriodicCheckIn,
}

/// Descriptive prior-relationship tag; passed through, never branched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorRelationship {
    Friend,
    FormerColleague,
    Classmate,
    MutualConnection,
}

/// Who wrote the manual-reminder slot.
///
/// Legacy records carried machine-written dates in the same slot a human
/// reminder lives in; the engine classifies a purpose only for human ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderOrigin {
    #[default]
    Human,
    Migrated,
}

/// A human-entered "remind me on" date. Always wins over computed cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualReminder {
    pub date: CalendarDay,
    #[serde(default)]
    pub origin: ReminderOrigin,
}

impl ManualReminder {
    pub fn human(date: CalendarDay) -> Self {
        Self {
            date,
            origin: ReminderOrigin::Human,
        }
    }

    pub fn migrated(date: CalendarDay) -> Self {
        Self {
            date,
            origin: ReminderOrigin::Migrated,
        }
    }
}

/// Per-contact engagement state.
///
/// Mutated only by: a human setting `do_not_contact_again` or the manual
/// reminder, pipeline logic snapping `pipeline`, the touch recorder
/// advancing `last_contacted_at`, and the engine writing
/// `next_engagement_date`/`next_engagement_purpose`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEngagementState {
    pub id: ContactId,

    /// Terminal suppression flag, set by a human, never by the engine.
    pub do_not_contact_again: bool,

    /// If present, always wins over the automatic branches.
    pub manual_reminder: Option<ManualReminder>,

    /// Opaque annotation, passed through, never interpreted.
    pub manual_follow_up_note: Option<String>,

    pub pipeline: PipelineSnapshot,

    pub prior_relationship: Option<PriorRelationship>,

    /// Monotonic marker of the latest known outbound touch; may lag the
    /// activity log.
    pub last_contacted_at: Option<DateTime<Utc>>,

    /// The engine's own output, persisted so dashboards and queues can
    /// read it without recomputing.
    pub next_engagement_date: Option<CalendarDay>,
    pub next_engagement_purpose: Option<EngagementPurpose>,
}

impl ContactEngagementState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(id),
            do_not_contact_again: false,
            manual_reminder: None,
            manual_follow_up_note: None,
            pipeline: PipelineSnapshot::default(),
            prior_relationship: None,
            last_contacted_at: None,
            next_engagement_date: None,
            next_engagement_purpose: None,
        }
    }

    pub fn with_do_not_contact(mut self) -> Self {
        self.do_not_contact_again = true;
        self
    }

    pub fn with_manual_reminder(mut self, reminder: ManualReminder) -> Self {
        self.manual_reminder = Some(reminder);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.manual_follow_up_note = Some(note.into());
        self
    }

    pub fn with_pipeline(mut self, snapshot: PipelineSnapshot) -> Self {
        self.pipeline = snapshot;
        self
    }

    pub fn with_prior_relationship(mut self, rel: PriorRelationship) -> Self {
        self.prior_relationship = Some(rel);
        self
    }

    pub fn with_last_contacted(mut self, at: DateTime<Utc>) -> Self {
        self.last_contacted_at = Some(at);
        self
    }
}
