//! cadence-core: domain types and the decision engine for the engagement
//! cadence system.

pub mod activity;
pub mod contact;
pub mod day;
pub mod decision;

pub use activity::{ActivityId, ChannelSource, EventKind, OutboundActivity};
pub use contact::{
    ContactEngagementState, ContactId, EngagementPurpose, ManualReminder, PipelineName,
    PipelineSnapshot, PriorRelationship, ReminderOrigin, StageName,
};
pub use day::CalendarDay;
pub use decision::{decide, CadenceDecision, CadencePolicy, SendHistory};
