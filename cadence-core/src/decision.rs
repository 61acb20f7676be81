//! Cadence decision engine: precedence-ordered policy that turns override
//! flags, manual dates, send/response history and the pipeline snapshot
//! into a single next-engagement outcome.
//!
//! Pure function of its inputs; safe to call repeatedly. Absence of any
//! optional input is a valid state, never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::{ContactEngagementState, EngagementPurpose, PipelineName, ReminderOrigin, StageName};
use crate::day::CalendarDay;

/// Tunable cadence configuration. One named value used by both
/// auto-cadence branches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CadencePolicy {
    /// Calendar days between an outbound touch and the suggested follow-up.
    pub follow_up_days: i64,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self { follow_up_days: 7 }
    }
}

/// The history reader's answer for one contact, passed in so the engine
/// stays pure and unit-testable without a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendHistory {
    /// Most recent outbound send across the activity log and
    /// `last_contacted_at`.
    pub last_send: Option<DateTime<Utc>>,
    /// When the contact responded to that send, per the reply matcher.
    pub responded_at: Option<DateTime<Utc>>,
}

impl SendHistory {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceDecision {
    pub next_date: Option<CalendarDay>,
    pub purpose: Option<EngagementPurpose>,
    pub is_manual_override: bool,
    pub is_suppressed: bool,
}

impl CadenceDecision {
    /// No automatic suggestion; a human decides the next step.
    fn none() -> Self {
        Self {
            next_date: None,
            purpose: None,
            is_manual_override: false,
            is_suppressed: false,
        }
    }

    fn suppressed() -> Self {
        Self {
            next_date: None,
            purpose: None,
            is_manual_override: true,
            is_suppressed: true,
        }
    }
}

/// Decide the next engagement date for a contact.
///
/// Branch order (first match wins):
/// 1. `do_not_contact_again` suppresses everything.
/// 2. A manual reminder is returned unchanged; purpose is classified only
///    when a human set it, not when a machine-written date was migrated
///    into the slot.
/// 3. No send history at all: nothing to base a cadence on.
/// 4. No response since the last send: follow up `follow_up_days` after it.
/// 5. Responded while sitting in connector/forwarded: periodic check-in
///    `follow_up_days` after the later of response and send.
/// 6. Responded anywhere else: no automatic guess.
pub fn decide(
    contact: &ContactEngagementState,
    history: &SendHistory,
    policy: &CadencePolicy,
) -> CadenceDecision {
    if contact.do_not_contact_again {
        return CadenceDecision::suppressed();
    }

    if let Some(reminder) = contact.manual_reminder {
        let purpose = match reminder.origin {
            ReminderOrigin::Human => Some(EngagementPurpose::Unresponsive),
            ReminderOrigin::Migrated => None,
        };
        return CadenceDecision {
            next_date: Some(reminder.date),
            purpose,
            is_manual_override: true,
            is_suppressed: false,
        };
    }

    let Some(last_send) = history.last_send else {
        return CadenceDecision::none();
    };

    let Some(responded_at) = history.responded_at else {
        return CadenceDecision {
            next_date: Some(
                CalendarDay::from_timestamp(last_send).add_days(policy.follow_up_days),
            ),
            purpose: Some(EngagementPurpose::Unresponsive),
            is_manual_override: false,
            is_suppressed: false,
        };
    };

    match (&contact.pipeline.pipeline, &contact.pipeline.stage) {
        (Some(PipelineName::Connector), Some(StageName::Forwarded)) => {
            let basis = responded_at.max(last_send);
            CadenceDecision {
                next_date: Some(
                    CalendarDay::from_timestamp(basis).add_days(policy.follow_up_days),
                ),
                purpose: Some(EngagementPurpose::PeriodicCheckIn),
                is_manual_override: false,
                is_suppressed: false,
            }
        }
        _ => CadenceDecision::none(),
    }
}
