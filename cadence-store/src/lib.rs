//! cadence-store: storage and orchestration for the engagement cadence
//! engine. The decision logic itself lives in `cadence-core`; this crate
//! supplies the history reader, the persistence adapter, the monotonic
//! touch recorder, and the recompute entry points.

pub mod history;
pub mod recompute;
pub mod store;

pub use history::RECENT_SEND_WINDOW;
pub use recompute::{CadenceEngine, RecomputeOutcome, SweepOutcome};
pub use store::{EngagementStore, PersistOutcome, StoreError, TouchOutcome};
