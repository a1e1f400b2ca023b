//! Focus sessions.
//!
//! A session is the live countdown of one occurrence:
//!
//! ```text
//! Loading -> Running -> (Break <-> Running)* -> Expired -> Rated
//! ```
//!
//! [`SessionMonitor`] is the state machine as a plain value; it does not own
//! a clock. [`SessionDriver`] feeds it one tick per interval, queries the
//! usage log once at expiry and publishes [`crate::events::SessionEvent`]s.

mod breaks;
mod driver;
mod monitor;
mod verdict;

pub use breaks::{compute_breaks, BreakWindow};
pub use driver::{SessionDriver, SessionHandle};
pub use monitor::{format_countdown, local_epoch_millis, SessionMonitor, SessionState};
pub use verdict::{evaluate_usage, UsageFailurePolicy, Verdict};
