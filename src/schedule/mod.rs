//! Shift timing resolution and session-window validation.
//!
//! [`boundary`] turns `HH:mm` shift configuration into absolute session
//! boundaries and projects instants through the business timezone;
//! [`session`] decides whether a half-day punch is currently permitted.

mod boundary;
mod session;

pub use boundary::{LocalProjection, SessionTimings, TimeResolver, TzSource, parse_hhmm};
pub use session::{HalfDayRules, PunchKind, WindowDecision, evaluate_punch, working_window};
