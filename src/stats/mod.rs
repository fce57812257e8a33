//! Statistics module.
//!
//! Counts sent and delivered media per kind, with lifetime, daily and weekly views.

pub mod recorder;

pub use recorder::{
    Action, ActionStats, DayStats, KindTotals, StatTotals, StatsRecorder, StatsSnapshot, WEEK_DAYS,
};
