//! Active-duration accumulator for session timers.
//!
//! A timer is either running or stopped, driven externally by start/stop
//! events. This module only does the arithmetic: closing out a running
//! interval against the *existing* start checkpoint and accumulating whole
//! seconds. It performs no transition-legality validation and never reads a
//! system clock; every timestamp arrives as a parameter, which is what
//! keeps concurrent invocation safe. Callers own read-modify-write
//! atomicity when persisting the returned state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted timer state for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Cumulative seconds the timer has been running. Monotonic; never
    /// decreases except via an external reset.
    pub active_duration_seconds: i64,
    /// When the timer last entered the running state, if ever.
    pub last_timer_started_at: Option<DateTime<Utc>>,
}

/// A start/stop/increment event applied to a timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerEvent {
    /// Extra seconds to add on top of any closed-out interval.
    pub active_duration_seconds: Option<i64>,
    /// New start checkpoint (resume).
    pub last_timer_started_at: Option<DateTime<Utc>>,
    /// Stop checkpoint; closes the interval opened by the existing start.
    pub last_timer_stopped_at: Option<DateTime<Utc>>,
}

/// The state to persist after applying an event. Timestamp fields are
/// present only when the event supplied them; an absent field means "leave
/// the persisted value alone", never "clear it".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerUpdates {
    pub active_duration_seconds: i64,
    pub last_timer_started_at: Option<DateTime<Utc>>,
    pub last_timer_stopped_at: Option<DateTime<Utc>>,
}

/// Applies one timer event to the existing state.
///
/// 1. Start from `existing.active_duration_seconds`.
/// 2. A stop checkpoint paired with an existing start checkpoint adds
///    `max(0, floor(stopped - started))` whole seconds. The existing start
///    is used, never a new one supplied in the same event, and clock skew
///    clamps to zero rather than subtracting.
/// 3. A manual increment, when provided, is added on top.
/// 4. The event's checkpoints are echoed through unchanged.
///
/// Never fails: missing inputs contribute zero.
#[must_use]
pub fn timer_updates(existing: &TimerState, event: &TimerEvent) -> TimerUpdates {
    let mut total = existing.active_duration_seconds;

    if let (Some(stopped_at), Some(started_at)) =
        (event.last_timer_stopped_at, existing.last_timer_started_at)
    {
        total += (stopped_at - started_at).num_seconds().max(0);
    }

    if let Some(increment) = event.active_duration_seconds {
        total += increment;
    }

    TimerUpdates {
        active_duration_seconds: total,
        last_timer_started_at: event.last_timer_started_at,
        last_timer_stopped_at: event.last_timer_stopped_at,
    }
}
