use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveTime;
use chrono::Utc;

use crate::domain::two_factor::models::TwoFactorRateLimit;

/// Maximum sends within the trailing 15 minutes.
pub const MAX_PER_QUARTER_HOUR: i32 = 3;
/// Maximum sends within the trailing hour.
pub const MAX_PER_HOUR: i32 = 5;
/// Maximum sends within one calendar day.
pub const MAX_PER_DAY: i32 = 10;
/// Minimum spacing between consecutive sends, in seconds.
pub const MIN_SEND_INTERVAL_SECS: i64 = 60;

const QUARTER_HOUR_SECS: i64 = 15 * 60;
const HOUR_SECS: i64 = 60 * 60;

/// Outcome of a send-quota evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendDecision {
    Allow,
    Deny {
        /// Machine-usable wait estimate, in seconds.
        retry_after_secs: i64,
    },
}

/// Evaluate whether a send is allowed right now, mutating `state` in place.
///
/// Evaluated lazily at each request; there are no background timers. Counter
/// resets are keyed off the single `last_send` timestamp rather than
/// independent rolling windows per counter. That is a deliberate
/// simplification carried over from the original design; the test suite
/// encodes it as intended behavior.
///
/// Escalation blocks (15 minutes, 1 hour, until midnight UTC) are written to
/// `state.blocked_until`; the caller is responsible for persisting the state
/// whether the decision is Allow or Deny.
pub fn evaluate(state: &mut TwoFactorRateLimit, now: DateTime<Utc>) -> SendDecision {
    // Hard block set by an earlier escalation
    if let Some(until) = state.blocked_until {
        if now < until {
            return SendDecision::Deny {
                retry_after_secs: remaining_secs(now, until),
            };
        }
        state.blocked_until = None;
    }

    // Window resets, all keyed off last_send
    if let Some(last) = state.last_send {
        let elapsed = (now - last).num_seconds();
        if elapsed > QUARTER_HOUR_SECS {
            state.quarter_hour_count = 0;
        }
        if elapsed > HOUR_SECS {
            state.hour_count = 0;
        }
        if last.date_naive() < now.date_naive() {
            state.day_count = 0;
        }
    }

    // Budget checks, escalating block on exhaustion
    if state.quarter_hour_count >= MAX_PER_QUARTER_HOUR {
        let until = now + Duration::seconds(QUARTER_HOUR_SECS);
        state.blocked_until = Some(until);
        return SendDecision::Deny {
            retry_after_secs: QUARTER_HOUR_SECS,
        };
    }
    if state.hour_count >= MAX_PER_HOUR {
        let until = now + Duration::seconds(HOUR_SECS);
        state.blocked_until = Some(until);
        return SendDecision::Deny {
            retry_after_secs: HOUR_SECS,
        };
    }
    if state.day_count >= MAX_PER_DAY {
        let until = next_midnight(now);
        state.blocked_until = Some(until);
        return SendDecision::Deny {
            retry_after_secs: remaining_secs(now, until),
        };
    }

    // Minimum spacing between sends; denies without escalating
    if let Some(last) = state.last_send {
        let elapsed = (now - last).num_seconds();
        if elapsed < MIN_SEND_INTERVAL_SECS {
            return SendDecision::Deny {
                retry_after_secs: MIN_SEND_INTERVAL_SECS - elapsed,
            };
        }
    }

    SendDecision::Allow
}

/// Account for a successful dispatch: bump all three counters and stamp
/// `last_send`.
pub fn note_send(state: &mut TwoFactorRateLimit, now: DateTime<Utc>) {
    state.quarter_hour_count += 1;
    state.hour_count += 1;
    state.day_count += 1;
    state.last_send = Some(now);
}

fn next_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}

fn remaining_secs(now: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    (until - now).num_seconds().max(1)
}
