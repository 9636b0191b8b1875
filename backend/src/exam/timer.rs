// src/exam/timer.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Time left on a user's running session, as seen by a lazy refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeLeft {
    NoActiveSession,
    Running { session_id: i64, minutes: i64 },
    /// The refresh that observed the deadline also closed the session.
    Expired { session_id: i64, minutes: i64 },
}

impl TimeLeft {
    pub fn is_running(&self) -> bool {
        matches!(self, TimeLeft::Running { .. })
    }
}

/// Milliseconds left before the deadline (negative once past it).
pub fn remaining_millis(started_at: DateTime<Utc>, now: DateTime<Utc>, limit_minutes: i64) -> i64 {
    let deadline = started_at + Duration::minutes(limit_minutes);
    (deadline - now).num_milliseconds()
}

/// Classifies a session started at `started_at`.
///
/// Minutes are truncated toward zero; anything `<= 0` ms left expires.
pub fn evaluate(
    session_id: i64,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    limit_minutes: i64,
) -> TimeLeft {
    let millis = remaining_millis(started_at, now, limit_minutes);
    let minutes = millis / 60_000;

    if millis <= 0 {
        TimeLeft::Expired { session_id, minutes }
    } else {
        TimeLeft::Running { session_id, minutes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_running_session_reports_whole_minutes() {
        let now = start() + Duration::seconds(30 * 60 + 30);

        assert_eq!(
            evaluate(7, start(), now, 60),
            TimeLeft::Running {
                session_id: 7,
                minutes: 29
            }
        );
    }

    #[test]
    fn test_last_seconds_still_running_with_zero_minutes() {
        let now = start() + Duration::seconds(60 * 60 - 10);

        assert_eq!(
            evaluate(7, start(), now, 60),
            TimeLeft::Running {
                session_id: 7,
                minutes: 0
            }
        );
    }

    #[test]
    fn test_exact_deadline_expires() {
        let now = start() + Duration::minutes(60);

        assert_eq!(
            evaluate(7, start(), now, 60),
            TimeLeft::Expired {
                session_id: 7,
                minutes: 0
            }
        );
    }

    #[test]
    fn test_past_deadline_is_non_positive() {
        let now = start() + Duration::minutes(61);

        let left = evaluate(7, start(), now, 60);
        assert_eq!(
            left,
            TimeLeft::Expired {
                session_id: 7,
                minutes: -1
            }
        );
        assert!(!left.is_running());
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let value = serde_json::to_value(TimeLeft::Running {
            session_id: 3,
            minutes: 12,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "running", "session_id": 3, "minutes": 12})
        );
        assert_eq!(
            serde_json::to_value(TimeLeft::NoActiveSession).unwrap(),
            serde_json::json!({"status": "no_active_session"})
        );
    }
}
