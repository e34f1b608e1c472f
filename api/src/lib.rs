pub mod client;
pub mod fpl;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the FPL wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameweekEvent {
    pub id: u32,
    pub name: String, // "Gameweek 7"
    pub deadline: DateTime<Utc>,
    pub is_current: bool,
    pub is_next: bool,
    pub finished: bool,
    pub average_points: i32,
}

/// One parsed payload from the deadline endpoint.
#[derive(Debug, Clone, Default)]
pub struct DeadlineFeed {
    pub events: Vec<GameweekEvent>,
    /// Only a backend proxy declares this; the public FPL feed never does.
    pub next_refresh: Option<DateTime<Utc>>,
}

/// The deadline the countdown runs against. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDeadline {
    pub deadline: DateTime<Utc>,
    /// None when the deadline came from the weekday fallback rule.
    pub event: Option<GameweekEvent>,
}

impl ResolvedDeadline {
    pub fn title(&self) -> String {
        match &self.event {
            Some(event) if !event.name.is_empty() => format!("{} Deadline", event.name),
            _ => "Gameweek Deadline".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownState {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownState {
    pub const ZERO: CountdownState = CountdownState { days: 0, hours: 0, minutes: 0, seconds: 0 };

    /// Floor-decompose a remaining duration into 24h days, hours, minutes and
    /// seconds. Anything at or below zero clamps to all-zero.
    pub fn from_remaining(remaining: Duration) -> Self {
        let total = remaining.num_seconds();
        if total <= 0 {
            return Self::ZERO;
        }
        let total = total as u64;
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

// ---------------------------------------------------------------------------
// Deadline resolution
// ---------------------------------------------------------------------------

pub const FALLBACK_WEEKDAY: Weekday = Weekday::Fri;
pub const FALLBACK_HOUR_UTC: i64 = 18;

/// Pick the authoritative deadline from a list of gameweeks.
///
/// Priority, first match wins:
///   1. the current gameweek
///   2. the next gameweek
///   3. the earliest deadline strictly after `now`
///   4. next Friday 18:00 UTC, with no event attached
pub fn resolve(events: &[GameweekEvent], now: DateTime<Utc>) -> ResolvedDeadline {
    let chosen = events
        .iter()
        .find(|e| e.is_current)
        .or_else(|| events.iter().find(|e| e.is_next))
        .or_else(|| {
            events
                .iter()
                .filter(|e| e.deadline > now)
                .min_by_key(|e| e.deadline)
        });

    match chosen {
        Some(event) => ResolvedDeadline { deadline: event.deadline, event: Some(event.clone()) },
        None => ResolvedDeadline { deadline: fallback_deadline(now), event: None },
    }
}

/// Next occurrence of Friday 18:00 UTC, strictly after `now`.
pub fn fallback_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
    let target = i64::from(FALLBACK_WEEKDAY.num_days_from_monday());
    let today = i64::from(now.weekday().num_days_from_monday());
    let days_ahead = (target - today).rem_euclid(7);

    let midnight = (now.date_naive() + Duration::days(days_ahead))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let candidate = midnight + Duration::hours(FALLBACK_HOUR_UTC);
    if candidate > now { candidate } else { candidate + Duration::days(7) }
}

/// Hardcoded stand-in used when the live feed is unreachable. Deadlines are
/// relative to `now` so the countdown always has something to count down to.
pub fn fallback_events(now: DateTime<Utc>) -> Vec<GameweekEvent> {
    vec![
        GameweekEvent {
            id: 1,
            name: "Gameweek 1".into(),
            deadline: now + Duration::days(3),
            is_current: true,
            is_next: false,
            finished: false,
            average_points: 52,
        },
        GameweekEvent {
            id: 2,
            name: "Gameweek 2".into(),
            deadline: now + Duration::days(10),
            is_current: false,
            is_next: true,
            finished: false,
            average_points: 0,
        },
    ]
}
