//! Countdown against the resolved gameweek deadline.
//!
//! The ticker is driven from the UI loop once per second. When the deadline
//! passes it publishes all-zero, flips to `Passed`, and arms a follow-up
//! callback an hour later. Every passage gets its own follow-up.

use crate::state::tasks::{self, TaskHandle};
use chrono::{DateTime, Utc};
use fpl_api::CountdownState;
use log::info;
use std::sync::Arc;
use std::time::Duration;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const PASSED_FOLLOW_UP_DELAY: Duration = Duration::from_secs(60 * 60);

pub type DeadlineCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickerPhase {
    #[default]
    Counting,
    Passed,
}

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No deadline yet.
    Idle,
    Counting(CountdownState),
    /// First tick at or past the deadline; the follow-up was armed.
    JustPassed,
    Passed,
}

pub struct CountdownTicker {
    deadline: Option<DateTime<Utc>>,
    phase: TickerPhase,
    remaining: CountdownState,
    follow_up_delay: Duration,
    on_passed: Option<DeadlineCallback>,
    follow_ups: Vec<TaskHandle>,
}

impl Default for CountdownTicker {
    fn default() -> Self {
        Self {
            deadline: None,
            phase: TickerPhase::Counting,
            remaining: CountdownState::ZERO,
            follow_up_delay: PASSED_FOLLOW_UP_DELAY,
            on_passed: None,
            follow_ups: Vec::new(),
        }
    }
}

impl CountdownTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(mut self, on_passed: DeadlineCallback) -> Self {
        self.on_passed = Some(on_passed);
        self
    }

    /// Install a freshly resolved deadline and recompute straight away.
    ///
    /// Always resets to `Counting`. Follow-ups armed by earlier passages stay
    /// scheduled.
    pub fn set_deadline(&mut self, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Tick {
        self.deadline = Some(deadline);
        self.phase = TickerPhase::Counting;
        self.tick(now)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let Some(deadline) = self.deadline else {
            return Tick::Idle;
        };

        if self.phase == TickerPhase::Passed {
            return Tick::Passed;
        }

        let difference = deadline - now;
        if difference > chrono::Duration::zero() {
            self.remaining = CountdownState::from_remaining(difference);
            return Tick::Counting(self.remaining);
        }

        self.remaining = CountdownState::ZERO;
        self.phase = TickerPhase::Passed;
        self.arm_follow_up();
        Tick::JustPassed
    }

    fn arm_follow_up(&mut self) {
        let Some(on_passed) = self.on_passed.clone() else {
            return;
        };
        info!(
            "deadline passed, scheduling refresh in {} minutes",
            self.follow_up_delay.as_secs() / 60
        );
        self.follow_ups.retain(|follow_up| !follow_up.is_finished());
        self.follow_ups.push(tasks::after(self.follow_up_delay, move || on_passed()));
    }

    /// Cancel every pending follow-up and forget the deadline.
    pub fn teardown(&mut self) {
        for follow_up in self.follow_ups.drain(..) {
            follow_up.cancel();
        }
        self.deadline = None;
        self.phase = TickerPhase::Counting;
        self.remaining = CountdownState::ZERO;
    }

    pub fn phase(&self) -> TickerPhase {
        self.phase
    }

    pub fn is_passed(&self) -> bool {
        self.phase == TickerPhase::Passed
    }

    pub fn remaining(&self) -> CountdownState {
        self.remaining
    }

    pub fn has_pending_follow_up(&self) -> bool {
        self.follow_ups.iter().any(|f| !f.is_finished())
    }
}
