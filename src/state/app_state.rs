use crate::state::countdown::CountdownTicker;
use crate::state::fetcher::FetchStatus;
use crate::state::refresher::AutoRefreshScheduler;
use chrono::{DateTime, Local};
use fpl_api::ResolvedDeadline;

// ---------------------------------------------------------------------------
// Deadline fetch state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DeadlineState {
    pub status: FetchStatus,
    /// Replaced wholesale by every fetch outcome.
    pub resolved: Option<ResolvedDeadline>,
    pub using_fallback: bool,
    pub error_message: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

impl DeadlineState {
    pub fn fallback_notice(&self) -> Option<String> {
        if !self.using_fallback {
            return None;
        }
        let reason = self.error_message.as_deref().unwrap_or("unknown error");
        Some(format!("Using simulated data due to API connection issue: {reason}"))
    }
}

// ---------------------------------------------------------------------------
// Top-level application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub deadline: DeadlineState,
    pub countdown: CountdownTicker,
    pub auto_refresh: AutoRefreshScheduler,
}

impl AppState {
    pub fn new(countdown: CountdownTicker, auto_refresh: AutoRefreshScheduler) -> Self {
        Self {
            show_logs: false,
            last_error: None,
            deadline: DeadlineState::default(),
            countdown,
            auto_refresh,
        }
    }
}
