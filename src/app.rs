use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::countdown::{CountdownTicker, Tick};
use crate::state::fetcher::{FetchOutcome, FetchStatus};
use crate::state::messages::{self, FetchReason, NetworkRequest};
use crate::state::network::LoadingState;
use crate::state::refresher::AutoRefreshScheduler;
use crate::state::session::{SessionStore, TEAM_ID_KEY};
use chrono::{DateTime, Local, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    session: Box<dyn SessionStore>,
}

impl App {
    pub fn new(
        settings: AppSettings,
        mut session: Box<dyn SessionStore>,
        network_requests: mpsc::Sender<NetworkRequest>,
    ) -> Self {
        if let Some(team_id) = &settings.team_id {
            session.set(TEAM_ID_KEY, team_id.clone());
        }

        let refetch = network_requests.clone();
        let countdown = CountdownTicker::new().with_callback(Arc::new(move || {
            info!("an hour past the deadline, refreshing gameweek data");
            messages::request_fetch(&refetch, FetchReason::DeadlinePassed);
        }));
        let auto_refresh = AutoRefreshScheduler::new(network_requests, settings.auto_refresh);

        if let Some(level) = settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        Self { state: AppState::new(countdown, auto_refresh), settings, session }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_loading_changed(&mut self, loading: LoadingState) {
        if loading.is_loading {
            self.state.deadline.status = FetchStatus::Loading;
        }
    }

    pub fn on_deadline_loaded(&mut self, outcome: FetchOutcome, now: DateTime<Utc>) {
        self.state.last_error = None;

        let deadline = &mut self.state.deadline;
        deadline.status = outcome.status;
        deadline.using_fallback = outcome.using_fallback;
        deadline.error_message = outcome.error_message;
        deadline.last_updated = Some(Local::now());

        if let Tick::JustPassed = self.state.countdown.set_deadline(outcome.resolved.deadline, now) {
            warn!("resolved deadline {} has already passed", outcome.resolved.deadline);
        }
        deadline.resolved = Some(outcome.resolved);

        let enabled = self.state.auto_refresh.is_enabled();
        self.state.auto_refresh.configure(outcome.next_refresh, enabled, now);
    }

    pub fn on_error(&mut self, message: String) {
        let deadline = &mut self.state.deadline;
        deadline.status = if deadline.resolved.is_some() {
            FetchStatus::Ready
        } else {
            FetchStatus::Failed
        };
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Countdown tick, once a second from the CountdownTick event
    // -----------------------------------------------------------------------

    /// Returns true when there is something new to draw.
    pub fn on_countdown_tick(&mut self, now: DateTime<Utc>) -> bool {
        !matches!(self.state.countdown.tick(now), Tick::Idle | Tick::Passed)
    }

    // -----------------------------------------------------------------------
    // Toggles
    // -----------------------------------------------------------------------

    pub fn toggle_auto_refresh(&mut self, now: DateTime<Utc>) {
        let enabled = !self.state.auto_refresh.is_enabled();
        info!("auto-refresh {}", if enabled { "enabled" } else { "disabled" });
        self.state.auto_refresh.set_enabled(enabled, now);
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn team_id(&self) -> Option<String> {
        self.session.get(TEAM_ID_KEY)
    }

    /// Cancel every timer the app owns and drop session data.
    pub fn shutdown(&mut self) {
        self.state.countdown.teardown();
        self.state.auto_refresh.cancel();
        self.session.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::countdown::{PASSED_FOLLOW_UP_DELAY, TickerPhase};
    use crate::state::session::MemorySessionStore;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use fpl_api::{CountdownState, GameweekEvent, ResolvedDeadline};
    use std::time::Duration;
    use tokio::time::sleep;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn app() -> (App, mpsc::Receiver<NetworkRequest>) {
        let (tx, rx) = mpsc::channel(8);
        let settings = AppSettings { team_id: Some("98765".into()), ..AppSettings::default() };
        (App::new(settings, Box::new(MemorySessionStore::default()), tx), rx)
    }

    fn outcome(deadline: DateTime<Utc>) -> FetchOutcome {
        FetchOutcome {
            resolved: ResolvedDeadline {
                deadline,
                event: Some(GameweekEvent {
                    id: 9,
                    name: "Gameweek 9".into(),
                    deadline,
                    is_next: true,
                    ..Default::default()
                }),
            },
            status: FetchStatus::Ready,
            using_fallback: false,
            error_message: None,
            next_refresh: None,
        }
    }

    #[tokio::test]
    async fn loaded_deadline_starts_the_countdown() {
        let (mut app, _rx) = app();
        app.on_loading_changed(LoadingState { is_loading: true });
        assert_eq!(app.state.deadline.status, FetchStatus::Loading);

        app.on_deadline_loaded(outcome(now() + ChronoDuration::hours(25)), now());
        assert_eq!(app.state.deadline.status, FetchStatus::Ready);
        assert_eq!(
            app.state.countdown.remaining(),
            CountdownState { days: 1, hours: 1, minutes: 0, seconds: 0 }
        );
        assert!(app.state.deadline.fallback_notice().is_none());
        assert!(app.on_countdown_tick(now() + ChronoDuration::seconds(1)));
    }

    #[tokio::test]
    async fn fallback_outcome_surfaces_a_notice() {
        let (mut app, _rx) = app();
        let mut fallback = outcome(now() + ChronoDuration::days(3));
        fallback.using_fallback = true;
        fallback.error_message = Some("Network error. Using local fallback data.".into());

        app.on_deadline_loaded(fallback, now());
        let notice = app.state.deadline.fallback_notice().unwrap();
        assert!(notice.starts_with("Using simulated data"));
        assert!(notice.contains("Network error"));
        assert_ne!(app.state.deadline.status, FetchStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn passed_deadline_requests_a_refetch_an_hour_later() {
        let (mut app, mut rx) = app();
        let deadline = now() + ChronoDuration::seconds(2);
        app.on_deadline_loaded(outcome(deadline), now());

        assert!(app.on_countdown_tick(deadline));
        assert_eq!(app.state.countdown.phase(), TickerPhase::Passed);
        assert!(!app.on_countdown_tick(deadline + ChronoDuration::seconds(1)));

        sleep(PASSED_FOLLOW_UP_DELAY + Duration::from_secs(1)).await;
        let Ok(NetworkRequest::FetchDeadline { reason }) = rx.try_recv() else {
            panic!("expected a refetch request");
        };
        assert_eq!(reason, FetchReason::DeadlinePassed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timers() {
        let (mut app, mut rx) = app();
        let mut loaded = outcome(now());
        loaded.next_refresh = Some(now() + ChronoDuration::minutes(5));
        app.on_deadline_loaded(loaded, now());
        assert!(app.state.auto_refresh.is_armed());
        assert!(app.state.countdown.has_pending_follow_up());

        app.shutdown();
        sleep(PASSED_FOLLOW_UP_DELAY * 2).await;
        assert!(rx.try_recv().is_err());
        assert!(app.team_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn proxy_refresh_time_arms_auto_refresh_until_toggled_off() {
        let (mut app, mut rx) = app();
        let mut loaded = outcome(now() + ChronoDuration::days(2));
        loaded.next_refresh = Some(now() + ChronoDuration::minutes(15));
        app.on_deadline_loaded(loaded, now());
        assert!(app.state.auto_refresh.is_armed());

        app.toggle_auto_refresh(now());
        assert!(!app.state.auto_refresh.is_enabled());
        sleep(Duration::from_secs(3600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn team_id_comes_from_the_session() {
        let (app, _rx) = app();
        assert_eq!(app.team_id().as_deref(), Some("98765"));
    }

    #[tokio::test]
    async fn error_before_any_deadline_marks_failed() {
        let (mut app, _rx) = app();
        app.on_error("Deadline fetch crashed.".into());
        assert_eq!(app.state.deadline.status, FetchStatus::Failed);

        app.on_deadline_loaded(outcome(now() + ChronoDuration::days(1)), now());
        app.on_error("Deadline fetch crashed.".into());
        assert_eq!(app.state.deadline.status, FetchStatus::Ready);
    }

    #[tokio::test]
    async fn crashed_refetch_does_not_leave_a_stale_loading_status() {
        let (mut app, _rx) = app();
        app.on_deadline_loaded(outcome(now() + ChronoDuration::days(1)), now());

        app.on_loading_changed(LoadingState { is_loading: true });
        assert_eq!(app.state.deadline.status, FetchStatus::Loading);

        app.on_error("Deadline fetch crashed.".into());
        app.on_loading_changed(LoadingState { is_loading: false });
        assert_eq!(app.state.deadline.status, FetchStatus::Ready);
        assert!(app.state.deadline.resolved.is_some());
        assert_eq!(app.state.last_error.as_deref(), Some("Deadline fetch crashed."));
    }
}
