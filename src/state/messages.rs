use crate::state::fetcher::FetchOutcome;
use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use log::warn;
use std::fmt;
use tokio::sync::mpsc;

/// Why a deadline fetch was requested. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    Startup,
    Manual,
    Scheduled,
    DeadlinePassed,
}

impl fmt::Display for FetchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchReason::Startup => "startup",
            FetchReason::Manual => "manual refetch",
            FetchReason::Scheduled => "scheduled refresh",
            FetchReason::DeadlinePassed => "deadline passed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    FetchDeadline { reason: FetchReason },
}

/// Queue a deadline fetch from a timer callback, where there is nobody to
/// await. Returns false, and logs, when the request could not be queued.
pub fn request_fetch(network_requests: &mpsc::Sender<NetworkRequest>, reason: FetchReason) -> bool {
    match network_requests.try_send(NetworkRequest::FetchDeadline { reason }) {
        Ok(()) => true,
        Err(e) => {
            warn!("dropped {reason} deadline fetch: {e}");
            false
        }
    }
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    /// Always carries a deadline; fetch failures arrive here as fallback data.
    DeadlineLoaded { outcome: FetchOutcome },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    CountdownTick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_fetch_queues_the_reason() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(request_fetch(&tx, FetchReason::Scheduled));
        let Ok(NetworkRequest::FetchDeadline { reason }) = rx.try_recv() else {
            panic!("expected a fetch request");
        };
        assert_eq!(reason, FetchReason::Scheduled);
    }

    #[tokio::test]
    async fn request_fetch_reports_full_and_closed_channels() {
        let (tx, rx) = mpsc::channel(1);
        assert!(request_fetch(&tx, FetchReason::DeadlinePassed));
        assert!(!request_fetch(&tx, FetchReason::DeadlinePassed));

        drop(rx);
        assert!(!request_fetch(&tx, FetchReason::Scheduled));
    }
}
