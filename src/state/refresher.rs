use crate::state::messages::{self, FetchReason, NetworkRequest};
use crate::state::tasks::{self, TaskHandle};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc;

/// Refetches the deadline at the refresh time a backend proxy declared.
/// At most one refresh is pending; any change to the schedule cancels it and
/// arms a new one from scratch.
pub struct AutoRefreshScheduler {
    network_requests: mpsc::Sender<NetworkRequest>,
    enabled: bool,
    next_refresh: Option<DateTime<Utc>>,
    pending: Option<TaskHandle>,
}

impl AutoRefreshScheduler {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>, enabled: bool) -> Self {
        Self { network_requests, enabled, next_refresh: None, pending: None }
    }

    pub fn configure(
        &mut self,
        next_refresh: Option<DateTime<Utc>>,
        enabled: bool,
        now: DateTime<Utc>,
    ) {
        if next_refresh == self.next_refresh && enabled == self.enabled {
            return;
        }

        self.cancel();
        self.next_refresh = next_refresh;
        self.enabled = enabled;

        if !enabled {
            debug!("auto-refresh disabled");
            return;
        }
        let Some(at) = next_refresh else {
            return;
        };

        let delay = (at - now).to_std().unwrap_or(Duration::ZERO);
        info!("auto-refresh armed for {at} (in {}s)", delay.as_secs());

        let network_requests = self.network_requests.clone();
        self.pending = Some(tasks::after(delay, move || {
            messages::request_fetch(&network_requests, FetchReason::Scheduled);
        }));
    }

    pub fn set_enabled(&mut self, enabled: bool, now: DateTime<Utc>) {
        self.configure(self.next_refresh, enabled, now);
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn next_refresh(&self) -> Option<DateTime<Utc>> {
        self.next_refresh
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_finished())
    }
}
