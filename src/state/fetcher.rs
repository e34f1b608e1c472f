use chrono::{DateTime, Utc};
use fpl_api::client::{ApiError, ApiResult, FplApi};
use fpl_api::{DeadlineFeed, ResolvedDeadline, fallback_events, resolve};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Anything that can produce the gameweek list. `FplApi` in production;
/// tests plug in canned or never-completing sources.
pub trait DeadlineSource: Send + Sync {
    fn fetch_feed(&self) -> BoxFuture<'_, ApiResult<DeadlineFeed>>;
    fn endpoint(&self) -> &str;
}

impl DeadlineSource for FplApi {
    fn fetch_feed(&self) -> BoxFuture<'_, ApiResult<DeadlineFeed>> {
        self.fetch_deadline_feed().boxed()
    }

    fn endpoint(&self) -> &str {
        self.url()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl FetchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FetchStatus::Idle => "Idle",
            FetchStatus::Loading => "Loading",
            FetchStatus::Ready => "Ready",
            FetchStatus::Failed => "Failed",
        }
    }
}

/// Result of one fetch cycle. A failed fetch still yields a deadline, resolved
/// from fallback data.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub resolved: ResolvedDeadline,
    pub status: FetchStatus,
    pub using_fallback: bool,
    pub error_message: Option<String>,
    pub next_refresh: Option<DateTime<Utc>>,
}

pub struct DeadlineFetcher {
    source: Arc<dyn DeadlineSource>,
    timeout: Duration,
}

impl DeadlineFetcher {
    pub fn new(source: Arc<dyn DeadlineSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Fetch and resolve the active deadline. Never fails: timeouts, network
    /// errors, bad statuses and unreadable payloads all degrade to fallback
    /// data plus a human-readable reason.
    pub async fn fetch(&self) -> FetchOutcome {
        debug!("fetching gameweek deadline data from {}", self.source.endpoint());

        let result = match tokio::time::timeout(self.timeout, self.source.fetch_feed()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.source.endpoint().to_owned())),
        };

        let now = Utc::now();
        match result {
            Ok(feed) => {
                let resolved = resolve(&feed.events, now);
                info!(
                    "gameweek data fetched ({} events), deadline {} ({})",
                    feed.events.len(),
                    resolved.deadline,
                    resolved.title()
                );
                FetchOutcome {
                    resolved,
                    status: FetchStatus::Ready,
                    using_fallback: false,
                    error_message: None,
                    next_refresh: feed.next_refresh,
                }
            }
            Err(err) => {
                error!("{err}");
                warn!("using fallback gameweek data");
                FetchOutcome {
                    resolved: resolve(&fallback_events(now), now),
                    status: FetchStatus::Ready,
                    using_fallback: true,
                    error_message: Some(failure_message(&err)),
                    next_refresh: None,
                }
            }
        }
    }
}

/// User-facing reason shown next to the fallback notice.
pub fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Timeout(_) => {
            "Request to Fantasy Premier League API timed out. Using fallback data.".to_string()
        }
        ApiError::Network(..) => "Network error. Using local fallback data.".to_string(),
        ApiError::Server(status, _) => format!(
            "Failed to fetch gameweek data. API responded with: {status}. Using fallback data."
        ),
        ApiError::Malformed(..) => {
            "Gameweek data from the API could not be read. Using fallback data.".to_string()
        }
    }
}
