use crate::fpl::{BootstrapResponse, FplEvent};
use crate::{DeadlineFeed, GameweekEvent};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const FPL_BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the gameweek deadline feed, either the public FPL endpoint or a
/// backend proxy serving the same payload.
#[derive(Debug, Clone)]
pub struct FplApi {
    client: Client,
    url: String,
    timeout: Duration,
}

impl Default for FplApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("fpltui/0.1 (terminal deadline countdown)")
                .build()
                .unwrap_or_default(),
            url: FPL_BOOTSTRAP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Timeout(String),
    Network(reqwest::Error, String),
    Server(u16, String),
    Malformed(String, String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Timeout(url) => write!(f, "Request timed out for {url}"),
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Server(status, url) => write!(f, "API error for {url}: status {status}"),
            ApiError::Malformed(msg, url) => write!(f, "Parse error for {url}: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl FplApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different endpoint, e.g. a backend proxy route.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the gameweek list (and a proxy-declared refresh time, if any).
    pub async fn fetch_deadline_feed(&self) -> ApiResult<DeadlineFeed> {
        let raw: BootstrapResponse = self.get(&self.url).await?;
        Ok(DeadlineFeed {
            events: raw.events.into_iter().filter_map(map_event).collect(),
            next_refresh: raw.next_refresh,
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server(status.as_u16(), url.to_owned()));
        }

        let body = response.bytes().await.map_err(|e| map_transport_error(e, url))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(e.to_string(), url.to_owned()))
    }
}

fn map_transport_error(e: reqwest::Error, url: &str) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout(url.to_owned())
    } else {
        ApiError::Network(e, url.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Mapping: FPL wire types → clean domain types
// ---------------------------------------------------------------------------

/// Gameweeks without a deadline can't be counted down to; drop them.
fn map_event(raw: FplEvent) -> Option<GameweekEvent> {
    let deadline = raw.deadline_time?;
    let name = if raw.name.is_empty() { format!("Gameweek {}", raw.id) } else { raw.name };
    Some(GameweekEvent {
        id: raw.id,
        name,
        deadline,
        is_current: raw.is_current,
        is_next: raw.is_next,
        finished: raw.finished,
        average_points: raw.average_points,
    })
}
