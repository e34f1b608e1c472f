/// Wire types for the FPL bootstrap-static feed.
/// Endpoint: https://fantasy.premierleague.com/api/bootstrap-static/
///
/// A backend proxy serves the same shape and may add `next_refresh`.
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Default, Debug)]
pub struct BootstrapResponse {
    #[serde(default)]
    pub events: Vec<FplEvent>,
    #[serde(default)]
    pub next_refresh: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default, Debug)]
pub struct FplEvent {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Null for gameweeks whose fixtures haven't been scheduled yet.
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub finished: bool,
    #[serde(default, alias = "average_entry_score")]
    pub average_points: i32,
}
