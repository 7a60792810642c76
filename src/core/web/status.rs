use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::WEB_TIMEOUT;
use crate::core::http::RemoteSource;

pub const STATUS_URLS: &[&str] = &[
    "https://api.mistxi.com/status.php",
    "http://api.mistxi.com/status.php",
];

/// Keys tried in order, first at the top level and then under `data`.
const PLAYER_COUNT_KEYS: &[&str] = &[
    "onlinePlayers",
    "players_online",
    "playersOnline",
    "online",
    "players",
    "count",
];

fn first_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").expect("static regex"))
}

fn count_in(object: &serde_json::Map<String, Value>) -> Option<i64> {
    PLAYER_COUNT_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_i64))
}

/// Pull a player count out of whatever the status endpoint returned.
pub fn parse_players_online(body: &str) -> Option<i64> {
    if let Ok(Value::Object(root)) = serde_json::from_str::<Value>(body) {
        if let Some(n) = count_in(&root) {
            return Some(n);
        }
        if let Some(Value::Object(data)) = root.get("data") {
            if let Some(n) = count_in(data) {
                return Some(n);
            }
        }
    }

    if let Ok(n) = body.trim().parse::<i64>() {
        return Some(n);
    }

    first_number()
        .captures(body)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reads the server's online player count.
#[derive(Clone)]
pub struct StatusClient {
    remote: Arc<dyn RemoteSource>,
}

impl StatusClient {
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        Self { remote }
    }

    /// `None` when every endpoint failed or said nothing usable.
    pub async fn players_online(&self) -> Option<i64> {
        for url in STATUS_URLS {
            let body = match tokio::time::timeout(WEB_TIMEOUT, self.remote.get_text(url)).await {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => {
                    debug!("Status fetch {} failed: {}", url, e);
                    continue;
                }
                Err(_) => {
                    debug!("Status fetch {} timed out", url);
                    continue;
                }
            };
            if let Some(n) = parse_players_online(&body) {
                return Some(n);
            }
        }
        None
    }
}
