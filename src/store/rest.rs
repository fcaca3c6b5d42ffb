//! JSON-over-fetch leaderboard store (WASM only)
//!
//! Talks to a small REST backend: `/entries` for the append-only score
//! log and `/players/{name}` for the stats records. The backend cannot
//! push, so `subscribe` polls the top query on an interval; the
//! aggregation layer is a pure function of the snapshot either way.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{EntryId, LeaderboardStore, ScoreCallback, StoreError, Subscription, raw_fetch_limit};
use crate::leaderboard::aggregate::{PlayerStats, ScoreEntry};

/// How often a subscription re-polls the top query
const POLL_INTERVAL_MS: i32 = 3000;

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: EntryId,
}

/// REST-backed store handle
#[derive(Clone)]
pub struct RestLeaderboard {
    base_url: String,
}

impl RestLeaderboard {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn entries_url(&self, query: &str) -> String {
        format!("{}/entries?{}", self.base_url, query)
    }

    fn player_url(&self, player: &str) -> String {
        let encoded = js_sys::encode_uri_component(player);
        format!("{}/players/{}", self.base_url, String::from(encoded))
    }
}

#[async_trait(?Send)]
impl LeaderboardStore for RestLeaderboard {
    async fn append(&self, entry: ScoreEntry) -> Result<EntryId, StoreError> {
        let body = serde_json::to_string(&entry)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let request = build_request("POST", &format!("{}/entries", self.base_url), Some(&body))?;
        let response: IdResponse = fetch_json(request).await?;
        Ok(response.id)
    }

    async fn query_top_by_score(&self, limit: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        let url = self.entries_url(&format!("order=score&limit={}", raw_fetch_limit(limit)));
        fetch_json(build_request("GET", &url, None)?).await
    }

    fn subscribe(&self, limit: usize, callback: ScoreCallback) -> Result<Subscription, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Transport("no window".to_string()))?;

        let callback = Rc::new(callback);
        let store = self.clone();
        let poll = move || {
            let callback = callback.clone();
            let store = store.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match store.query_top_by_score(limit).await {
                    Ok(entries) => callback(entries),
                    Err(err) => log::warn!("Leaderboard poll failed: {}", err),
                }
            });
        };

        // First snapshot immediately, then on the interval
        poll();
        let closure = Closure::<dyn FnMut()>::new(poll);
        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                POLL_INTERVAL_MS,
            )
            .map_err(|err| StoreError::Transport(format!("setInterval failed: {:?}", err)))?;

        Ok(Subscription::new(move || {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(interval_id);
            }
            drop(closure);
        }))
    }

    async fn get_stats(&self, player: &str) -> Result<Option<PlayerStats>, StoreError> {
        let request = build_request("GET", &self.player_url(player), None)?;
        let response = send(request).await?;
        if response.status() == 404 {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn update_stats(&self, player: &str, stats: PlayerStats) -> Result<(), StoreError> {
        let body = serde_json::to_string(&stats)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let request = build_request("PUT", &self.player_url(player), Some(&body))?;
        let response = send(request).await?;
        if !response.ok() {
            return Err(StoreError::Transport(format!("HTTP {}", response.status())));
        }
        Ok(())
    }

    async fn query_by_player(
        &self,
        player: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let encoded = String::from(js_sys::encode_uri_component(player));
        let url = self.entries_url(&format!("player={}&limit={}", encoded, limit));
        fetch_json(build_request("GET", &url, None)?).await
    }

    async fn query_by_score_band(
        &self,
        min: u32,
        max: u32,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let url = self.entries_url(&format!(
            "min_score={}&max_score={}&limit={}",
            min, max, limit
        ));
        fetch_json(build_request("GET", &url, None)?).await
    }

    async fn query_by_recency(
        &self,
        since_ms: f64,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let url = self.entries_url(&format!(
            "since_ms={}&order=recency&limit={}",
            since_ms,
            raw_fetch_limit(limit)
        ));
        fetch_json(build_request("GET", &url, None)?).await
    }
}

fn build_request(method: &str, url: &str, body: Option<&str>) -> Result<Request, StoreError> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|err| StoreError::Transport(format!("bad request: {:?}", err)))?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|err| StoreError::Transport(format!("{:?}", err)))?;
    }
    Ok(request)
}

async fn send(request: Request) -> Result<Response, StoreError> {
    let window =
        web_sys::window().ok_or_else(|| StoreError::Transport("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|err| StoreError::Transport(format!("{:?}", err)))?;
    response
        .dyn_into::<Response>()
        .map_err(|_| StoreError::Transport("fetch did not yield a Response".to_string()))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    if !response.ok() {
        return Err(StoreError::Transport(format!("HTTP {}", response.status())));
    }
    let text_promise = response
        .text()
        .map_err(|err| StoreError::Transport(format!("{:?}", err)))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|err| StoreError::Transport(format!("{:?}", err)))?
        .as_string()
        .ok_or_else(|| StoreError::Corrupt("response body is not text".to_string()))?;
    serde_json::from_str(&text).map_err(|err| StoreError::Corrupt(err.to_string()))
}

async fn fetch_json<T: DeserializeOwned>(request: Request) -> Result<T, StoreError> {
    read_json(send(request).await?).await
}
