// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ProviderError, Result};
use crate::normalize::ensure_sequence;
use crate::wire::{RawAlbum, RawAlbumMatch, RawTopAlbum, RawTrackMatch};
use futures::future::join_all;
use moka::sync::Cache;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showcase_domain::{AlbumDetail, AlbumSummary, TrackSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, trace, warn};

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = concat!("showcase/", env!("CARGO_PKG_VERSION"));

/// How many top albums `artist.gettopalbums` is asked for by default.
pub const DEFAULT_TOP_ALBUMS_LIMIT: u32 = 50;

/// What a per-album detail failure does to a fan-out batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentPolicy {
    /// Log the failure and keep the rest of the batch.
    #[default]
    Tolerant,
    /// Abort the whole top-albums batch on the first failure.
    Strict,
}

/// Last.fm API client.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct LastFmClient {
    api_key: String,
    client: Client,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    cache_album: Option<Cache<(String, String), RawAlbum>>,
    enrichment_policy: EnrichmentPolicy,
}

impl LastFmClient {
    /// Creates a client against the public endpoint with default limits.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> LastFmClientBuilder {
        LastFmClientBuilder::default()
    }

    pub fn enrichment_policy(&self) -> EnrichmentPolicy {
        self.enrichment_policy
    }

    /// Searches albums by title.
    ///
    /// Every match is looked up once more through `album.getinfo` to resolve its
    /// release year. A failed lookup only costs that album its year.
    #[instrument(skip(self))]
    pub async fn search_albums(&self, term: &str) -> Result<Vec<AlbumSummary>> {
        let response = self.call("album.search", &[("album", term)]).await?;
        let Some(matches) = response
            .pointer("/results/albummatches")
            .filter(|matches| matches.is_object())
        else {
            debug!(target: "lastfm", "album search returned no matches");
            return Ok(Vec::new());
        };

        let albums: Vec<AlbumSummary> = decode_all::<RawAlbumMatch>(matches.get("album"))?
            .into_iter()
            .map(AlbumSummary::from)
            .collect();

        let enriched = join_all(albums.into_iter().map(|album| self.with_year(album))).await;
        Ok(enriched)
    }

    /// Searches tracks by title. No per-track enrichment is performed.
    #[instrument(skip(self))]
    pub async fn search_tracks(&self, term: &str) -> Result<Vec<TrackSummary>> {
        let response = self.call("track.search", &[("track", term)]).await?;
        let Some(matches) = response
            .pointer("/results/trackmatches")
            .filter(|matches| matches.is_object())
        else {
            debug!(target: "lastfm", "track search returned no matches");
            return Ok(Vec::new());
        };

        Ok(decode_all::<RawTrackMatch>(matches.get("track"))?
            .into_iter()
            .map(TrackSummary::from)
            .collect())
    }

    /// Fetches one album. `Ok(None)` means the provider had no album payload.
    ///
    /// Raw payloads are cached; simulated track playcounts are drawn fresh on
    /// every call.
    #[instrument(skip(self))]
    pub async fn get_album_detail(&self, artist: &str, album: &str) -> Result<Option<AlbumDetail>> {
        let cache_key = (artist.to_string(), album.to_string());
        let cached = self
            .cache_album
            .as_ref()
            .and_then(|cache| cache.get(&cache_key));

        let raw = match cached {
            Some(raw) => raw,
            None => {
                let response = self
                    .call("album.getinfo", &[("artist", artist), ("album", album)])
                    .await?;
                let Some(payload) = response.get("album").filter(|payload| payload.is_object())
                else {
                    debug!(target: "lastfm", "album.getinfo returned no album payload");
                    return Ok(None);
                };
                let raw: RawAlbum = serde_json::from_value(payload.clone())?;
                if let Some(cache) = &self.cache_album {
                    cache.insert(cache_key, raw.clone());
                }
                raw
            }
        };

        let detail = raw.into_detail(&mut rand::thread_rng())?;
        Ok(Some(detail))
    }

    /// Fetches up to `limit` top albums for an artist and resolves each one.
    ///
    /// Albums the provider cannot resolve are dropped. Lookup errors follow the
    /// client's [`EnrichmentPolicy`].
    #[instrument(skip(self))]
    pub async fn get_artist_top_albums(&self, artist: &str, limit: u32) -> Result<Vec<AlbumDetail>> {
        let limit = limit.to_string();
        let response = self
            .call("artist.gettopalbums", &[("artist", artist), ("limit", &limit)])
            .await?;
        let stubs = decode_all::<RawTopAlbum>(response.pointer("/topalbums/album"))?;
        if stubs.is_empty() {
            return Ok(Vec::new());
        }

        let lookups = join_all(
            stubs
                .iter()
                .map(|stub| self.get_album_detail(&stub.artist, &stub.name)),
        )
        .await;

        let mut albums = Vec::with_capacity(lookups.len());
        for (stub, lookup) in stubs.iter().zip(lookups) {
            match lookup {
                Ok(Some(album)) => albums.push(album),
                Ok(None) => {
                    debug!(target: "lastfm", album = %stub.name, "top album has no detail, skipping");
                }
                Err(error) if self.enrichment_policy == EnrichmentPolicy::Strict => {
                    return Err(error);
                }
                Err(error) => {
                    warn!(target: "lastfm", album = %stub.name, error = %error, "failed to resolve top album");
                }
            }
        }

        Ok(albums)
    }

    async fn with_year(&self, mut album: AlbumSummary) -> AlbumSummary {
        match self.get_album_detail(&album.artist, &album.name).await {
            Ok(Some(detail)) => album.year = detail.year,
            Ok(None) => {}
            Err(error) => {
                warn!(
                    target: "lastfm",
                    album = %album.name,
                    error = %error,
                    "failed to fetch album details for year"
                );
            }
        }
        album
    }

    /// Performs one rate-limited API call and returns the decoded JSON body.
    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| ProviderError::RateLimiterClosed)?;

        trace!(target: "lastfm", method, "GET {}", self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        debug!(target: "lastfm", method, "response status: {}", status);
        let body = response.text().await?;
        parse_lastfm_body(status, &body)
    }
}

/// Builder for configuring a Last.fm client.
#[derive(Debug)]
pub struct LastFmClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_concurrent_requests: usize,
    cache_capacity: u64,
    enrichment_policy: EnrichmentPolicy,
}

impl Default for LastFmClientBuilder {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: LASTFM_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            max_concurrent_requests: 4,
            cache_capacity: 1_000,
            enrichment_policy: EnrichmentPolicy::default(),
        }
    }
}

impl LastFmClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set a custom base URL (useful for testing with mock servers).
    /// An empty value keeps the public endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if url.trim().is_empty() {
            warn!(target: "lastfm", "empty base URL configured, using {}", LASTFM_API_BASE);
        } else {
            self.base_url = url;
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upper bound on simultaneous provider requests during fan-out.
    pub fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max.max(1);
        self
    }

    /// Number of raw album payloads kept in memory. Zero disables the cache.
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn enrichment_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.enrichment_policy = policy;
        self
    }

    pub fn build(self) -> Result<LastFmClient> {
        if self.api_key.trim().is_empty() {
            warn!(target: "lastfm", "no Last.fm API key configured; requests will be rejected");
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(LastFmClient {
            api_key: self.api_key,
            client,
            base_url: self.base_url,
            rate_limiter: Arc::new(Semaphore::new(self.max_concurrent_requests)),
            cache_album: (self.cache_capacity > 0).then(|| Cache::new(self.cache_capacity)),
            enrichment_policy: self.enrichment_policy,
        })
    }
}

/// Decodes a list-or-object field into typed records.
fn decode_all<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>> {
    ensure_sequence(value)
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ProviderError::from))
        .collect()
}

/// Last.fm reports API failures as `{ "error": <code>, "message": "..." }`,
/// sometimes with a 200 status.
fn parse_lastfm_body(status: StatusCode, body: &str) -> Result<Value> {
    let parsed = serde_json::from_str::<Value>(body);

    if let Ok(value) = &parsed {
        if let Some(code) = value.get("error").filter(|code| is_set(code)) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or("An error occurred with the Last.fm API.")
                .to_string();
            return Err(ProviderError::Api {
                code: code.as_i64(),
                message,
            });
        }
    }

    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status,
            body: body.to_string(),
        });
    }

    Ok(parsed?)
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}
