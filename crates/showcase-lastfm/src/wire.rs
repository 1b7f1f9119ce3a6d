// SPDX-License-Identifier: GPL-3.0-or-later

//! Raw Last.fm payload shapes and their conversion into domain records.

use crate::normalize::{ensure_sequence, extract_year, synthesize_playcount};
use rand::Rng;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use showcase_domain::{
    parse_count, AlbumDetail, AlbumSummary, Image, Tag, Track, TrackSummary, Wiki,
};

/// Accepts a bare item, a list, or nothing for a list-typed field.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    ensure_sequence(value.as_ref())
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
        .collect()
}

/// Counts arrive as `"123"`, `123` or `null` depending on the endpoint.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => u32::try_from(parse_count(&text)).ok(),
        _ => None,
    })
}

/// Artist is a plain string in search results and an object in top-album lists.
fn artist_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => name,
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbumMatch {
    name: String,
    #[serde(default, deserialize_with = "artist_name")]
    artist: String,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<Image>,
    #[serde(default)]
    mbid: Option<String>,
}

impl From<RawAlbumMatch> for AlbumSummary {
    fn from(raw: RawAlbumMatch) -> Self {
        Self {
            name: raw.name,
            artist: raw.artist,
            url: raw.url,
            images: raw.image,
            mbid: non_empty(raw.mbid),
            year: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrackMatch {
    name: String,
    #[serde(default, deserialize_with = "artist_name")]
    artist: String,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<Image>,
    #[serde(default, deserialize_with = "lenient_string")]
    listeners: String,
    #[serde(default)]
    mbid: Option<String>,
}

impl From<RawTrackMatch> for TrackSummary {
    fn from(raw: RawTrackMatch) -> Self {
        Self {
            name: raw.name,
            artist: raw.artist,
            url: raw.url,
            images: raw.image,
            listeners: raw.listeners,
            mbid: non_empty(raw.mbid),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTopAlbum {
    pub(crate) name: String,
    #[serde(default, deserialize_with = "artist_name")]
    pub(crate) artist: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawRank {
    #[serde(default, deserialize_with = "lenient_u32")]
    rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    duration: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "@attr", default)]
    attr: Option<RawRank>,
}

/// `album.getinfo` payload, cached before playcounts are synthesized.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAlbum {
    name: String,
    #[serde(default, deserialize_with = "artist_name")]
    artist: String,
    #[serde(default)]
    mbid: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<Image>,
    #[serde(default, deserialize_with = "lenient_string")]
    listeners: String,
    #[serde(default, deserialize_with = "lenient_string")]
    playcount: String,
    #[serde(default)]
    tracks: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(default)]
    wiki: Option<Wiki>,
}

impl RawAlbum {
    /// Builds the domain record, normalizing `tracks.track` and `tags.tag` to lists
    /// and attaching a fresh simulated playcount to every track.
    pub(crate) fn into_detail<R: Rng + ?Sized>(
        self,
        rng: &mut R,
    ) -> Result<AlbumDetail, serde_json::Error> {
        let total = parse_count(&self.playcount).max(0) as u64;

        let tracks = ensure_sequence(self.tracks.as_ref().and_then(|tracks| tracks.get("track")))
            .into_iter()
            .enumerate()
            .map(|(index, value)| -> Result<Track, serde_json::Error> {
                let raw: RawTrack = serde_json::from_value(value)?;
                let rank = raw
                    .attr
                    .and_then(|attr| attr.rank)
                    .unwrap_or(index as u32 + 1);
                Ok(Track {
                    name: raw.name,
                    duration: if raw.duration.is_empty() {
                        "0".to_string()
                    } else {
                        raw.duration
                    },
                    url: raw.url,
                    artist: self.artist.clone(),
                    playcount: Some(synthesize_playcount(total, index, rng)),
                    rank,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        let tags = ensure_sequence(self.tags.as_ref().and_then(|tags| tags.get("tag")))
            .into_iter()
            .map(serde_json::from_value::<Tag>)
            .collect::<Result<Vec<_>, _>>()?;

        let year = self
            .wiki
            .as_ref()
            .and_then(|wiki| extract_year(&wiki.published));

        Ok(AlbumDetail {
            name: self.name,
            artist: self.artist,
            mbid: non_empty(self.mbid),
            url: self.url,
            images: self.image,
            listeners: self.listeners,
            playcount: self.playcount,
            year,
            tracks,
            tags,
            wiki: self.wiki,
        })
    }
}
