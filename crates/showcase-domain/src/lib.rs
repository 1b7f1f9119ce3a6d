// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Images
// ============================================================================

/// Size label attached to a provider image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
    /// Any label outside the four known sizes (`mega`, empty string, ...).
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL. Older snapshots stored this under the provider's `#text` key.
    #[serde(alias = "#text")]
    pub url: String,
    #[serde(default)]
    pub size: ImageSize,
}

impl Image {
    pub fn new(url: impl Into<String>, size: ImageSize) -> Self {
        Self {
            url: url.into(),
            size,
        }
    }
}

/// Picks the best available artwork: extralarge, then large, then medium.
/// Entries with an empty URL are skipped; `fallback` is returned when nothing matches.
pub fn best_image_url<'a>(images: &'a [Image], fallback: &'a str) -> &'a str {
    [ImageSize::ExtraLarge, ImageSize::Large, ImageSize::Medium]
        .iter()
        .find_map(|size| {
            images
                .iter()
                .find(|image| image.size == *size && !image.url.is_empty())
        })
        .map(|image| image.url.as_str())
        .unwrap_or(fallback)
}

// ============================================================================
// Search & Views
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Album,
    Track,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    pub search_type: SearchType,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            term: term.into(),
            search_type,
        }
    }

    /// A query is only dispatched when the term has visible characters.
    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty()
    }
}

/// Top-level view selection, independent of any album/artist detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Search,
    Favourites,
}

/// Which collection the favourites view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavouritesTab {
    #[default]
    Tracks,
    Albums,
}

// ============================================================================
// Catalog Records
// ============================================================================

/// Lightweight album record produced by album search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub name: String,
    pub artist: String,
    pub url: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
    /// Release year, resolved from the album's wiki text when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Lightweight track record produced by track search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub name: String,
    pub artist: String,
    pub url: String,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Listener count as the provider reports it (string-encoded integer).
    pub listeners: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wiki {
    /// Free-text timestamp such as `"25 Mar 2013, 15:47"`.
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
}

/// A track within an album detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Length in seconds, string-encoded.
    pub duration: String,
    pub url: String,
    pub artist: String,
    /// Simulated popularity figure. Never authoritative provider data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playcount: Option<u64>,
    pub rank: u32,
}

/// Full album record as shown on the album page.
///
/// `tracks` and `tags` are always sequences, whatever shape the provider sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetail {
    pub name: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
    pub url: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub listeners: String,
    pub playcount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki: Option<Wiki>,
}

// ============================================================================
// Identifiers & Favourites
// ============================================================================

/// Composite identity of an album: `artist-album`.
pub fn album_id(artist: &str, album: &str) -> String {
    format!("{artist}-{album}")
}

/// Composite identity of a track: `artist-album-track`.
pub fn track_id(artist: &str, album: &str, track: &str) -> String {
    format!("{artist}-{album}-{track}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackIdentifier {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album_name: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub url: String,
}

impl TrackIdentifier {
    pub fn new(
        artist: impl Into<String>,
        album_name: impl Into<String>,
        name: impl Into<String>,
        duration: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let artist = artist.into();
        let album_name = album_name.into();
        let name = name.into();
        Self {
            id: track_id(&artist, &album_name, &name),
            name,
            artist,
            album_name,
            duration: duration.into(),
            url: url.into(),
        }
    }

    pub fn from_album_track(album: &AlbumDetail, track: &Track) -> Self {
        Self::new(
            track.artist.clone(),
            album.name.clone(),
            track.name.clone(),
            track.duration.clone(),
            track.url.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumIdentifier {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(default, alias = "image")]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
}

impl AlbumIdentifier {
    pub fn new(
        artist: impl Into<String>,
        name: impl Into<String>,
        images: Vec<Image>,
        mbid: Option<String>,
    ) -> Self {
        let artist = artist.into();
        let name = name.into();
        Self {
            id: album_id(&artist, &name),
            name,
            artist,
            images,
            mbid,
        }
    }
}

impl From<&AlbumSummary> for AlbumIdentifier {
    fn from(album: &AlbumSummary) -> Self {
        Self::new(
            album.artist.clone(),
            album.name.clone(),
            album.images.clone(),
            album.mbid.clone(),
        )
    }
}

impl From<&AlbumDetail> for AlbumIdentifier {
    fn from(album: &AlbumDetail) -> Self {
        Self::new(
            album.artist.clone(),
            album.name.clone(),
            album.images.clone(),
            album.mbid.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteTrack {
    #[serde(flatten)]
    pub track: TrackIdentifier,
    /// Epoch milliseconds.
    pub date_added: i64,
}

impl FavouriteTrack {
    pub fn id(&self) -> &str {
        &self.track.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteAlbum {
    #[serde(flatten)]
    pub album: AlbumIdentifier,
    /// Epoch milliseconds.
    pub date_added: i64,
}

impl FavouriteAlbum {
    pub fn id(&self) -> &str {
        &self.album.id
    }
}

// ============================================================================
// Sort Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} sort option: {value}")]
pub struct ParseSortOptionError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! sort_option {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseSortOptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseSortOptionError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

sort_option! {
    /// Ordering of an artist's top albums.
    ArtistSortOption, "artist", default = ReleaseDesc {
        ReleaseDesc => "release_desc",
        ReleaseAsc => "release_asc",
        NameAsc => "name_asc",
        NameDesc => "name_desc",
    }
}

sort_option! {
    /// Ordering of the favourites view. `album_*` keys only apply to tracks.
    FavouritesSortOption, "favourites", default = DateDesc {
        DateDesc => "date_desc",
        DateAsc => "date_asc",
        NameAsc => "name_asc",
        NameDesc => "name_desc",
        ArtistAsc => "artist_asc",
        ArtistDesc => "artist_desc",
        AlbumAsc => "album_asc",
        AlbumDesc => "album_desc",
    }
}

sort_option! {
    /// Ordering of an album's track list.
    TrackSortOption, "track", default = RankAsc {
        RankAsc => "rank_asc",
        NameAsc => "name_asc",
        NameDesc => "name_desc",
        DurationAsc => "duration_asc",
        DurationDesc => "duration_desc",
        PlaycountAsc => "playcount_asc",
        PlaycountDesc => "playcount_desc",
    }
}

sort_option! {
    /// Ordering of search results. `relevance` keeps the provider's order.
    SearchResultsSortOption, "search results", default = Relevance {
        Relevance => "relevance",
        NameAsc => "name_asc",
        NameDesc => "name_desc",
        ArtistAsc => "artist_asc",
        ArtistDesc => "artist_desc",
        ListenersAsc => "listeners_asc",
        ListenersDesc => "listeners_desc",
        YearDesc => "year_desc",
        YearAsc => "year_asc",
    }
}

impl FavouritesSortOption {
    /// Keys that only make sense for favourite tracks.
    pub fn is_track_only(&self) -> bool {
        matches!(self, Self::AlbumAsc | Self::AlbumDesc)
    }
}

// ============================================================================
// Formatting Helpers
// ============================================================================

/// Parses the leading integer of a string-encoded count (`"1234"`, `" 42 plays"`).
/// Anything without leading digits is treated as zero.
pub fn parse_count(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Renders a seconds string as `m:ss`; zero or unparseable durations render as `-`.
pub fn format_duration(seconds: &str) -> String {
    let seconds = parse_count(seconds);
    if seconds <= 0 {
        return "-".to_string();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
