// SPDX-License-Identifier: GPL-3.0-or-later

//! Ordered and filtered projections of the store's collections.
//!
//! Every function takes a borrowed collection and returns a new `Vec`; the
//! input order is never touched. Sorts are stable, so equal keys keep their
//! original relative order.

use std::cmp::Ordering;

use showcase_domain::{
    parse_count, AlbumDetail, AlbumSummary, ArtistSortOption, FavouriteAlbum, FavouriteTrack,
    FavouritesSortOption, SearchResultsSortOption, Track, TrackSortOption, TrackSummary,
};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Stand-in year for a missing value when sorting newest first.
const YEAR_MISSING_DESC: &str = "0";
/// Stand-in year for a missing value when sorting oldest first.
const YEAR_MISSING_ASC: &str = "9999";

fn collation_key(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and accent-insensitive comparison, falling back to the raw strings
/// so the order stays total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn sorted_by<T: Clone>(items: &[T], compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(compare);
    sorted
}

fn year_or<'a>(year: &'a Option<String>, missing: &'a str) -> &'a str {
    year.as_deref().filter(|y| !y.is_empty()).unwrap_or(missing)
}

pub fn sort_album_results(
    albums: &[AlbumSummary],
    option: SearchResultsSortOption,
) -> Vec<AlbumSummary> {
    use SearchResultsSortOption::*;
    match option {
        NameAsc => sorted_by(albums, |a, b| locale_cmp(&a.name, &b.name)),
        NameDesc => sorted_by(albums, |a, b| locale_cmp(&b.name, &a.name)),
        ArtistAsc => sorted_by(albums, |a, b| locale_cmp(&a.artist, &b.artist)),
        ArtistDesc => sorted_by(albums, |a, b| locale_cmp(&b.artist, &a.artist)),
        YearDesc => sorted_by(albums, |a, b| {
            year_or(&b.year, YEAR_MISSING_DESC).cmp(year_or(&a.year, YEAR_MISSING_DESC))
        }),
        YearAsc => sorted_by(albums, |a, b| {
            year_or(&a.year, YEAR_MISSING_ASC).cmp(year_or(&b.year, YEAR_MISSING_ASC))
        }),
        // Albums carry no listener count.
        Relevance | ListenersAsc | ListenersDesc => albums.to_vec(),
    }
}

pub fn sort_track_results(
    tracks: &[TrackSummary],
    option: SearchResultsSortOption,
) -> Vec<TrackSummary> {
    use SearchResultsSortOption::*;
    match option {
        NameAsc => sorted_by(tracks, |a, b| locale_cmp(&a.name, &b.name)),
        NameDesc => sorted_by(tracks, |a, b| locale_cmp(&b.name, &a.name)),
        ArtistAsc => sorted_by(tracks, |a, b| locale_cmp(&a.artist, &b.artist)),
        ArtistDesc => sorted_by(tracks, |a, b| locale_cmp(&b.artist, &a.artist)),
        ListenersAsc => sorted_by(tracks, |a, b| {
            parse_count(&a.listeners).cmp(&parse_count(&b.listeners))
        }),
        ListenersDesc => sorted_by(tracks, |a, b| {
            parse_count(&b.listeners).cmp(&parse_count(&a.listeners))
        }),
        Relevance | YearDesc | YearAsc => tracks.to_vec(),
    }
}

pub fn sort_artist_albums(albums: &[AlbumDetail], option: ArtistSortOption) -> Vec<AlbumDetail> {
    match option {
        ArtistSortOption::ReleaseDesc => sorted_by(albums, |a, b| {
            year_or(&b.year, YEAR_MISSING_DESC).cmp(year_or(&a.year, YEAR_MISSING_DESC))
        }),
        ArtistSortOption::ReleaseAsc => sorted_by(albums, |a, b| {
            year_or(&a.year, YEAR_MISSING_ASC).cmp(year_or(&b.year, YEAR_MISSING_ASC))
        }),
        ArtistSortOption::NameAsc => sorted_by(albums, |a, b| locale_cmp(&a.name, &b.name)),
        ArtistSortOption::NameDesc => sorted_by(albums, |a, b| locale_cmp(&b.name, &a.name)),
    }
}

pub fn sort_album_tracks(tracks: &[Track], option: TrackSortOption) -> Vec<Track> {
    let playcount = |track: &Track| track.playcount.unwrap_or(0);
    match option {
        TrackSortOption::RankAsc => sorted_by(tracks, |a, b| a.rank.cmp(&b.rank)),
        TrackSortOption::NameAsc => sorted_by(tracks, |a, b| locale_cmp(&a.name, &b.name)),
        TrackSortOption::NameDesc => sorted_by(tracks, |a, b| locale_cmp(&b.name, &a.name)),
        TrackSortOption::DurationAsc => sorted_by(tracks, |a, b| {
            parse_count(&a.duration).cmp(&parse_count(&b.duration))
        }),
        TrackSortOption::DurationDesc => sorted_by(tracks, |a, b| {
            parse_count(&b.duration).cmp(&parse_count(&a.duration))
        }),
        TrackSortOption::PlaycountAsc => sorted_by(tracks, |a, b| playcount(a).cmp(&playcount(b))),
        TrackSortOption::PlaycountDesc => {
            sorted_by(tracks, |a, b| playcount(b).cmp(&playcount(a)))
        }
    }
}

pub fn sort_favourite_tracks(
    favourites: &[FavouriteTrack],
    option: FavouritesSortOption,
) -> Vec<FavouriteTrack> {
    use FavouritesSortOption::*;
    sorted_by(favourites, |a, b| match option {
        DateDesc => b.date_added.cmp(&a.date_added),
        DateAsc => a.date_added.cmp(&b.date_added),
        NameAsc => locale_cmp(&a.track.name, &b.track.name),
        NameDesc => locale_cmp(&b.track.name, &a.track.name),
        ArtistAsc => locale_cmp(&a.track.artist, &b.track.artist),
        ArtistDesc => locale_cmp(&b.track.artist, &a.track.artist),
        AlbumAsc => locale_cmp(&a.track.album_name, &b.track.album_name),
        AlbumDesc => locale_cmp(&b.track.album_name, &a.track.album_name),
    })
}

pub fn sort_favourite_albums(
    favourites: &[FavouriteAlbum],
    option: FavouritesSortOption,
) -> Vec<FavouriteAlbum> {
    use FavouritesSortOption::*;
    match option {
        DateDesc => sorted_by(favourites, |a, b| b.date_added.cmp(&a.date_added)),
        DateAsc => sorted_by(favourites, |a, b| a.date_added.cmp(&b.date_added)),
        NameAsc => sorted_by(favourites, |a, b| locale_cmp(&a.album.name, &b.album.name)),
        NameDesc => sorted_by(favourites, |a, b| locale_cmp(&b.album.name, &a.album.name)),
        ArtistAsc => sorted_by(favourites, |a, b| locale_cmp(&a.album.artist, &b.album.artist)),
        ArtistDesc => sorted_by(favourites, |a, b| locale_cmp(&b.album.artist, &a.album.artist)),
        AlbumAsc | AlbumDesc => favourites.to_vec(),
    }
}

fn matches_filter(needle: &str, fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Keeps favourite tracks whose name, artist or album contains `filter`,
/// ignoring case. An empty filter keeps everything.
pub fn filter_favourite_tracks(
    favourites: &[FavouriteTrack],
    filter: &str,
) -> Vec<FavouriteTrack> {
    if filter.is_empty() {
        return favourites.to_vec();
    }
    let needle = filter.to_lowercase();
    favourites
        .iter()
        .filter(|f| {
            matches_filter(
                &needle,
                &[
                    f.track.name.as_str(),
                    f.track.artist.as_str(),
                    f.track.album_name.as_str(),
                ],
            )
        })
        .cloned()
        .collect()
}

pub fn filter_favourite_albums(
    favourites: &[FavouriteAlbum],
    filter: &str,
) -> Vec<FavouriteAlbum> {
    if filter.is_empty() {
        return favourites.to_vec();
    }
    let needle = filter.to_lowercase();
    favourites
        .iter()
        .filter(|f| matches_filter(&needle, &[f.album.name.as_str(), f.album.artist.as_str()]))
        .cloned()
        .collect()
}
