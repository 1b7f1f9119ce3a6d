// SPDX-License-Identifier: GPL-3.0-or-later

//! Favourites snapshot stored in durable storage, and its migration.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showcase_domain::{AlbumIdentifier, FavouriteAlbum, FavouriteTrack, TrackIdentifier};
use showcase_infrastructure::DurableStorage;
use tracing::{info, warn};

/// Current shape of the persisted snapshot.
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_STORAGE_KEY: &str = "music-explorer-favourites";

/// Spacing between synthesized `dateAdded` values, index 0 newest.
const MIGRATION_STAGGER_MS: i64 = 1000;

/// The only part of the explorer state that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouritesSnapshot {
    pub favourites: Vec<FavouriteTrack>,
    pub favourite_albums: Vec<FavouriteAlbum>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionedSnapshot<'a> {
    version: u32,
    favourites: &'a [FavouriteTrack],
    favourite_albums: &'a [FavouriteAlbum],
}

/// A favourite as it may appear in older snapshots, possibly without `dateAdded`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFavourite<T> {
    #[serde(flatten)]
    item: T,
    #[serde(default)]
    date_added: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    favourites: Vec<Value>,
    #[serde(default)]
    favourite_albums: Vec<Value>,
}

/// Reads each entry on its own so one damaged favourite does not take the rest
/// with it.
fn readable_entries<T: DeserializeOwned>(
    entries: Vec<Value>,
    list: &'static str,
) -> Vec<StoredFavourite<T>> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(
                    target: "storage",
                    list,
                    index,
                    error = %err,
                    "skipping unreadable favourite"
                );
                None
            }
        })
        .collect()
}

fn stagger<T>(items: Vec<StoredFavourite<T>>, now: i64) -> Vec<(T, i64)> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, stored)| {
            let date_added = match stored.date_added {
                Some(date) if date > 0 => date,
                _ => now - index as i64 * MIGRATION_STAGGER_MS,
            };
            (stored.item, date_added)
        })
        .collect()
}

fn migrate(stored: StoredSnapshot, now: i64) -> FavouritesSnapshot {
    if stored.version < SCHEMA_VERSION {
        info!(
            target: "storage",
            from = stored.version,
            to = SCHEMA_VERSION,
            "migrating favourites snapshot"
        );
    }

    let favourites = readable_entries::<TrackIdentifier>(stored.favourites, "favourites");
    let favourite_albums =
        readable_entries::<AlbumIdentifier>(stored.favourite_albums, "favouriteAlbums");

    FavouritesSnapshot {
        favourites: stagger(favourites, now)
            .into_iter()
            .map(|(track, date_added)| FavouriteTrack { track, date_added })
            .collect(),
        favourite_albums: stagger(favourite_albums, now)
            .into_iter()
            .map(|(album, date_added)| FavouriteAlbum { album, date_added })
            .collect(),
    }
}

/// Parses a stored blob. Snapshots written by the browser build are wrapped as
/// `{"state": {...}, "version": N}` and are accepted as well.
fn parse(blob: &str) -> Result<StoredSnapshot> {
    let mut value: Value = serde_json::from_str(blob).context("snapshot is not JSON")?;

    if let Some(Value::Object(mut inner)) = value.get_mut("state").map(Value::take) {
        if let Some(version) = value.get("version").cloned() {
            inner.entry("version").or_insert(version);
        }
        value = Value::Object(inner);
    }

    serde_json::from_value(value).context("snapshot has an unexpected shape")
}

/// Reads and migrates the snapshot under `key`. Missing or unreadable data yields
/// an empty snapshot.
pub fn load(storage: &dyn DurableStorage, key: &str, now: i64) -> FavouritesSnapshot {
    let blob = match storage.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return FavouritesSnapshot::default(),
        Err(err) => {
            warn!(target: "storage", key, error = %err, "failed to read favourites");
            return FavouritesSnapshot::default();
        }
    };

    match parse(&blob) {
        Ok(stored) => migrate(stored, now),
        Err(err) => {
            warn!(target: "storage", key, error = %err, "discarding unreadable favourites");
            FavouritesSnapshot::default()
        }
    }
}

/// Writes the current favourites under `key` at [`SCHEMA_VERSION`].
pub fn save(
    storage: &dyn DurableStorage,
    key: &str,
    favourites: &[FavouriteTrack],
    favourite_albums: &[FavouriteAlbum],
) -> Result<()> {
    let blob = serde_json::to_string(&VersionedSnapshot {
        version: SCHEMA_VERSION,
        favourites,
        favourite_albums,
    })?;
    storage.put(key, &blob)
}
