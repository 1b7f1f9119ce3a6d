// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use showcase_application::{MusicStore, StoreOptions};
use showcase_config::{load as load_config, ShowcaseConfig};
use showcase_domain::{
    best_image_url, format_duration, AlbumDetail, AlbumIdentifier, AlbumSummary,
    ArtistSortOption, FavouriteAlbum, FavouriteTrack, FavouritesSortOption, FavouritesTab,
    SearchResultsSortOption, SearchType, Track, TrackIdentifier, TrackSortOption, TrackSummary,
};
use showcase_infrastructure::init_storage;
use showcase_lastfm::LastFmClient;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Browse Last.fm albums and tracks and keep a local list of favourites.
#[derive(Parser, Debug)]
#[command(name = "showcase")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search albums (or tracks with --tracks)
    Search {
        term: String,
        #[arg(long)]
        tracks: bool,
        #[arg(long)]
        sort: Option<SearchResultsSortOption>,
    },
    /// Show one album and its track list
    Album {
        artist: String,
        album: String,
        #[arg(long)]
        sort: Option<TrackSortOption>,
    },
    /// Show an artist's top albums
    Artist {
        name: String,
        #[arg(long)]
        sort: Option<ArtistSortOption>,
    },
    /// Manage favourites
    Favourites {
        #[command(subcommand)]
        action: FavouritesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FavouritesCommand {
    List {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Option<FavouritesSortOption>,
        /// List favourite albums instead of tracks
        #[arg(long)]
        albums: bool,
    },
    AddAlbum {
        artist: String,
        album: String,
    },
    AddTrack {
        artist: String,
        album: String,
        track: String,
    },
    Remove {
        id: String,
        /// The id names a favourite album
        #[arg(long)]
        album: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let store = build_store(&config)?;
    let fallback_image = config.lastfm.default_image_url.as_str();

    match cli.command {
        Command::Search { term, tracks, sort } => {
            store.set_search_term(term);
            store.set_search_type(if tracks {
                SearchType::Track
            } else {
                SearchType::Album
            });
            store.execute_search().await;
            fail_on_error(&store)?;

            if let Some(sort) = sort {
                store.set_search_results_sort(sort);
            }
            if tracks {
                for track in store.sorted_track_results() {
                    println!("{}", track_result_line(&track));
                }
            } else {
                for album in store.sorted_album_results() {
                    println!("{}", album_result_line(&album, fallback_image));
                }
            }
        }
        Command::Album { artist, album, sort } => {
            let detail = fetch_album(&store, &artist, &album).await?;
            if let Some(sort) = sort {
                store.set_track_sort(sort);
            }
            print_album_header(&detail, fallback_image);
            for track in store.sorted_album_tracks() {
                println!("{}", track_line(&track));
            }
        }
        Command::Artist { name, sort } => {
            store.fetch_artist_details(&name).await;
            fail_on_error(&store)?;
            if let Some(sort) = sort {
                store.set_artist_sort(sort);
            }
            println!("{name}: top albums");
            for album in store.sorted_artist_albums() {
                println!(
                    "  {} ({})",
                    album.name,
                    album.year.as_deref().unwrap_or("unknown year")
                );
            }
        }
        Command::Favourites { action } => run_favourites(&store, action).await?,
    }

    Ok(())
}

async fn run_favourites(store: &MusicStore, action: FavouritesCommand) -> Result<()> {
    match action {
        FavouritesCommand::List {
            filter,
            sort,
            albums,
        } => {
            store.set_favourites_tab(if albums {
                FavouritesTab::Albums
            } else {
                FavouritesTab::Tracks
            });
            if let Some(sort) = sort {
                store.set_favourites_sort(sort);
            }
            if let Some(filter) = filter {
                store.set_favourites_filter(filter);
            }

            if albums {
                for favourite in store.visible_favourite_albums() {
                    println!("{}", favourite_album_line(&favourite));
                }
            } else {
                for favourite in store.visible_favourites() {
                    println!("{}", favourite_track_line(&favourite));
                }
            }
        }
        FavouritesCommand::AddAlbum { artist, album } => {
            let detail = fetch_album(store, &artist, &album).await?;
            let identifier = AlbumIdentifier::from(&detail);
            let id = identifier.id.clone();
            if store.add_favourite_album(identifier) {
                println!("added {id}");
            } else {
                println!("{id} is already a favourite");
            }
        }
        FavouritesCommand::AddTrack {
            artist,
            album,
            track,
        } => {
            let detail = fetch_album(store, &artist, &album).await?;
            let found = detail
                .tracks
                .iter()
                .find(|candidate| candidate.name.eq_ignore_ascii_case(&track))
                .ok_or_else(|| anyhow!("{album} by {artist} has no track named {track}"))?;
            let identifier = TrackIdentifier::from_album_track(&detail, found);
            let id = identifier.id.clone();
            if store.add_favourite(identifier) {
                println!("added {id}");
            } else {
                println!("{id} is already a favourite");
            }
        }
        FavouritesCommand::Remove { id, album } => {
            let present = if album {
                store.is_favourite_album(&id)
            } else {
                store.is_favourite(&id)
            };
            if !present {
                bail!("no favourite with id {id}");
            }
            if album {
                store.remove_favourite_album(&id);
            } else {
                store.remove_favourite(&id);
            }
            println!("removed {id}");
        }
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn build_store(config: &ShowcaseConfig) -> Result<MusicStore> {
    let client = LastFmClient::builder()
        .api_key(config.lastfm.api_key.clone())
        .base_url(config.lastfm.base_url.clone())
        .max_concurrent_requests(config.lastfm.max_concurrent_requests)
        .cache_capacity(config.lastfm.cache_capacity)
        .enrichment_policy(config.lastfm.enrichment_policy)
        .build()?;
    let storage = init_storage(config)?;
    info!(target: "cli", storage = %storage.directory().display(), "store ready");

    Ok(MusicStore::new(
        Arc::new(client),
        Arc::new(storage),
        StoreOptions::from(config),
    ))
}

fn fail_on_error(store: &MusicStore) -> Result<()> {
    match store.read(|state| state.error.clone()) {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}

async fn fetch_album(store: &MusicStore, artist: &str, album: &str) -> Result<AlbumDetail> {
    store.fetch_album_details(artist, album).await;
    fail_on_error(store)?;
    store
        .read(|state| state.selected_album().cloned())
        .ok_or_else(|| anyhow!("Last.fm has no album {album} by {artist}"))
}

fn print_album_header(album: &AlbumDetail, fallback_image: &str) {
    println!("{} by {}", album.name, album.artist);
    if let Some(year) = &album.year {
        println!("released {year}");
    }
    println!("listeners {}, plays {}", album.listeners, album.playcount);
    let tags: Vec<&str> = album.tags.iter().map(|tag| tag.name.as_str()).collect();
    if !tags.is_empty() {
        println!("tags: {}", tags.join(", "));
    }
    let artwork = best_image_url(&album.images, fallback_image);
    if !artwork.is_empty() {
        println!("artwork: {artwork}");
    }
}

fn album_result_line(album: &AlbumSummary, fallback_image: &str) -> String {
    let year = album.year.as_deref().unwrap_or("----");
    let artwork = best_image_url(&album.images, fallback_image);
    format!("{year}  {} - {}  {artwork}", album.artist, album.name)
        .trim_end()
        .to_string()
}

fn track_result_line(track: &TrackSummary) -> String {
    format!("{} - {} ({} listeners)", track.artist, track.name, track.listeners)
}

fn track_line(track: &Track) -> String {
    let plays = track
        .playcount
        .map(|plays| format!("  {plays} plays (simulated)"))
        .unwrap_or_default();
    format!(
        "{:>3}. {} [{}]{plays}",
        track.rank,
        track.name,
        format_duration(&track.duration)
    )
}

fn favourite_track_line(favourite: &FavouriteTrack) -> String {
    format!(
        "{}  ({} / {})",
        favourite.id(),
        favourite.track.album_name,
        format_duration(&favourite.track.duration)
    )
}

fn favourite_album_line(favourite: &FavouriteAlbum) -> String {
    format!("{}  ({})", favourite.id(), favourite.album.artist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use showcase_domain::{Image, ImageSize};

    fn track(playcount: Option<u64>) -> Track {
        Track {
            name: "One More Time".to_string(),
            duration: "320".to_string(),
            url: String::new(),
            artist: "Daft Punk".to_string(),
            playcount,
            rank: 1,
        }
    }

    #[test]
    fn test_track_line_labels_simulated_playcount() {
        assert_eq!(
            track_line(&track(Some(1200))),
            "  1. One More Time [5:20]  1200 plays (simulated)"
        );
        assert_eq!(track_line(&track(None)), "  1. One More Time [5:20]");
    }

    #[test]
    fn test_album_result_line_uses_fallback_artwork() {
        let mut album = AlbumSummary {
            name: "Discovery".to_string(),
            artist: "Daft Punk".to_string(),
            url: String::new(),
            images: vec![Image::new("s.png", ImageSize::Small)],
            mbid: None,
            year: Some("2001".to_string()),
        };
        assert_eq!(
            album_result_line(&album, "default.png"),
            "2001  Daft Punk - Discovery  default.png"
        );

        album.year = None;
        assert_eq!(album_result_line(&album, ""), "----  Daft Punk - Discovery");
    }

    #[test]
    fn test_cli_parses_sort_keys() {
        let cli = Cli::try_parse_from(["showcase", "search", "Daft Punk", "--sort", "year_desc"])
            .unwrap();
        match cli.command {
            Command::Search { term, tracks, sort } => {
                assert_eq!(term, "Daft Punk");
                assert!(!tracks);
                assert_eq!(sort, Some(SearchResultsSortOption::YearDesc));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["showcase", "album", "a", "b", "--sort", "loudest"]).is_err());
    }

    #[test]
    fn test_cli_parses_favourites_remove() {
        let cli = Cli::try_parse_from(["showcase", "favourites", "remove", "A-B", "--album"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Favourites {
                action: FavouritesCommand::Remove { album: true, .. }
            }
        ));
    }
}
