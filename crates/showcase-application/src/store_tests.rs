// SPDX-License-Identifier: GPL-3.0-or-later

//! Store behaviour against an in-process provider.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use showcase_domain::{
    album_id, AlbumDetail, AlbumIdentifier, AlbumSummary, AppView, ArtistSortOption,
    FavouritesSortOption, FavouritesTab, SearchResultsSortOption, SearchType, Track,
    TrackIdentifier, TrackSortOption, TrackSummary,
};
use showcase_infrastructure::{DurableStorage, InMemoryStorage};
use showcase_lastfm::ProviderError;
use tokio::sync::Notify;

use crate::persistence::DEFAULT_STORAGE_KEY;
use crate::provider::MetadataProvider;
use crate::state::ViewState;
use crate::store::{MusicStore, StoreOptions};

#[derive(Default)]
struct FakeProvider {
    albums: HashMap<String, Vec<AlbumSummary>>,
    tracks: HashMap<String, Vec<TrackSummary>>,
    details: HashMap<String, AlbumDetail>,
    top_albums: HashMap<String, Vec<AlbumDetail>>,
    /// Terms, album ids or artist names whose lookup fails.
    failing: HashSet<String>,
    /// Lookups that block until the gate is notified.
    gates: HashMap<String, Arc<Notify>>,
}

impl FakeProvider {
    async fn respond(&self, key: &str) -> Result<(), ProviderError> {
        if let Some(gate) = self.gates.get(key) {
            gate.notified().await;
        }
        if self.failing.contains(key) {
            return Err(ProviderError::Api {
                code: Some(6),
                message: "Invalid API key".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn search_albums(&self, term: &str) -> Result<Vec<AlbumSummary>, ProviderError> {
        self.respond(term).await?;
        Ok(self.albums.get(term).cloned().unwrap_or_default())
    }

    async fn search_tracks(&self, term: &str) -> Result<Vec<TrackSummary>, ProviderError> {
        self.respond(term).await?;
        Ok(self.tracks.get(term).cloned().unwrap_or_default())
    }

    async fn album_detail(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumDetail>, ProviderError> {
        let id = album_id(artist, album);
        self.respond(&id).await?;
        Ok(self.details.get(&id).cloned())
    }

    async fn artist_top_albums(
        &self,
        artist: &str,
        _limit: u32,
    ) -> Result<Vec<AlbumDetail>, ProviderError> {
        self.respond(artist).await?;
        Ok(self.top_albums.get(artist).cloned().unwrap_or_default())
    }
}

fn summary(name: &str, artist: &str) -> AlbumSummary {
    AlbumSummary {
        name: name.to_string(),
        artist: artist.to_string(),
        url: format!("https://www.last.fm/music/{artist}/{name}"),
        images: Vec::new(),
        mbid: None,
        year: None,
    }
}

fn detail(name: &str, artist: &str, year: Option<&str>) -> AlbumDetail {
    AlbumDetail {
        name: name.to_string(),
        artist: artist.to_string(),
        mbid: None,
        url: String::new(),
        images: Vec::new(),
        listeners: "100".to_string(),
        playcount: "1000".to_string(),
        year: year.map(str::to_string),
        tracks: vec![
            Track {
                name: "First".to_string(),
                duration: "200".to_string(),
                url: String::new(),
                artist: artist.to_string(),
                playcount: Some(150),
                rank: 1,
            },
            Track {
                name: "Second".to_string(),
                duration: "300".to_string(),
                url: String::new(),
                artist: artist.to_string(),
                playcount: Some(400),
                rank: 2,
            },
        ],
        tags: Vec::new(),
        wiki: None,
    }
}

fn daft_punk_provider() -> FakeProvider {
    let mut provider = FakeProvider::default();
    provider.albums.insert(
        "Daft Punk".to_string(),
        vec![
            summary("Discovery", "Daft Punk"),
            summary("Homework", "Daft Punk"),
        ],
    );
    provider.tracks.insert(
        "Daft Punk".to_string(),
        vec![TrackSummary {
            name: "Get Lucky".to_string(),
            artist: "Daft Punk".to_string(),
            url: String::new(),
            images: Vec::new(),
            listeners: "2000000".to_string(),
            mbid: None,
        }],
    );
    provider.details.insert(
        album_id("Daft Punk", "Discovery"),
        detail("Discovery", "Daft Punk", Some("2001")),
    );
    provider.top_albums.insert(
        "Daft Punk".to_string(),
        vec![
            detail("Homework", "Daft Punk", Some("1997")),
            detail("Discovery", "Daft Punk", Some("2001")),
        ],
    );
    provider
}

fn store_with(
    provider: FakeProvider,
    options: StoreOptions,
) -> (MusicStore, Arc<InMemoryStorage>) {
    let storage = Arc::new(InMemoryStorage::new());
    let store = MusicStore::new(Arc::new(provider), storage.clone(), options);
    (store, storage)
}

fn track_id(name: &str) -> TrackIdentifier {
    TrackIdentifier::new("Daft Punk", "Discovery", name, "320", "")
}

#[tokio::test]
async fn test_album_search_stores_results() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());

    store.execute_search().await;

    let state = store.snapshot();
    assert_eq!(state.album_results.len(), 2);
    assert!(!state.loading());
    assert_eq!(state.error, None);
    assert_eq!(state.view(), ViewState::SearchBrowsing);
}

#[tokio::test]
async fn test_track_search_uses_search_type() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());
    store.set_search_type(SearchType::Track);

    store.execute_search().await;

    let state = store.snapshot();
    assert!(state.album_results.is_empty());
    assert_eq!(state.track_results[0].name, "Get Lucky");
}

#[tokio::test]
async fn test_blank_term_is_ignored() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());
    store.execute_search().await;
    store.set_search_results_sort(SearchResultsSortOption::NameDesc);

    store.set_search_term("   ");
    store.execute_search().await;

    let state = store.snapshot();
    assert_eq!(state.album_results.len(), 2);
    assert_eq!(state.search_results_sort, SearchResultsSortOption::NameDesc);
}

#[tokio::test]
async fn test_search_failure_clears_results_and_reports() {
    let mut provider = daft_punk_provider();
    provider.failing.insert("Justice".to_string());
    let (store, _) = store_with(provider, StoreOptions::default());
    store.execute_search().await;
    store.set_search_results_sort(SearchResultsSortOption::YearAsc);

    store.set_search_term("Justice");
    store.execute_search().await;

    let state = store.snapshot();
    assert!(state.album_results.is_empty());
    assert_eq!(state.error.as_deref(), Some("Invalid API key"));
    assert_eq!(state.search_results_sort, SearchResultsSortOption::Relevance);
    assert!(!state.loading());

    store.set_search_term("Daft Punk");
    store.execute_search().await;
    assert_eq!(store.snapshot().error, None);
}

#[tokio::test]
async fn test_stale_search_response_is_discarded() {
    let gate = Arc::new(Notify::new());
    let mut provider = daft_punk_provider();
    provider
        .albums
        .insert("Justice".to_string(), vec![summary("Cross", "Justice")]);
    provider.gates.insert("Justice".to_string(), gate.clone());
    let (store, _) = store_with(provider, StoreOptions::default());

    store.set_search_term("Justice");
    let slow = store.execute_search();
    let fast = async {
        store.set_search_term("Daft Punk");
        store.execute_search().await;
        assert!(store.snapshot().loading());
        gate.notify_one();
    };
    tokio::join!(slow, fast);

    let state = store.snapshot();
    assert_eq!(state.album_results.len(), 2);
    assert_eq!(state.album_results[0].artist, "Daft Punk");
    assert!(!state.loading());
}

#[tokio::test]
async fn test_cancelled_fetch_stops_loading() {
    let gate = Arc::new(Notify::new());
    let mut provider = daft_punk_provider();
    provider.gates.insert("Justice".to_string(), gate.clone());
    provider
        .gates
        .insert(album_id("Justice", "Cross"), gate.clone());
    let (store, _) = store_with(provider, StoreOptions::default());

    store.set_search_term("Justice");
    let cancelled = tokio::time::timeout(Duration::from_millis(20), store.execute_search()).await;
    assert!(cancelled.is_err());
    assert!(!store.snapshot().loading());

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        store.fetch_album_details("Justice", "Cross"),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(!store.snapshot().loading());

    store.fetch_album_details("Daft Punk", "Discovery").await;
    let state = store.snapshot();
    assert!(!state.loading());
    assert_eq!(state.selected_album().unwrap().name, "Discovery");
}

#[tokio::test]
async fn test_album_detail_resets_track_sort() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());
    store.set_track_sort(TrackSortOption::PlaycountDesc);

    store.fetch_album_details("Daft Punk", "Discovery").await;

    let state = store.snapshot();
    assert_eq!(state.view(), ViewState::AlbumDetail);
    assert_eq!(state.track_sort, TrackSortOption::RankAsc);
    assert_eq!(state.selected_album().map(|a| a.name.as_str()), Some("Discovery"));

    store.set_track_sort(TrackSortOption::PlaycountDesc);
    let names: Vec<String> = store
        .sorted_album_tracks()
        .into_iter()
        .map(|track| track.name)
        .collect();
    assert_eq!(names, ["Second", "First"]);
}

#[tokio::test]
async fn test_album_detail_failure_keeps_current_page() {
    let mut provider = daft_punk_provider();
    provider.failing.insert(album_id("Daft Punk", "Alive 1997"));
    let (store, _) = store_with(provider, StoreOptions::default());
    store.fetch_album_details("Daft Punk", "Discovery").await;

    store.fetch_album_details("Daft Punk", "Alive 1997").await;

    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Invalid API key"));
    assert_eq!(state.selected_album().map(|a| a.name.as_str()), Some("Discovery"));
}

#[tokio::test]
async fn test_clear_selected_album() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());
    store.fetch_album_details("Daft Punk", "Discovery").await;
    store.set_track_sort(TrackSortOption::NameAsc);

    store.clear_selected_album();

    let state = store.snapshot();
    assert!(state.selected_album().is_none());
    assert_eq!(state.track_sort, TrackSortOption::RankAsc);
    assert_eq!(state.view(), ViewState::SearchBrowsing);
}

#[tokio::test]
async fn test_artist_then_album_then_back() {
    let (store, _) = store_with(daft_punk_provider(), StoreOptions::default());

    store.fetch_artist_details("Daft Punk").await;
    assert_eq!(store.snapshot().view(), ViewState::ArtistDetail);
    let years: Vec<Option<String>> = store
        .sorted_artist_albums()
        .into_iter()
        .map(|album| album.year)
        .collect();
    assert_eq!(years, [Some("2001".to_string()), Some("1997".to_string())]);

    store.fetch_album_details("Daft Punk", "Discovery").await;
    let state = store.snapshot();
    assert_eq!(state.view(), ViewState::AlbumDetail);
    assert_eq!(state.selected_artist(), Some("Daft Punk"));

    store.go_back();
    let state = store.snapshot();
    assert_eq!(state.view(), ViewState::ArtistDetail);
    assert_eq!(state.artist_albums().len(), 2);

    store.set_artist_sort(ArtistSortOption::NameAsc);
    store.go_back();
    let state = store.snapshot();
    assert_eq!(state.view(), ViewState::SearchBrowsing);
    assert_eq!(state.artist_sort, ArtistSortOption::ReleaseDesc);
}

#[tokio::test]
async fn test_artist_selected_before_albums_arrive() {
    let gate = Arc::new(Notify::new());
    let mut provider = daft_punk_provider();
    provider.gates.insert("Daft Punk".to_string(), gate.clone());
    let (store, _) = store_with(provider, StoreOptions::default());
    store.fetch_album_details("Daft Punk", "Discovery").await;

    let fetch = store.fetch_artist_details("Daft Punk");
    let check = async {
        tokio::task::yield_now().await;
        let state = store.snapshot();
        assert_eq!(state.selected_artist(), Some("Daft Punk"));
        assert!(state.selected_album().is_none());
        assert!(state.artist_albums().is_empty());
        assert!(state.loading());
        gate.notify_one();
    };
    tokio::join!(fetch, check);

    assert_eq!(store.snapshot().artist_albums().len(), 2);
}

#[tokio::test]
async fn test_artist_failure_keeps_artist_selected() {
    let mut provider = daft_punk_provider();
    provider.failing.insert("Justice".to_string());
    let (store, _) = store_with(provider, StoreOptions::default());

    store.fetch_artist_details("Justice").await;

    let state = store.snapshot();
    assert_eq!(state.selected_artist(), Some("Justice"));
    assert!(state.artist_albums().is_empty());
    assert_eq!(state.error.as_deref(), Some("Invalid API key"));
}

#[tokio::test]
async fn test_late_artist_response_after_clear_is_dropped() {
    let gate = Arc::new(Notify::new());
    let mut provider = daft_punk_provider();
    provider.gates.insert("Daft Punk".to_string(), gate.clone());
    let (store, _) = store_with(provider, StoreOptions::default());

    let fetch = store.fetch_artist_details("Daft Punk");
    let clear = async {
        tokio::task::yield_now().await;
        store.clear_selected_artist();
        gate.notify_one();
    };
    tokio::join!(fetch, clear);

    let state = store.snapshot();
    assert_eq!(state.view(), ViewState::SearchBrowsing);
    assert!(!state.loading());
}

#[tokio::test]
async fn test_favourites_round_trip() {
    let (store, _) = store_with(FakeProvider::default(), StoreOptions::default());
    let track = track_id("One More Time");

    store.add_favourite(track.clone());
    assert!(store.is_favourite(&track.id));

    store.remove_favourite(&track.id);
    assert!(!store.is_favourite(&track.id));

    let album = AlbumIdentifier::new("Daft Punk", "Discovery", Vec::new(), None);
    store.add_favourite_album(album.clone());
    assert!(store.is_favourite_album(&album.id));
    store.remove_favourite_album(&album.id);
    assert!(!store.is_favourite_album(&album.id));
}

#[tokio::test]
async fn test_duplicate_add_depends_on_uniqueness() {
    let (store, _) = store_with(FakeProvider::default(), StoreOptions::default());
    assert!(store.add_favourite(track_id("Aerodynamic")));
    assert!(store.add_favourite(track_id("Aerodynamic")));
    assert_eq!(store.snapshot().favourites.len(), 2);

    store.remove_favourite(&track_id("Aerodynamic").id);
    assert!(store.snapshot().favourites.is_empty());

    let options = StoreOptions {
        unique_favourites: true,
        ..StoreOptions::default()
    };
    let (store, _) = store_with(FakeProvider::default(), options);
    assert!(store.add_favourite(track_id("Aerodynamic")));
    assert!(!store.add_favourite(track_id("Aerodynamic")));
    assert_eq!(store.snapshot().favourites.len(), 1);
}

#[tokio::test]
async fn test_toggle_reports_membership() {
    let (store, _) = store_with(FakeProvider::default(), StoreOptions::default());
    let album = AlbumIdentifier::from(&summary("Homework", "Daft Punk"));

    assert!(store.toggle_favourite_album(album.clone()));
    assert!(!store.toggle_favourite_album(album.clone()));
    assert!(!store.is_favourite_album(&album.id));

    assert!(store.toggle_favourite(track_id("Digital Love")));
    assert!(store.is_favourite("Daft Punk-Discovery-Digital Love"));
}

#[tokio::test]
async fn test_removals_and_toggles_are_persisted() {
    let (store, storage) = store_with(FakeProvider::default(), StoreOptions::default());
    let stored = || -> serde_json::Value {
        serde_json::from_str(&storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap()).unwrap()
    };
    let homework = AlbumIdentifier::new("Daft Punk", "Homework", Vec::new(), None);
    store.add_favourite(track_id("Veridis Quo"));
    store.add_favourite(track_id("Digital Love"));
    store.add_favourite_album(homework.clone());

    store.remove_favourite("Daft Punk-Discovery-Veridis Quo");
    store.remove_favourite_album(&homework.id);
    let value = stored();
    assert_eq!(value["favourites"].as_array().unwrap().len(), 1);
    assert_eq!(value["favourites"][0]["name"], "Digital Love");
    assert!(value["favouriteAlbums"].as_array().unwrap().is_empty());

    assert!(!store.toggle_favourite(track_id("Digital Love")));
    assert!(store.toggle_favourite_album(homework));
    let value = stored();
    assert!(value["favourites"].as_array().unwrap().is_empty());
    assert_eq!(value["favouriteAlbums"][0]["name"], "Homework");
}

#[tokio::test]
async fn test_favourites_survive_a_new_store() {
    let storage = Arc::new(InMemoryStorage::new());
    let first = MusicStore::new(
        Arc::new(FakeProvider::default()),
        storage.clone(),
        StoreOptions::default(),
    );
    first.add_favourite(track_id("Veridis Quo"));
    first.add_favourite_album(AlbumIdentifier::new("Daft Punk", "Discovery", Vec::new(), None));

    let blob = storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["favourites"][0]["albumName"], "Discovery");

    let second = MusicStore::new(
        Arc::new(FakeProvider::default()),
        storage,
        StoreOptions::default(),
    );
    let state = second.snapshot();
    assert_eq!(state.favourites, first.snapshot().favourites);
    assert_eq!(state.favourite_albums.len(), 1);
    assert_eq!(state.search_term, "Daft Punk");
    assert!(state.album_results.is_empty());
}

#[tokio::test]
async fn test_favourites_view_filter_and_tab() {
    let (store, _) = store_with(FakeProvider::default(), StoreOptions::default());
    store.add_favourite(TrackIdentifier::new("Daft Punk", "Discovery", "Aerodynamic", "212", ""));
    store.add_favourite(TrackIdentifier::new("Justice", "Cross", "D.A.N.C.E.", "242", ""));
    store.set_view(AppView::Favourites);
    assert_eq!(store.snapshot().view(), ViewState::Favourites);

    store.set_favourites_filter("cross");
    let visible = store.visible_favourites();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].track.name, "D.A.N.C.E.");

    store.set_favourites_sort(FavouritesSortOption::AlbumAsc);
    store.set_favourites_tab(FavouritesTab::Albums);
    let state = store.snapshot();
    assert_eq!(state.favourites_sort, FavouritesSortOption::DateDesc);
    assert!(state.favourites_filter.is_empty());
    assert_eq!(state.favourites_tab, FavouritesTab::Albums);
}
