// SPDX-License-Identifier: GPL-3.0-or-later

//! The music explorer's state container.
//!
//! All state lives behind one lock. Async operations take the lock to start a
//! request, release it while the provider works, and take it again to apply
//! the response, so readers never observe a half-applied transition.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use showcase_config::ShowcaseConfig;
use showcase_domain::{
    AlbumDetail, AlbumIdentifier, AlbumSummary, AppView, ArtistSortOption, FavouriteAlbum,
    FavouriteTrack, FavouritesSortOption, FavouritesTab, SearchQuery, SearchResultsSortOption,
    SearchType, Track, TrackIdentifier, TrackSortOption, TrackSummary,
};
use showcase_infrastructure::DurableStorage;
use showcase_lastfm::DEFAULT_TOP_ALBUMS_LIMIT;
use tracing::{debug, error, info, warn};

use crate::persistence::{self, DEFAULT_STORAGE_KEY};
use crate::provider::MetadataProvider;
use crate::sorting;
use crate::state::{ArtistPage, DetailView, ExplorerState, RequestField};

/// Store settings that do not change over the store's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub default_term: String,
    pub default_type: SearchType,
    /// Skip adding a favourite whose id is already present.
    pub unique_favourites: bool,
    pub top_albums_limit: u32,
    pub storage_key: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_term: "Daft Punk".to_string(),
            default_type: SearchType::Album,
            unique_favourites: false,
            top_albums_limit: DEFAULT_TOP_ALBUMS_LIMIT,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl From<&ShowcaseConfig> for StoreOptions {
    fn from(config: &ShowcaseConfig) -> Self {
        Self {
            default_term: config.search.default_term.clone(),
            default_type: config.search.default_type,
            unique_favourites: config.favourites.unique_ids,
            top_albums_limit: config.lastfm.top_albums_limit,
            storage_key: config.storage.key.clone(),
        }
    }
}

enum SearchResults {
    Albums(Vec<AlbumSummary>),
    Tracks(Vec<TrackSummary>),
}

/// Counts a fetch as in flight until it finishes or its future is dropped.
struct InFlight<'a> {
    state: &'a RwLock<ExplorerState>,
    field: RequestField,
    token: u64,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a RwLock<ExplorerState>, field: RequestField, token: u64) -> Self {
        Self {
            state,
            field,
            token,
            finished: false,
        }
    }

    /// Ends the fetch. Yields the locked state only if the response is current.
    fn finish(mut self) -> Option<RwLockWriteGuard<'a, ExplorerState>> {
        self.finished = true;
        let lock = self.state;
        let mut state = lock.write();
        state.finish_request(self.field, self.token).then_some(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(target: "store", field = ?self.field, "fetch cancelled");
            self.state.write().finish_request(self.field, self.token);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct MusicStore {
    provider: Arc<dyn MetadataProvider>,
    storage: Arc<dyn DurableStorage>,
    options: StoreOptions,
    state: RwLock<ExplorerState>,
}

impl MusicStore {
    /// Builds the store with default transient state and whatever favourites
    /// durable storage holds.
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        storage: Arc<dyn DurableStorage>,
        options: StoreOptions,
    ) -> Self {
        let snapshot = persistence::load(storage.as_ref(), &options.storage_key, now_millis());
        info!(
            target: "store",
            favourites = snapshot.favourites.len(),
            favourite_albums = snapshot.favourite_albums.len(),
            "music store initialized"
        );

        let mut state = ExplorerState::new(options.default_term.clone(), options.default_type);
        state.favourites = snapshot.favourites;
        state.favourite_albums = snapshot.favourite_albums;

        Self {
            provider,
            storage,
            options,
            state: RwLock::new(state),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> ExplorerState {
        self.state.read().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&ExplorerState) -> R) -> R {
        f(&self.state.read())
    }

    // ========================================================================
    // Query & view setters
    // ========================================================================

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.state.write().search_term = term.into();
    }

    pub fn set_search_type(&self, search_type: SearchType) {
        self.state.write().search_type = search_type;
    }

    pub fn set_view(&self, view: AppView) {
        self.state.write().current_view = view;
    }

    pub fn set_artist_sort(&self, option: ArtistSortOption) {
        self.state.write().artist_sort = option;
    }

    pub fn set_favourites_sort(&self, option: FavouritesSortOption) {
        self.state.write().favourites_sort = option;
    }

    pub fn set_track_sort(&self, option: TrackSortOption) {
        self.state.write().track_sort = option;
    }

    pub fn set_search_results_sort(&self, option: SearchResultsSortOption) {
        self.state.write().search_results_sort = option;
    }

    /// Switches the favourites tab. Changing tab clears the filter, and album
    /// keys fall back to newest-first on the albums tab.
    pub fn set_favourites_tab(&self, tab: FavouritesTab) {
        let mut state = self.state.write();
        if state.favourites_tab != tab {
            state.favourites_filter.clear();
        }
        if tab == FavouritesTab::Albums && state.favourites_sort.is_track_only() {
            state.favourites_sort = FavouritesSortOption::DateDesc;
        }
        state.favourites_tab = tab;
    }

    pub fn set_favourites_filter(&self, filter: impl Into<String>) {
        self.state.write().favourites_filter = filter.into();
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Searches for the current term. A blank term is a no-op.
    pub async fn execute_search(&self) {
        let (query, token) = {
            let mut state = self.state.write();
            let query = SearchQuery::new(state.search_term.clone(), state.search_type);
            if query.is_blank() {
                return;
            }
            state.album_results.clear();
            state.track_results.clear();
            state.search_results_sort = SearchResultsSortOption::Relevance;
            let token = state.begin_request(RequestField::Search);
            (query, token)
        };
        let request = InFlight::new(&self.state, RequestField::Search, token);

        let outcome = match query.search_type {
            SearchType::Album => self
                .provider
                .search_albums(&query.term)
                .await
                .map(SearchResults::Albums),
            SearchType::Track => self
                .provider
                .search_tracks(&query.term)
                .await
                .map(SearchResults::Tracks),
        };

        let Some(mut state) = request.finish() else {
            debug!(target: "store", term = %query.term, "discarding stale search response");
            return;
        };
        match outcome {
            Ok(SearchResults::Albums(albums)) => state.album_results = albums,
            Ok(SearchResults::Tracks(tracks)) => state.track_results = tracks,
            Err(err) => {
                warn!(target: "store", term = %query.term, error = %err, "search failed");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Loads an album and shows it. On failure the previous page stays as it was.
    pub async fn fetch_album_details(&self, artist: &str, album: &str) {
        let token = {
            let mut state = self.state.write();
            state.track_sort = TrackSortOption::RankAsc;
            state.begin_request(RequestField::Album)
        };
        let request = InFlight::new(&self.state, RequestField::Album, token);

        let outcome = self.provider.album_detail(artist, album).await;

        let Some(mut state) = request.finish() else {
            debug!(target: "store", artist, album, "discarding stale album response");
            return;
        };
        match outcome {
            Ok(Some(detail)) => state.open_album(detail),
            Ok(None) => {
                debug!(target: "store", artist, album, "album not found");
                state.close_album();
            }
            Err(err) => {
                warn!(target: "store", artist, album, error = %err, "album lookup failed");
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn clear_selected_album(&self) {
        let mut state = self.state.write();
        state.tokens.issue(RequestField::Album);
        state.close_album();
        state.error = None;
        state.track_sort = TrackSortOption::RankAsc;
    }

    /// Opens the artist page right away and fills in the top albums when they
    /// arrive. Any open album is closed.
    pub async fn fetch_artist_details(&self, name: &str) {
        let token = {
            let mut state = self.state.write();
            state.tokens.issue(RequestField::Album);
            state.detail = DetailView::Artist(ArtistPage::new(name));
            state.begin_request(RequestField::Artist)
        };
        let request = InFlight::new(&self.state, RequestField::Artist, token);

        let outcome = self
            .provider
            .artist_top_albums(name, self.options.top_albums_limit)
            .await;

        let Some(mut state) = request.finish() else {
            debug!(target: "store", artist = name, "discarding stale artist response");
            return;
        };
        match outcome {
            Ok(albums) => {
                if let Some(page) = state.artist_page_mut() {
                    page.albums = albums;
                }
            }
            Err(err) => {
                warn!(target: "store", artist = name, error = %err, "artist lookup failed");
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn clear_selected_artist(&self) {
        let mut state = self.state.write();
        state.tokens.issue(RequestField::Artist);
        state.close_artist();
        state.artist_sort = ArtistSortOption::ReleaseDesc;
    }

    /// Steps back one page: album first, then artist.
    pub fn go_back(&self) {
        let has_album = self.read(|state| state.selected_album().is_some());
        if has_album {
            self.clear_selected_album();
        } else {
            self.clear_selected_artist();
        }
    }

    // ========================================================================
    // Favourites
    // ========================================================================

    /// Appends a favourite track stamped with the current time. Returns false
    /// when uniqueness is enforced and the id is already present.
    pub fn add_favourite(&self, track: TrackIdentifier) -> bool {
        let mut state = self.state.write();
        if self.options.unique_favourites && state.is_favourite(&track.id) {
            debug!(target: "store", id = %track.id, "favourite already present");
            return false;
        }
        state.favourites.push(FavouriteTrack {
            track,
            date_added: now_millis(),
        });
        self.persist(&state);
        true
    }

    /// Removes every favourite track with this id.
    pub fn remove_favourite(&self, id: &str) {
        let mut state = self.state.write();
        state.favourites.retain(|favourite| favourite.id() != id);
        self.persist(&state);
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.state.read().is_favourite(id)
    }

    /// Adds the track if absent, removes it otherwise. Returns the new membership.
    pub fn toggle_favourite(&self, track: TrackIdentifier) -> bool {
        let mut state = self.state.write();
        let added = if state.is_favourite(&track.id) {
            state.favourites.retain(|favourite| favourite.id() != track.id);
            false
        } else {
            state.favourites.push(FavouriteTrack {
                track,
                date_added: now_millis(),
            });
            true
        };
        self.persist(&state);
        added
    }

    pub fn add_favourite_album(&self, album: AlbumIdentifier) -> bool {
        let mut state = self.state.write();
        if self.options.unique_favourites && state.is_favourite_album(&album.id) {
            debug!(target: "store", id = %album.id, "favourite album already present");
            return false;
        }
        state.favourite_albums.push(FavouriteAlbum {
            album,
            date_added: now_millis(),
        });
        self.persist(&state);
        true
    }

    pub fn remove_favourite_album(&self, id: &str) {
        let mut state = self.state.write();
        state.favourite_albums.retain(|favourite| favourite.id() != id);
        self.persist(&state);
    }

    pub fn is_favourite_album(&self, id: &str) -> bool {
        self.state.read().is_favourite_album(id)
    }

    pub fn toggle_favourite_album(&self, album: AlbumIdentifier) -> bool {
        let mut state = self.state.write();
        let added = if state.is_favourite_album(&album.id) {
            state.favourite_albums.retain(|favourite| favourite.id() != album.id);
            false
        } else {
            state.favourite_albums.push(FavouriteAlbum {
                album,
                date_added: now_millis(),
            });
            true
        };
        self.persist(&state);
        added
    }

    fn persist(&self, state: &ExplorerState) {
        if let Err(err) = persistence::save(
            self.storage.as_ref(),
            &self.options.storage_key,
            &state.favourites,
            &state.favourite_albums,
        ) {
            error!(target: "storage", error = %err, "failed to persist favourites");
        }
    }

    // ========================================================================
    // Projections
    // ========================================================================

    pub fn sorted_album_results(&self) -> Vec<AlbumSummary> {
        self.read(|state| {
            sorting::sort_album_results(&state.album_results, state.search_results_sort)
        })
    }

    pub fn sorted_track_results(&self) -> Vec<TrackSummary> {
        self.read(|state| {
            sorting::sort_track_results(&state.track_results, state.search_results_sort)
        })
    }

    pub fn sorted_artist_albums(&self) -> Vec<AlbumDetail> {
        self.read(|state| sorting::sort_artist_albums(state.artist_albums(), state.artist_sort))
    }

    /// Tracks of the open album in the selected order; empty when no album is open.
    pub fn sorted_album_tracks(&self) -> Vec<Track> {
        self.read(|state| {
            state
                .selected_album()
                .map(|album| sorting::sort_album_tracks(&album.tracks, state.track_sort))
                .unwrap_or_default()
        })
    }

    /// Favourite tracks after the favourites filter and sort are applied.
    pub fn visible_favourites(&self) -> Vec<FavouriteTrack> {
        self.read(|state| {
            let filtered =
                sorting::filter_favourite_tracks(&state.favourites, &state.favourites_filter);
            sorting::sort_favourite_tracks(&filtered, state.favourites_sort)
        })
    }

    pub fn visible_favourite_albums(&self) -> Vec<FavouriteAlbum> {
        self.read(|state| {
            let filtered =
                sorting::filter_favourite_albums(&state.favourite_albums, &state.favourites_filter);
            sorting::sort_favourite_albums(&filtered, state.favourites_sort)
        })
    }
}
