// SPDX-License-Identifier: GPL-3.0-or-later

//! The explorer's state aggregate and the navigation it encodes.

use showcase_domain::{
    AlbumDetail, AlbumSummary, AppView, ArtistSortOption, FavouriteAlbum, FavouriteTrack,
    FavouritesSortOption, FavouritesTab, SearchResultsSortOption, SearchType, TrackSortOption,
    TrackSummary,
};

/// An artist page: the name is known immediately, albums arrive later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistPage {
    pub name: String,
    pub albums: Vec<AlbumDetail>,
}

impl ArtistPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            albums: Vec::new(),
        }
    }
}

/// Which detail page, if any, sits on top of the current top-level view.
///
/// An album opened from an artist page remembers that page so closing the album
/// returns to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailView {
    #[default]
    None,
    Artist(ArtistPage),
    Album {
        album: Box<AlbumDetail>,
        artist: Option<ArtistPage>,
    },
}

/// What the user is looking at right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    SearchBrowsing,
    Favourites,
    AlbumDetail,
    ArtistDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestField {
    Search,
    Album,
    Artist,
}

/// Latest token issued per field. A response is applied only if it carries the
/// latest token for its field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RequestTokens {
    search: u64,
    album: u64,
    artist: u64,
}

impl RequestTokens {
    fn slot(&mut self, field: RequestField) -> &mut u64 {
        match field {
            RequestField::Search => &mut self.search,
            RequestField::Album => &mut self.album,
            RequestField::Artist => &mut self.artist,
        }
    }

    /// Issues a new token, making every earlier one for the field stale.
    pub(crate) fn issue(&mut self, field: RequestField) -> u64 {
        let slot = self.slot(field);
        *slot += 1;
        *slot
    }

    pub(crate) fn is_current(&mut self, field: RequestField, token: u64) -> bool {
        *self.slot(field) == token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerState {
    pub search_term: String,
    pub search_type: SearchType,
    pub album_results: Vec<AlbumSummary>,
    pub track_results: Vec<TrackSummary>,
    pub detail: DetailView,
    pub current_view: AppView,
    pub favourites_tab: FavouritesTab,
    pub favourites_filter: String,
    pub artist_sort: ArtistSortOption,
    pub favourites_sort: FavouritesSortOption,
    pub track_sort: TrackSortOption,
    pub search_results_sort: SearchResultsSortOption,
    pub error: Option<String>,
    pub favourites: Vec<FavouriteTrack>,
    pub favourite_albums: Vec<FavouriteAlbum>,
    pub(crate) tokens: RequestTokens,
    pub(crate) in_flight: u32,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self::new("Daft Punk", SearchType::Album)
    }
}

impl ExplorerState {
    pub fn new(search_term: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            search_term: search_term.into(),
            search_type,
            album_results: Vec::new(),
            track_results: Vec::new(),
            detail: DetailView::None,
            current_view: AppView::Search,
            favourites_tab: FavouritesTab::Tracks,
            favourites_filter: String::new(),
            artist_sort: ArtistSortOption::default(),
            favourites_sort: FavouritesSortOption::default(),
            track_sort: TrackSortOption::default(),
            search_results_sort: SearchResultsSortOption::default(),
            error: None,
            favourites: Vec::new(),
            favourite_albums: Vec::new(),
            tokens: RequestTokens::default(),
            in_flight: 0,
        }
    }

    /// True while any dispatched fetch has not come back yet.
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn selected_album(&self) -> Option<&AlbumDetail> {
        match &self.detail {
            DetailView::Album { album, .. } => Some(album),
            _ => None,
        }
    }

    pub fn selected_artist(&self) -> Option<&str> {
        self.artist_page().map(|page| page.name.as_str())
    }

    pub fn artist_albums(&self) -> &[AlbumDetail] {
        self.artist_page()
            .map(|page| page.albums.as_slice())
            .unwrap_or_default()
    }

    pub fn view(&self) -> ViewState {
        match (&self.detail, self.current_view) {
            (DetailView::Album { .. }, _) => ViewState::AlbumDetail,
            (DetailView::Artist(_), _) => ViewState::ArtistDetail,
            (DetailView::None, AppView::Favourites) => ViewState::Favourites,
            (DetailView::None, AppView::Search) => ViewState::SearchBrowsing,
        }
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.favourites.iter().any(|favourite| favourite.id() == id)
    }

    pub fn is_favourite_album(&self, id: &str) -> bool {
        self.favourite_albums.iter().any(|favourite| favourite.id() == id)
    }

    fn artist_page(&self) -> Option<&ArtistPage> {
        match &self.detail {
            DetailView::Artist(page) => Some(page),
            DetailView::Album {
                artist: Some(page), ..
            } => Some(page),
            _ => None,
        }
    }

    pub(crate) fn artist_page_mut(&mut self) -> Option<&mut ArtistPage> {
        match &mut self.detail {
            DetailView::Artist(page) => Some(page),
            DetailView::Album {
                artist: Some(page), ..
            } => Some(page),
            _ => None,
        }
    }

    /// Starts a fetch: clears the last error and returns the fetch's token.
    pub(crate) fn begin_request(&mut self, field: RequestField) -> u64 {
        self.in_flight += 1;
        self.error = None;
        self.tokens.issue(field)
    }

    /// Ends a fetch; returns whether its response should still be applied.
    pub(crate) fn finish_request(&mut self, field: RequestField, token: u64) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.tokens.is_current(field, token)
    }

    /// Shows an album on top of whatever artist page is open.
    pub(crate) fn open_album(&mut self, album: AlbumDetail) {
        let artist = match std::mem::take(&mut self.detail) {
            DetailView::Artist(page) => Some(page),
            DetailView::Album { artist, .. } => artist,
            DetailView::None => None,
        };
        self.detail = DetailView::Album {
            album: Box::new(album),
            artist,
        };
    }

    /// Drops the album page, falling back to the artist page it was opened from.
    pub(crate) fn close_album(&mut self) {
        self.detail = match std::mem::take(&mut self.detail) {
            DetailView::Album {
                artist: Some(page), ..
            } => DetailView::Artist(page),
            DetailView::Album { artist: None, .. } => DetailView::None,
            other => other,
        };
    }

    /// Drops the artist page. An album opened from it stays open.
    pub(crate) fn close_artist(&mut self) {
        self.detail = match std::mem::take(&mut self.detail) {
            DetailView::Artist(_) => DetailView::None,
            DetailView::Album { album, .. } => DetailView::Album {
                album,
                artist: None,
            },
            DetailView::None => DetailView::None,
        };
    }
}
