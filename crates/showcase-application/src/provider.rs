// SPDX-License-Identifier: GPL-3.0-or-later

//! The seam between the store and whatever serves catalog metadata.

use async_trait::async_trait;
use showcase_domain::{AlbumDetail, AlbumSummary, TrackSummary};
use showcase_lastfm::{LastFmClient, ProviderError};

/// Catalog lookups the store depends on.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn search_albums(&self, term: &str) -> Result<Vec<AlbumSummary>, ProviderError>;

    async fn search_tracks(&self, term: &str) -> Result<Vec<TrackSummary>, ProviderError>;

    /// `Ok(None)` when the provider has no record for the album.
    async fn album_detail(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumDetail>, ProviderError>;

    async fn artist_top_albums(
        &self,
        artist: &str,
        limit: u32,
    ) -> Result<Vec<AlbumDetail>, ProviderError>;
}

#[async_trait]
impl MetadataProvider for LastFmClient {
    async fn search_albums(&self, term: &str) -> Result<Vec<AlbumSummary>, ProviderError> {
        LastFmClient::search_albums(self, term).await
    }

    async fn search_tracks(&self, term: &str) -> Result<Vec<TrackSummary>, ProviderError> {
        LastFmClient::search_tracks(self, term).await
    }

    async fn album_detail(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumDetail>, ProviderError> {
        self.get_album_detail(artist, album).await
    }

    async fn artist_top_albums(
        &self,
        artist: &str,
        limit: u32,
    ) -> Result<Vec<AlbumDetail>, ProviderError> {
        self.get_artist_top_albums(artist, limit).await
    }
}
