// SPDX-License-Identifier: GPL-3.0-or-later

//! Last.fm metadata provider adapter.
//!
//! Wraps the `album.search`, `track.search`, `album.getinfo` and
//! `artist.gettopalbums` methods and normalizes the provider's inconsistent
//! response shapes into the typed records of `showcase-domain`.

pub mod client;
pub mod error;
pub mod normalize;
mod wire;

pub use client::{EnrichmentPolicy, LastFmClient, LastFmClientBuilder, DEFAULT_TOP_ALBUMS_LIMIT};
pub use error::{ProviderError, Result};
pub use normalize::{ensure_sequence, extract_year, synthesize_playcount};
