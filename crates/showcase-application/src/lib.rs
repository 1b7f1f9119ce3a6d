// SPDX-License-Identifier: GPL-3.0-or-later
pub mod persistence;
pub mod provider;
pub mod sorting;
pub mod state;
pub mod store;

#[cfg(test)]
mod store_tests;

pub use persistence::{FavouritesSnapshot, DEFAULT_STORAGE_KEY, SCHEMA_VERSION};
pub use provider::MetadataProvider;
pub use state::{ArtistPage, DetailView, ExplorerState, ViewState};
pub use store::{MusicStore, StoreOptions};
