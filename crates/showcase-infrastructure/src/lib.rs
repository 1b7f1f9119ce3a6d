// SPDX-License-Identifier: GPL-3.0-or-later
pub mod storage;

pub use storage::{DurableStorage, FileStorage, InMemoryStorage};

use anyhow::Result;
use showcase_config::ShowcaseConfig;
use std::path::Path;
use tracing::info;

/// Opens the file-backed storage configured under `[storage]`, creating the
/// directory when needed.
pub fn init_storage(config: &ShowcaseConfig) -> Result<FileStorage> {
    let directory = config.storage.directory.as_path();
    info!(target: "storage", path = %directory.display(), "initializing storage");

    let absolute = if directory.is_absolute() || directory == Path::new("") {
        directory.to_path_buf()
    } else {
        std::env::current_dir()?.join(directory)
    };

    FileStorage::open(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_storage_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ShowcaseConfig::default();
        config.storage.directory = dir.path().join("nested").join("store");

        let storage = init_storage(&config).unwrap();
        assert!(storage.directory().is_dir());
    }
}
