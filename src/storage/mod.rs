//! File-backed persistence. Everything lives under the application
//! directory: `records.jsonl`, the single-slot `track.json` marker and
//! `config.json`. The repositories share one invalidate-on-write cache.

pub mod cache;
pub mod config;
pub mod entities;
pub mod records;
pub mod stats;
pub mod track;

use std::path::Path;

use anyhow::{Context, Result};

use crate::utils::clock::Clock;

use self::{
    cache::StoreCache, config::FileConfigRepository, records::FileRecordRepository,
    stats::FileStatsRepository, track::FileTrackRepository,
};

pub struct Store {
    pub config: FileConfigRepository,
    pub records: FileRecordRepository,
    pub track: FileTrackRepository,
    pub stats: FileStatsRepository,
}

/// Opens (creating if needed) the store under `dir`.
pub async fn open(dir: &Path, clock: Box<dyn Clock>) -> Result<Store> {
    tokio::fs::create_dir_all(dir)
        .await
        .context("creating application directory")?;

    let cache = StoreCache::new();

    Ok(Store {
        config: FileConfigRepository::load(dir).await?,
        records: FileRecordRepository::new(dir, cache.clone()),
        track: FileTrackRepository::new(dir, cache.clone()),
        stats: FileStatsRepository::new(dir, cache, clock),
    })
}
