use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::domain::{error::DomainError, record::OpenRecord, repository::TrackRepository};

use super::{cache::StoreCache, entities::OpenRecordEntity};

pub const TRACK_FILE: &str = "track.json";

/// Reads the open-record slot, `None` when no timer is running.
pub(crate) async fn read_open_record(path: &Path) -> Result<Option<OpenRecordEntity>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(
            serde_json::from_slice(&bytes).context("track file is corrupt")?,
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("reading track file"),
    }
}

/// Single-slot open-record marker backed by one file. The slot is the
/// file itself: creation with `create_new` is atomic at the filesystem
/// level, so two concurrent starts can never both succeed, even across
/// processes.
pub struct FileTrackRepository {
    path: PathBuf,
    cache: Arc<StoreCache>,
}

impl FileTrackRepository {
    pub fn new(dir: &Path, cache: Arc<StoreCache>) -> Self {
        Self {
            path: dir.join(TRACK_FILE),
            cache,
        }
    }
}

#[async_trait]
impl TrackRepository for FileTrackRepository {
    async fn save(&self, open: &OpenRecord) -> Result<()> {
        let mut file = match File::options()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(anyhow!(DomainError::AlreadyWorking))
            }
            Err(e) => return Err(e).context("creating track file"),
        };

        let entity = OpenRecordEntity::from_domain(open);
        file.write_all(&serde_json::to_vec(&entity)?).await?;
        file.flush().await?;

        self.cache.invalidate();
        Ok(())
    }

    async fn get(&self) -> Result<OpenRecord> {
        match read_open_record(&self.path).await? {
            Some(entity) => Ok(entity.into_domain()),
            None => Err(anyhow!(DomainError::NotWorking)),
        }
    }

    async fn delete(&self) -> Result<()> {
        tokio::fs::remove_file(&self.path)
            .await
            .context("deleting track file")?;
        self.cache.invalidate();
        Ok(())
    }

    async fn is_working(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
