use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::domain::{
    record::{Record, RecordStatus},
    repository::RecordRepository,
};

use super::{
    cache::{with_cache, StoreCache},
    entities::RecordEntity,
};

pub const RECORDS_FILE: &str = "records.jsonl";

/// Reads every record line from `path`. A missing file is an empty store,
/// lines that fail to parse are skipped with a warning.
pub(crate) async fn read_record_lines(path: &Path) -> Result<Vec<RecordEntity>> {
    async fn extract(path: &Path) -> Result<Vec<RecordEntity>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut entities = vec![];
        while let Ok(Some(line)) = lines.next_line().await {
            match serde_json::from_str::<RecordEntity>(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    // ignore illegal values. Might happen after shutdowns
                    warn!(
                        "During parsing in path {:?} found illegal json string {}:  {e}",
                        path, &line
                    )
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(entities)
    }

    match extract(path).await {
        Ok(entities) => Ok(entities),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(e).context("reading records"),
    }
}

/// The main realization of [RecordRepository], one JSON record per line of a
/// single file. Mutations rewrite the file under an exclusive lock.
pub struct FileRecordRepository {
    path: PathBuf,
    cache: Arc<StoreCache>,
}

impl FileRecordRepository {
    pub fn new(dir: &Path, cache: Arc<StoreCache>) -> Self {
        Self {
            path: dir.join(RECORDS_FILE),
            cache,
        }
    }

    async fn rewrite(&self, entities: &[RecordEntity]) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        for entity in entities {
            serde_json::to_writer(&mut buffer, entity)?;
            buffer.push(b'\n');
        }

        let mut file = File::options()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .context("opening records file")?;

        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.write_all(&buffer).await?;
            file.flush().await?;
            Ok(())
        }
        .await;
        file.unlock_async().await?;

        result
    }
}

#[async_trait]
impl RecordRepository for FileRecordRepository {
    async fn save(&self, record: &Record) -> Result<()> {
        let mut all = read_record_lines(&self.path).await?;
        let entity = RecordEntity::from_domain(record);

        match all.iter_mut().find(|e| e.id == entity.id) {
            Some(existing) => *existing = entity,
            None => all.push(entity),
        }

        self.rewrite(&all).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut all = read_record_lines(&self.path).await?;
        all.retain(|e| e.id != id);

        self.rewrite(&all).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Record> {
        with_cache(&self.cache, &format!("record:{id}"), || async move {
            let all = read_record_lines(&self.path).await?;
            let entity = all
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow!("record {id} not found"))?;
            Ok(entity.into_domain()?)
        })
        .await
    }

    async fn get_all_by_date_status(
        &self,
        date: DateTime<Local>,
        status: RecordStatus,
    ) -> Result<Vec<Record>> {
        let key = format!("records:{}:{status}", date.format("%y%m%d"));
        with_cache(&self.cache, &key, || async move {
            let day = date.date_naive();
            let mut records = vec![];
            for entity in read_record_lines(&self.path).await? {
                if entity.date.date_naive() == day && entity.status == status.as_str() {
                    records.push(entity.into_domain()?);
                }
            }
            Ok(records)
        })
        .await
    }

    async fn get_all_by_status(&self, status: RecordStatus) -> Result<Vec<Record>> {
        with_cache(&self.cache, &format!("records:{status}"), || async move {
            let mut records = vec![];
            for entity in read_record_lines(&self.path).await? {
                if entity.status == status.as_str() {
                    records.push(entity.into_domain()?);
                }
            }
            Ok(records)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    use super::*;

    fn day() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 4, 9, 0, 0).unwrap()
    }

    fn repository(dir: &Path) -> FileRecordRepository {
        FileRecordRepository::new(dir, StoreCache::new())
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let records = repo.get_all_by_status(RecordStatus::Pending).await?;
        assert!(records.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_and_get_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let record = Record::close(day(), 1.5)?;
        repo.save(&record).await?;

        let loaded = repo.get(record.id()).await?;
        assert_eq!(loaded, record);
        Ok(())
    }

    #[tokio::test]
    async fn save_overwrites_by_id() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let mut record = Record::close(day(), 1.5)?;
        repo.save(&record).await?;

        record.update_hours(2.0)?;
        repo.save(&record).await?;

        let all = repo.get_all_by_status(RecordStatus::Pending).await?;
        assert_eq!(all.len(), 1);
        assert!((all[0].hours() - 2.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn filters_by_date_and_status() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let today_pending = Record::close(day(), 1.0)?;
        let mut today_committed = Record::close(day(), 2.0)?;
        today_committed.commit()?;
        let other_day = Record::close(day() - Duration::days(1), 3.0)?;

        for record in [&today_pending, &today_committed, &other_day] {
            repo.save(record).await?;
        }

        let pending = repo
            .get_all_by_date_status(day(), RecordStatus::Pending)
            .await?;
        assert_eq!(pending, vec![today_pending]);

        let committed = repo
            .get_all_by_date_status(day(), RecordStatus::Committed)
            .await?;
        assert_eq!(committed, vec![today_committed]);

        let all_pending = repo.get_all_by_status(RecordStatus::Pending).await?;
        assert_eq!(all_pending.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_the_record() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let record = Record::close(day(), 1.0)?;
        repo.save(&record).await?;
        repo.delete(record.id()).await?;

        assert!(repo.get(record.id()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn writes_invalidate_cached_reads() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let first = Record::close(day(), 1.0)?;
        repo.save(&first).await?;

        // prime the cache
        let before = repo
            .get_all_by_date_status(day(), RecordStatus::Pending)
            .await?;
        assert_eq!(before.len(), 1);

        let second = Record::close(day(), 2.0)?;
        repo.save(&second).await?;

        let after = repo
            .get_all_by_date_status(day(), RecordStatus::Pending)
            .await?;
        assert_eq!(after.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let record = Record::close(day(), 1.0)?;
        repo.save(&record).await?;

        let path = dir.path().join(RECORDS_FILE);
        let mut content = tokio::fs::read_to_string(&path).await?;
        content.push_str("not json\n");
        tokio::fs::write(&path, content).await?;

        let all = repo.get_all_by_status(RecordStatus::Pending).await?;
        assert_eq!(all.len(), 1);
        Ok(())
    }
}
