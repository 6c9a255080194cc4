use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};

use crate::{
    domain::{
        debt::Debt,
        record::RecordStatus,
        repository::StatsRepository,
        time::is_weekend,
    },
    utils::clock::Clock,
};

use super::{
    cache::{with_cache, StoreCache},
    entities::RecordEntity,
    records::{read_record_lines, RECORDS_FILE},
    track::{read_open_record, TRACK_FILE},
};

/// Aggregates derived by scanning the record and track files.
pub struct FileStatsRepository {
    records_path: PathBuf,
    track_path: PathBuf,
    cache: Arc<StoreCache>,
    clock: Box<dyn Clock>,
}

impl FileStatsRepository {
    pub fn new(dir: &Path, cache: Arc<StoreCache>, clock: Box<dyn Clock>) -> Self {
        Self {
            records_path: dir.join(RECORDS_FILE),
            track_path: dir.join(TRACK_FILE),
            cache,
            clock,
        }
    }

    async fn all_records(&self) -> Result<Vec<RecordEntity>> {
        with_cache(&self.cache, "records:all", || async move {
            read_record_lines(&self.records_path).await
        })
        .await
    }
}

#[async_trait]
impl StatsRepository for FileStatsRepository {
    async fn hours_by_date_status(
        &self,
        date: DateTime<Local>,
        status: RecordStatus,
    ) -> Result<f64> {
        let key = format!("hours:{}:{status}", date.format("%y%m%d"));
        let day = date.date_naive();
        let records = self.all_records().await?;

        with_cache(&self.cache, &key, || async move {
            Ok(records
                .iter()
                .filter(|e| e.date.date_naive() == day && e.status == status.as_str())
                .map(|e| e.hours)
                .sum())
        })
        .await
    }

    async fn hours_by_status(&self, status: RecordStatus) -> Result<f64> {
        let records = self.all_records().await?;

        with_cache(&self.cache, &format!("hours:{status}"), || async move {
            Ok(records
                .iter()
                .filter(|e| e.status == status.as_str())
                .map(|e| e.hours)
                .sum())
        })
        .await
    }

    async fn tracked_hours(&self) -> Result<f64> {
        // never cached, the figure moves with the clock
        match read_open_record(&self.track_path).await? {
            Some(entity) => Ok(entity.into_domain().elapsed_hours(self.clock.now())),
            None => Ok(0.0),
        }
    }

    /// Walks every weekday from the earliest record's day through today.
    /// A day's worked hours are its pending plus committed records; pooled
    /// hours are excluded from the days and credited once, after the
    /// tracked-hours credit.
    async fn debt(&self, work_time: f64) -> Result<Debt> {
        let records = self.all_records().await?;

        let mut debt = Debt::new();

        let mut day_hours: HashMap<NaiveDate, f64> = HashMap::new();
        let mut pooled = 0.0;
        for entity in &records {
            if entity.status == RecordStatus::Pool.as_str() {
                pooled += entity.hours;
            } else {
                *day_hours.entry(entity.date.date_naive()).or_default() += entity.hours;
            }
        }

        let Some(start) = day_hours.keys().min().copied() else {
            return Ok(debt);
        };

        let today = self.clock.now().date_naive();
        let mut day = start;
        while day <= today {
            if !is_weekend(day) {
                let worked = day_hours.get(&day).copied().unwrap_or(0.0);
                let shortfall = work_time - worked;
                if shortfall > 0.0 {
                    debt.set(day, shortfall)?;
                }
            }
            day = day.succ_opt().unwrap();
        }

        debt.adjust(self.tracked_hours().await?);
        debt.adjust(pooled);

        Ok(debt)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    use crate::domain::{
        record::{OpenRecord, Record},
        repository::{RecordRepository, TrackRepository},
    };

    use super::super::{records::FileRecordRepository, track::FileTrackRepository};
    use super::*;

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    // a wednesday
    fn test_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    struct Fixture {
        records: FileRecordRepository,
        track: FileTrackRepository,
        stats: FileStatsRepository,
    }

    fn fixture(dir: &Path) -> Fixture {
        let cache = StoreCache::new();
        Fixture {
            records: FileRecordRepository::new(dir, cache.clone()),
            track: FileTrackRepository::new(dir, cache.clone()),
            stats: FileStatsRepository::new(dir, cache, Box::new(FixedClock(test_now()))),
        }
    }

    #[tokio::test]
    async fn sums_hours_by_date_and_status() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        f.records.save(&Record::close(test_now(), 1.0)?).await?;
        f.records.save(&Record::close(test_now(), 2.5)?).await?;
        let mut committed = Record::close(test_now(), 3.0)?;
        committed.commit()?;
        f.records.save(&committed).await?;

        let pending = f
            .stats
            .hours_by_date_status(test_now(), RecordStatus::Pending)
            .await?;
        assert!(close(pending, 3.5));

        let committed = f
            .stats
            .hours_by_date_status(test_now(), RecordStatus::Committed)
            .await?;
        assert!(close(committed, 3.0));
        Ok(())
    }

    #[tokio::test]
    async fn sums_pool_hours_across_dates() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        for days_back in [1, 8] {
            let mut record = Record::close(test_now() - Duration::days(days_back), 2.0)?;
            record.send_to_pool()?;
            f.records.save(&record).await?;
        }

        let pooled = f.stats.hours_by_status(RecordStatus::Pool).await?;
        assert!(close(pooled, 4.0));
        Ok(())
    }

    #[tokio::test]
    async fn tracked_hours_follow_the_open_record() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        assert!(close(f.stats.tracked_hours().await?, 0.0));

        f.track
            .save(&OpenRecord::new(test_now() - Duration::minutes(30)))
            .await?;
        assert!(close(f.stats.tracked_hours().await?, 0.5));
        Ok(())
    }

    #[tokio::test]
    async fn debt_collects_weekday_shortfalls() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        // monday fully committed, tuesday short by 5, wednesday untouched
        let monday = test_now() - Duration::days(2);
        let tuesday = test_now() - Duration::days(1);

        let mut full = Record::close(monday, 8.0)?;
        full.commit()?;
        f.records.save(&full).await?;
        f.records.save(&Record::close(tuesday, 3.0)?).await?;

        // a pooled chunk is excluded from the days and credited once
        let mut pooled = Record::close(tuesday, 2.0)?;
        pooled.send_to_pool()?;
        f.records.save(&pooled).await?;

        let debt = f.stats.debt(8.0).await?;
        assert_eq!(debt.len(), 2);

        let days: Vec<_> = debt.iter().map(|(date, hours)| (*date, *hours)).collect();
        assert_eq!(days[0].0, tuesday.date_naive());
        assert!(close(days[0].1, 5.0));
        assert_eq!(days[1].0, test_now().date_naive());
        assert!(close(days[1].1, 8.0));

        // 13 of shortfall, minus 0 tracked and 2 pooled
        assert!(close(debt.total(), 11.0));
        Ok(())
    }

    #[tokio::test]
    async fn debt_is_empty_without_records() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        let debt = f.stats.debt(8.0).await?;
        assert!(debt.is_empty());
        assert!(close(debt.total(), 0.0));
        Ok(())
    }

    #[tokio::test]
    async fn debt_skips_weekends() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        // friday before the test wednesday; saturday and sunday in between
        // must not produce debt
        let friday = test_now() - Duration::days(5);
        f.records.save(&Record::close(friday, 8.0)?).await?;

        let debt = f.stats.debt(8.0).await?;
        let days: Vec<_> = debt.iter().map(|(date, _)| *date).collect();
        assert_eq!(
            days,
            vec![
                (test_now() - Duration::days(2)).date_naive(),
                (test_now() - Duration::days(1)).date_naive(),
                test_now().date_naive(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn record_writes_refresh_stats() -> Result<()> {
        let dir = tempdir()?;
        let f = fixture(dir.path());

        f.records.save(&Record::close(test_now(), 1.0)?).await?;
        let before = f
            .stats
            .hours_by_date_status(test_now(), RecordStatus::Pending)
            .await?;
        assert!(close(before, 1.0));

        // the shared cache makes the second save visible to stats
        f.records.save(&Record::close(test_now(), 2.0)?).await?;
        let after = f
            .stats
            .hours_by_date_status(test_now(), RecordStatus::Pending)
            .await?;
        assert!(close(after, 3.0));
        Ok(())
    }
}
