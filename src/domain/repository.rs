use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
#[cfg(test)]
use mockall::automock;

use super::{
    debt::Debt,
    record::{OpenRecord, Record, RecordStatus},
};

/// Persistence contract for closed records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Inserts the record, or overwrites the stored one with the same id.
    async fn save(&self, record: &Record) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Record>;
    /// All records whose date falls on the same day as `date`, with `status`.
    async fn get_all_by_date_status(
        &self,
        date: DateTime<Local>,
        status: RecordStatus,
    ) -> Result<Vec<Record>>;
    async fn get_all_by_status(&self, status: RecordStatus) -> Result<Vec<Record>>;
}

/// Persistence contract for the single open-record slot.
///
/// `save` must be atomic with respect to the slot: two concurrent saves can
/// never both succeed, even across processes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrackRepository: Send + Sync {
    async fn save(&self, open: &OpenRecord) -> Result<()>;
    async fn get(&self) -> Result<OpenRecord>;
    async fn delete(&self) -> Result<()>;
    async fn is_working(&self) -> bool;
}

/// Read-only aggregates over the stored records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn hours_by_date_status(
        &self,
        date: DateTime<Local>,
        status: RecordStatus,
    ) -> Result<f64>;
    async fn hours_by_status(&self, status: RecordStatus) -> Result<f64>;
    /// Rounded hours of the currently running timer, 0 when idle.
    async fn tracked_hours(&self) -> Result<f64>;
    /// Weekday shortfalls against `work_time`, net of tracked and pooled
    /// credits.
    async fn debt(&self, work_time: f64) -> Result<Debt>;
}

#[cfg_attr(test, automock)]
pub trait ConfigRepository: Send + Sync {
    fn work_time(&self) -> f64;
    fn log_level(&self) -> String;
}
