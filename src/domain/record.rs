use std::fmt;

use chrono::{DateTime, Local};
use uuid::Uuid;

use super::{error::DomainError, time::round_hours};

/// Positive task time, kept at minute granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hours(f64);

impl Hours {
    pub fn new(hours: f64) -> Result<Self, DomainError> {
        let rounded = round_hours(hours);
        if rounded <= 0.0 {
            return Err(DomainError::InvalidHours);
        }
        Ok(Self(rounded))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// Counted toward the day's quota but not yet committed.
    Pending,
    /// Accepted against the daily quota. Terminal.
    Committed,
    /// Parked without a meaningful date until poured.
    Pool,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Committed => "committed",
            RecordStatus::Pool => "pool",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(RecordStatus::Pending),
            "committed" => Ok(RecordStatus::Committed),
            "pool" => Ok(RecordStatus::Pool),
            _ => Err(DomainError::InvalidStatus),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed, dated, quantified unit of tracked work time.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    date: DateTime<Local>,
    status: RecordStatus,
    hours: Hours,
}

impl Record {
    /// Closes out a chunk of work as a fresh pending record.
    pub fn close(date: DateTime<Local>, hours: f64) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            date,
            status: RecordStatus::Pending,
            hours: Hours::new(hours)?,
        })
    }

    /// Rebuilds a record from its stored parts.
    pub fn restore(
        id: String,
        date: DateTime<Local>,
        status: &str,
        hours: f64,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            date,
            status: RecordStatus::parse(status)?,
            hours: Hours::new(hours)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> DateTime<Local> {
        self.date
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn hours(&self) -> f64 {
        self.hours.get()
    }

    pub fn send_to_pool(&mut self) -> Result<(), DomainError> {
        if self.status != RecordStatus::Pending {
            return Err(DomainError::InvalidTransition {
                expected: "pending",
                action: "send to pool",
            });
        }
        self.status = RecordStatus::Pool;
        Ok(())
    }

    /// Attaches a pooled record to `date` and makes it pending again.
    pub fn pour(&mut self, date: DateTime<Local>) -> Result<(), DomainError> {
        if self.status != RecordStatus::Pool {
            return Err(DomainError::InvalidTransition {
                expected: "in pool",
                action: "pour",
            });
        }
        self.date = date;
        self.status = RecordStatus::Pending;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), DomainError> {
        if self.status != RecordStatus::Pending {
            return Err(DomainError::InvalidTransition {
                expected: "pending",
                action: "commit",
            });
        }
        self.status = RecordStatus::Committed;
        Ok(())
    }

    pub fn update_hours(&mut self, hours: f64) -> Result<(), DomainError> {
        if self.status != RecordStatus::Pending {
            return Err(DomainError::InvalidTransition {
                expected: "pending",
                action: "update hours",
            });
        }
        self.hours = Hours::new(hours)?;
        Ok(())
    }
}

/// The single in-progress timer. At most one exists, enforced by the track
/// repository's slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenRecord {
    start: DateTime<Local>,
}

impl OpenRecord {
    pub fn new(start: DateTime<Local>) -> Self {
        Self { start }
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    /// Converts the timer into a pending record ending at `end`.
    pub fn close(&self, end: DateTime<Local>) -> Result<Record, DomainError> {
        let hours = round_hours((end - self.start).num_seconds() as f64 / 3600.0);
        if hours <= 0.0 {
            return Err(DomainError::EmptyRecord);
        }
        Record::close(self.start, hours)
    }

    /// Rounded time elapsed since the timer began.
    pub fn elapsed_hours(&self, now: DateTime<Local>) -> f64 {
        round_hours((now - self.start).num_seconds() as f64 / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn day() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn close_rejects_non_positive_hours() {
        assert_eq!(Record::close(day(), 0.0), Err(DomainError::InvalidHours));
        assert_eq!(Record::close(day(), -1.5), Err(DomainError::InvalidHours));
        // rounds down to zero minutes
        assert_eq!(
            Record::close(day(), 10.0 / 3600.0),
            Err(DomainError::InvalidHours)
        );
    }

    #[test]
    fn close_stores_rounded_hours() {
        let record = Record::close(day(), 1.501).unwrap();
        assert_eq!(record.status(), RecordStatus::Pending);
        assert!(close_to(record.hours(), 1.5));
        assert_eq!(record.date(), day());
    }

    #[test]
    fn pool_and_pour_round_trip() {
        let mut record = Record::close(day(), 2.0).unwrap();
        record.send_to_pool().unwrap();
        assert_eq!(record.status(), RecordStatus::Pool);

        let target = day() + Duration::days(3);
        record.pour(target).unwrap();
        assert_eq!(record.status(), RecordStatus::Pending);
        assert_eq!(record.date(), target);
        assert!(close_to(record.hours(), 2.0));
    }

    #[test]
    fn pour_requires_pool_status() {
        let mut record = Record::close(day(), 2.0).unwrap();
        assert!(matches!(
            record.pour(day()),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn commit_is_terminal() {
        let mut record = Record::close(day(), 2.0).unwrap();
        record.commit().unwrap();
        assert_eq!(record.status(), RecordStatus::Committed);
        assert!(matches!(
            record.commit(),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            record.send_to_pool(),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            record.update_hours(1.0),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn update_hours_validates() {
        let mut record = Record::close(day(), 2.0).unwrap();
        assert_eq!(record.update_hours(0.0), Err(DomainError::InvalidHours));
        record.update_hours(3.25).unwrap();
        assert!(close_to(record.hours(), 3.25));
    }

    #[test]
    fn open_record_close_requires_positive_elapsed() {
        let open = OpenRecord::new(day());
        assert_eq!(open.close(day()), Err(DomainError::EmptyRecord));
        assert_eq!(
            open.close(day() - Duration::hours(1)),
            Err(DomainError::EmptyRecord)
        );
        // under half a minute rounds to nothing
        assert_eq!(
            open.close(day() + Duration::seconds(20)),
            Err(DomainError::EmptyRecord)
        );
    }

    #[test]
    fn open_record_close_rounds_elapsed() {
        let open = OpenRecord::new(day());
        let record = open.close(day() + Duration::minutes(5)).unwrap();
        assert_eq!(record.status(), RecordStatus::Pending);
        assert_eq!(record.date(), day());
        assert!(close_to(record.hours(), 5.0 / 60.0));
    }

    #[test]
    fn elapsed_hours_rounds_to_minutes() {
        let open = OpenRecord::new(day());
        assert!(close_to(
            open.elapsed_hours(day() + Duration::seconds(299)),
            5.0 / 60.0
        ));
    }

    #[test]
    fn status_parses_and_prints() {
        for status in [
            RecordStatus::Pending,
            RecordStatus::Committed,
            RecordStatus::Pool,
        ] {
            assert_eq!(RecordStatus::parse(status.as_str()).unwrap(), status);
        }
        assert_eq!(RecordStatus::parse("open"), Err(DomainError::InvalidStatus));
    }
}
