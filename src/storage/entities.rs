use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    record::{OpenRecord, Record},
};

/// On-disk shape of a closed record, one JSON object per line of the records
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntity {
    pub id: String,
    pub date: DateTime<Local>,
    pub status: String,
    pub hours: f64,
}

impl RecordEntity {
    pub fn from_domain(record: &Record) -> Self {
        Self {
            id: record.id().to_string(),
            date: record.date(),
            status: record.status().as_str().to_string(),
            hours: record.hours(),
        }
    }

    pub fn into_domain(self) -> Result<Record, DomainError> {
        Record::restore(self.id, self.date, &self.status, self.hours)
    }
}

/// On-disk shape of the open-record slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRecordEntity {
    pub start: DateTime<Local>,
}

impl OpenRecordEntity {
    pub fn from_domain(open: &OpenRecord) -> Self {
        Self {
            start: open.start(),
        }
    }

    pub fn into_domain(self) -> OpenRecord {
        OpenRecord::new(self.start)
    }
}
