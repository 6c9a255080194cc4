use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime};
use tracing::{debug, info};

use crate::domain::{
    debt::Debt,
    error::DomainError,
    record::{OpenRecord, Record, RecordStatus},
    time::at_clock_time,
};

use super::App;

impl App {
    /// Adds an already-quantified record at the cursor date.
    pub async fn add_record(&self, hours: f64) -> Result<()> {
        let record =
            Record::close(self.cursor_date(), hours).context("error creating new record")?;

        self.records
            .save(&record)
            .await
            .context("new record can't be inserted")?;

        info!("added {} hours", record.hours());
        Ok(())
    }

    /// Starts the timer now. Only meaningful on the current day.
    pub async fn start_record(&self) -> Result<()> {
        if !self.is_today() {
            return Err(DomainError::WrongDate.into());
        }

        self.start_record_on(self.now()).await
    }

    /// Starts the timer at a wall-clock time on the cursor date.
    pub async fn start_record_at(&self, clock_time: NaiveTime) -> Result<()> {
        let at = at_clock_time(self.cursor_date(), clock_time)?;
        self.start_record_on(at).await
    }

    async fn start_record_on(&self, at: DateTime<Local>) -> Result<()> {
        if self.track.is_working().await {
            return Err(DomainError::AlreadyWorking.into());
        }

        let open = OpenRecord::new(at);
        self.track
            .save(&open)
            .await
            .context("error saving new record")?;

        self.focus.lock().unwrap().start(at);

        info!("record started at {at}");
        Ok(())
    }

    /// Stops the timer now, returning the recorded hours.
    pub async fn stop_record(&self) -> Result<f64> {
        self.stop_record_on(self.now()).await
    }

    /// Stops the timer at a wall-clock time on the cursor date.
    pub async fn stop_record_at(&self, clock_time: NaiveTime) -> Result<f64> {
        let end = at_clock_time(self.cursor_date(), clock_time)?;
        self.stop_record_on(end).await
    }

    async fn stop_record_on(&self, end: DateTime<Local>) -> Result<f64> {
        if !self.track.is_working().await {
            return Err(DomainError::NotWorking.into());
        }

        let open = self.track.get().await?;

        let mut hours = 0.0;
        match open.close(end) {
            Ok(record) => {
                hours = record.hours();
                self.records
                    .save(&record)
                    .await
                    .context("error inserting new record")?;
            }
            // An empty timer leaves no record behind, but the slot is still
            // freed below.
            Err(DomainError::EmptyRecord) => debug!("empty record discarded"),
            Err(e) => return Err(e.into()),
        }

        self.track
            .delete()
            .await
            .context("error deleting open record")?;

        self.focus.lock().unwrap().end(end);

        info!("record stopped with {hours} hours");
        Ok(hours)
    }

    /// Discards the running timer, reporting how many hours were lost. An
    /// empty timer can't be closed and keeps the slot.
    pub async fn drop_record(&self) -> Result<f64> {
        if !self.track.is_working().await {
            return Err(DomainError::NotWorking.into());
        }

        let open = self.track.get().await?;
        let record = open.close(self.now()).context("can't close record")?;

        self.track
            .delete()
            .await
            .context("error deleting open record")?;

        self.focus.lock().unwrap().clear();

        Ok(record.hours())
    }

    /// Commits pending records for the cursor date against `amount` (the
    /// configured daily quota when not given). Overflow past the quota is
    /// split off into the pool, so the day's committed total never exceeds
    /// `amount`.
    pub async fn commit_all(&self, amount: Option<f64>) -> Result<()> {
        let amount = match amount {
            None => self.config.work_time(),
            Some(a) if a < 1.0 => return Err(DomainError::InvalidAmount.into()),
            Some(a) => a,
        };

        let date = self.cursor_date();
        let records = self
            .records
            .get_all_by_date_status(date, RecordStatus::Pending)
            .await?;

        let committed = self
            .stats
            .hours_by_date_status(date, RecordStatus::Committed)
            .await?;

        if committed >= amount {
            return Err(DomainError::AlreadyCommitted.into());
        }

        let mut remaining = amount - committed;

        for mut record in records {
            if remaining < record.hours() {
                let mut overflow = Record::close(record.date(), record.hours() - remaining)?;
                overflow.send_to_pool()?;
                self.records.save(&overflow).await?;

                if remaining == 0.0 {
                    // Nothing left to commit from this record.
                    self.records.delete(record.id()).await?;
                    continue;
                }

                record.update_hours(remaining)?;
                self.records.save(&record).await?;
            }

            if record.hours() <= 0.0 {
                continue;
            }

            record.commit()?;
            self.records.save(&record).await?;
            remaining -= record.hours();
        }

        self.focus.lock().unwrap().clear();

        info!("committed records up to {amount} hours");
        Ok(())
    }

    /// Parks every pending record of the cursor date in the pool. The records
    /// keep their original date until poured.
    pub async fn send_to_pool(&self) -> Result<()> {
        let records = self
            .records
            .get_all_by_date_status(self.cursor_date(), RecordStatus::Pending)
            .await?;

        for mut record in records {
            record.send_to_pool()?;
            self.records.save(&record).await?;
        }

        Ok(())
    }

    /// Moves every pooled record onto the cursor date as pending.
    pub async fn pour_pool(&self) -> Result<()> {
        let records = self
            .records
            .get_all_by_status(RecordStatus::Pool)
            .await?;

        let date = self.cursor_date();
        for mut record in records {
            record.pour(date)?;
            self.records.save(&record).await?;
        }

        Ok(())
    }

    pub fn change_date(&self, date: DateTime<Local>) {
        self.cursor.set(date, self.now());
    }

    pub async fn get_debt(&self) -> Result<Debt> {
        self.stats.debt(self.config.work_time()).await
    }

    /// Pending then committed records for the cursor date, the latter marked.
    pub async fn list_local(&self) -> Result<Vec<String>> {
        let date = self.cursor_date();

        let mut list = vec![];
        for record in self
            .records
            .get_all_by_date_status(date, RecordStatus::Pending)
            .await
            .context("can't get records")?
        {
            list.push(format!("{:.2}", record.hours()));
        }

        for record in self
            .records
            .get_all_by_date_status(date, RecordStatus::Committed)
            .await
            .context("can't get records")?
        {
            list.push(format!("[{:.2}] ✔", record.hours()));
        }

        Ok(list)
    }
}
