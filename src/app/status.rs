use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tokio::time::timeout;

use crate::{domain::record::RecordStatus, focus::FocusCycle};

use super::App;

/// Stats calls serve the once-a-second prompt refresh, a stalled store must
/// not wedge it for longer than this.
const STATS_TIMEOUT: Duration = Duration::from_secs(5);

/// One refresh worth of prompt figures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusFigures {
    /// Pending hours on the cursor date.
    pub worked: f64,
    /// Committed hours on the cursor date.
    pub committed: f64,
    /// Hours parked in the pool, any date.
    pub pooled: f64,
    /// Rounded hours of the running timer.
    pub tracked: f64,
    /// Net debt total.
    pub debt: f64,
    pub working: bool,
    /// `None` while the cursor sits on today.
    pub cursor: Option<DateTime<Local>>,
    pub focus: Option<FocusCycle>,
}

impl App {
    /// Recomputes the aggregate figures behind the status line.
    pub async fn status_figures(&self) -> Result<StatusFigures> {
        let date = self.cursor_date();

        let worked = timeout(
            STATS_TIMEOUT,
            self.stats.hours_by_date_status(date, RecordStatus::Pending),
        )
        .await
        .context("worked hours timed out")??;

        let committed = timeout(
            STATS_TIMEOUT,
            self.stats
                .hours_by_date_status(date, RecordStatus::Committed),
        )
        .await
        .context("committed hours timed out")??;

        let pooled = timeout(STATS_TIMEOUT, self.stats.hours_by_status(RecordStatus::Pool))
            .await
            .context("pooled hours timed out")??;

        let tracked = timeout(STATS_TIMEOUT, self.stats.tracked_hours())
            .await
            .context("tracked hours timed out")??;

        let debt = timeout(STATS_TIMEOUT, self.stats.debt(self.config.work_time()))
            .await
            .context("debt timed out")??
            .total();

        let working = timeout(STATS_TIMEOUT, self.track.is_working())
            .await
            .context("working flag timed out")?;

        let focus = self.focus.lock().unwrap().observe(self.now());

        Ok(StatusFigures {
            worked,
            committed,
            pooled,
            tracked,
            debt,
            working,
            cursor: if self.is_today() { None } else { Some(date) },
            focus,
        })
    }
}
