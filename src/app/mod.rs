//! The use-case engine. Owns the date cursor and the focus tracker, talks to
//! persistence only through the repository traits, and performs no locking
//! around mutations: the dispatch loop executes commands one at a time.

mod status;
mod usecases;

use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::{
    domain::{
        cursor::DateCursor,
        repository::{ConfigRepository, RecordRepository, StatsRepository, TrackRepository},
    },
    focus::FocusTracker,
    utils::clock::Clock,
};

pub use status::StatusFigures;

pub struct App {
    config: Box<dyn ConfigRepository>,
    records: Box<dyn RecordRepository>,
    track: Box<dyn TrackRepository>,
    stats: Box<dyn StatsRepository>,
    clock: Box<dyn Clock>,
    cursor: DateCursor,
    focus: Mutex<FocusTracker>,
}

impl App {
    pub fn new(
        config: Box<dyn ConfigRepository>,
        records: Box<dyn RecordRepository>,
        track: Box<dyn TrackRepository>,
        stats: Box<dyn StatsRepository>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config,
            records,
            track,
            stats,
            clock,
            cursor: DateCursor::new(),
            focus: Mutex::new(FocusTracker::new()),
        }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// The day date-scoped operations run against.
    pub fn cursor_date(&self) -> DateTime<Local> {
        self.cursor.get(self.clock.now())
    }

    pub fn is_today(&self) -> bool {
        self.cursor.is_today()
    }
}
