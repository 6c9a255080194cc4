use std::sync::RwLock;

use chrono::{DateTime, Local};

/// The currently selected working day. `None` is the "today" sentinel, so a
/// cursor left alone always follows the wall clock.
///
/// Reads come from the prompt refresher concurrently with command execution,
/// hence the lock.
#[derive(Debug, Default)]
pub struct DateCursor {
    date: RwLock<Option<DateTime<Local>>>,
}

impl DateCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.date.read().unwrap().unwrap_or(now)
    }

    /// Selecting the literal current day resets the cursor to the sentinel.
    pub fn set(&self, date: DateTime<Local>, now: DateTime<Local>) {
        let mut guard = self.date.write().unwrap();
        *guard = if date.date_naive() == now.date_naive() {
            None
        } else {
            Some(date)
        };
    }

    pub fn is_today(&self) -> bool {
        self.date.read().unwrap().is_none()
    }
}
