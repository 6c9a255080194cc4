//! Work/break cycle feedback derived from the elapsed time of the running
//! timer. Purely advisory: phase changes are announced through the log and
//! reflected in the status line, nothing here touches the ledger.

use std::{collections::HashMap, hash::Hash};

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use tracing::info;

const WORK_MINUTES: f64 = 25.0;
const BREAK_MINUTES: f64 = 5.0;
const LONG_BREAK_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusPhase {
    Work,
    Break,
    LongBreak,
}

impl FocusPhase {
    /// Short tag shown in the status line.
    pub fn tag(self) -> &'static str {
        match self {
            FocusPhase::Work => "w",
            FocusPhase::Break => "b",
            FocusPhase::LongBreak => "lb",
        }
    }
}

/// Where in the work/break schedule a given amount of elapsed time lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusCycle {
    /// Completed work blocks.
    pub count: i32,
    /// Progress through the current phase, 0..=100.
    pub percent: i32,
    pub phase: FocusPhase,
}

/// Maps elapsed hours onto the 25/5/15 schedule: four work blocks with short
/// breaks between them, then a long break.
pub fn cycle(elapsed_hours: f64) -> FocusCycle {
    let mut t = elapsed_hours * 60.0;

    let cycle_duration = 4.0 * WORK_MINUTES + 3.0 * BREAK_MINUTES + LONG_BREAK_MINUTES;
    let cycles = (t / cycle_duration) as i32;
    t -= cycles as f64 * cycle_duration;

    let mut count = cycles * 4;

    let pair_duration = WORK_MINUTES + BREAK_MINUTES;
    let mut pairs = (t / pair_duration) as i32;
    if pairs > 3 {
        pairs = 3;
    }
    count += pairs;
    t -= pairs as f64 * pair_duration;

    if t < WORK_MINUTES {
        return FocusCycle {
            count,
            percent: percentage(t, WORK_MINUTES),
            phase: FocusPhase::Work,
        };
    }

    count += 1;
    t -= WORK_MINUTES;

    if count % 4 == 0 {
        FocusCycle {
            count,
            percent: percentage(t, LONG_BREAK_MINUTES),
            phase: FocusPhase::LongBreak,
        }
    } else {
        FocusCycle {
            count,
            percent: percentage(t, BREAK_MINUTES),
            phase: FocusPhase::Break,
        }
    }
}

fn percentage(t: f64, duration: f64) -> i32 {
    ((t / duration) * 100.0) as i32
}

type TransitionFn<S> = Box<dyn Fn(S, S) -> Result<()> + Send + Sync>;

/// Dispatch table for state changes, keyed by the exact `(from, to)` pair.
/// Pairs that were never registered are invalid transitions.
pub struct TransitionTable<S> {
    handlers: HashMap<(S, S), TransitionFn<S>>,
    current: S,
}

impl<S: Copy + Eq + Hash + std::fmt::Debug> TransitionTable<S> {
    pub fn new(initial: S) -> Self {
        Self {
            handlers: HashMap::new(),
            current: initial,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn reset(&mut self, state: S) {
        self.current = state;
    }

    pub fn register(&mut self, from: S, to: S, handler: TransitionFn<S>) {
        self.handlers.insert((from, to), handler);
    }

    /// Runs the registered handler and advances the state.
    pub fn update(&mut self, to: S) -> Result<()> {
        let Some(handler) = self.handlers.get(&(self.current, to)) else {
            bail!("invalid transition from {:?} to {:?}", self.current, to);
        };

        handler(self.current, to)?;
        self.current = to;
        Ok(())
    }
}

/// Tracks the live focus session and announces phase changes.
pub struct FocusTracker {
    start: Option<DateTime<Local>>,
    table: TransitionTable<FocusPhase>,
}

impl FocusTracker {
    pub fn new() -> Self {
        let mut table = TransitionTable::new(FocusPhase::Work);

        for (from, to, message) in [
            (FocusPhase::Work, FocusPhase::Break, "Take a short break!"),
            (FocusPhase::Work, FocusPhase::LongBreak, "Long break time!!"),
            (FocusPhase::Break, FocusPhase::Work, "Time to continue working!"),
            (
                FocusPhase::LongBreak,
                FocusPhase::Work,
                "Time to continue working!",
            ),
        ] {
            table.register(
                from,
                to,
                Box::new(move |_, _| {
                    info!("{message}");
                    Ok(())
                }),
            );
        }

        Self { start: None, table }
    }

    pub fn start(&mut self, at: DateTime<Local>) {
        self.start = Some(at);
        self.table.reset(FocusPhase::Work);
    }

    pub fn end(&mut self, _at: DateTime<Local>) {
        self.start = None;
    }

    pub fn clear(&mut self) {
        self.start = None;
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Current cycle for a live session, advancing the phase table when the
    /// schedule moved on.
    pub fn observe(&mut self, now: DateTime<Local>) -> Option<FocusCycle> {
        let start = self.start?;
        let cycle = cycle((now - start).num_seconds() as f64 / 3600.0);

        if cycle.phase != self.table.current() {
            // Same-phase ticks don't dispatch; a failed dispatch only means
            // the announcement is skipped.
            let _ = self.table.update(cycle.phase);
        }

        Some(cycle)
    }
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self::new()
    }
}
