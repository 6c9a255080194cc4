//! The interactive loop: one foreground task reading and dispatching
//! commands, one background task refreshing the status prompt every second.
//! Both write the same snapshot behind a lock; command execution itself is
//! never concurrent.

pub mod handlers;
pub mod io;
pub mod mux;

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    app::{App, StatusFigures},
    domain::time::{format_duration, DATE_FORMAT},
};

use self::{io::LineIo, mux::Mux, mux::Request};

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

pub struct Repl {
    app: Arc<App>,
    mux: Mux,
    io: Arc<dyn LineIo>,
    exit: String,
    snapshot: Arc<RwLock<StatusFigures>>,
}

impl Repl {
    pub fn new(app: Arc<App>, mux: Mux, io: Arc<dyn LineIo>, exit: impl Into<String>) -> Self {
        Self {
            app,
            mux,
            io,
            exit: exit.into(),
            snapshot: Arc::new(RwLock::new(StatusFigures::default())),
        }
    }

    /// Runs the command loop until the exit keyword or end of input.
    pub async fn run(&self) -> Result<()> {
        let shutdown = CancellationToken::new();
        let refresher = tokio::spawn(refresh_background(
            self.app.clone(),
            self.io.clone(),
            self.snapshot.clone(),
            shutdown.clone(),
        ));

        loop {
            refresh_once(&self.app, self.io.as_ref(), &self.snapshot).await;

            let Ok(line) = self.io.read().await else {
                // input closed, same as an explicit exit
                break;
            };

            let cmd = line.trim();
            if cmd.eq_ignore_ascii_case(&self.exit) {
                break;
            }
            if cmd.is_empty() {
                continue;
            }

            self.mux.serve(Request::parse(cmd), &self.io).await;
        }

        shutdown.cancel();
        let _ = refresher.await;
        Ok(())
    }
}

/// Recomputes the figures, publishes them into the shared snapshot and
/// repaints the prompt from what the snapshot holds.
async fn refresh_once(app: &App, io: &dyn LineIo, snapshot: &RwLock<StatusFigures>) {
    match app.status_figures().await {
        Ok(figures) => {
            *snapshot.write().unwrap() = figures;
        }
        // keep showing the previous figures rather than a broken prompt
        Err(e) => warn!("prompt refresh failed {e:?}"),
    }

    let rendered = render_prompt(&snapshot.read().unwrap(), app.now());
    let _ = io.set_prompt(&rendered).await;
}

async fn refresh_background(
    app: Arc<App>,
    io: Arc<dyn LineIo>,
    snapshot: Arc<RwLock<StatusFigures>>,
    shutdown: CancellationToken,
) {
    let mut tick = tokio::time::interval(REFRESH_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tick.tick() => {}
        }

        refresh_once(&app, io.as_ref(), &snapshot).await;
    }
}

/// Renders the bracketed status segments in their fixed order, ending with
/// the prompt tag.
fn render_prompt(figures: &StatusFigures, now: DateTime<Local>) -> String {
    let mut bar = String::new();

    if figures.debt > 0.0 {
        bar += &format!("[Debt:{}]", format_duration(figures.debt));
    }
    if figures.worked > 0.0 {
        bar += &format!("[Worked:{}]", format_duration(figures.worked));
    }
    if figures.committed > 0.0 {
        bar += &format!("[Committed:{}]", format_duration(figures.committed));
    }
    if figures.pooled > 0.0 {
        bar += &format!("[Pool:{}]", format_duration(figures.pooled));
    }
    if figures.working {
        bar += &format!(
            "[Rec:{}][{}]",
            format_duration(figures.tracked),
            clock_glyph(now)
        );
    }
    if let Some(date) = figures.cursor {
        bar += &format!("[{}]", date.format(DATE_FORMAT));
    }
    if let Some(focus) = figures.focus {
        bar += &format!("[{}:{}%]", focus.phase.tag(), focus.percent);
        if focus.percent >= 100 {
            bar += alert_glyph(now);
        }
    }

    if bar.is_empty() {
        "tt > ".to_string()
    } else {
        format!("{bar} tt > ")
    }
}

const CLOCK_GLYPHS: [&str; 2] = [".", "'"];
const ALERT_GLYPHS: [&str; 2] = ["{!}", "{ }"];

fn clock_glyph(now: DateTime<Local>) -> &'static str {
    CLOCK_GLYPHS[(now.timestamp() % 2) as usize]
}

fn alert_glyph(now: DateTime<Local>) -> &'static str {
    ALERT_GLYPHS[(now.timestamp() % 2) as usize]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::{
        domain::{
            debt::Debt,
            record::{Record, RecordStatus},
            repository::{
                MockConfigRepository, MockRecordRepository, MockStatsRepository,
                MockTrackRepository,
            },
        },
        focus::{FocusCycle, FocusPhase},
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::{handlers, io::testing::ScriptedIo, *};

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    fn test_now() -> DateTime<Local> {
        // even timestamp, picks the first glyph
        let now = Local.with_ymd_and_hms(2024, 7, 4, 9, 0, 0).unwrap();
        if now.timestamp() % 2 == 0 {
            now
        } else {
            now + chrono::Duration::seconds(1)
        }
    }

    #[test]
    fn renders_segments_in_order() {
        let figures = StatusFigures {
            debt: 2.5,
            worked: 1.25,
            committed: 8.0,
            pooled: 0.5,
            tracked: 0.25,
            working: true,
            cursor: None,
            focus: None,
        };

        assert_eq!(
            render_prompt(&figures, test_now()),
            "[Debt:2:30][Worked:1:15][Committed:8:00][Pool:0:30][Rec:0:15][.] tt > "
        );
    }

    #[test]
    fn renders_the_bare_prompt() {
        assert_eq!(
            render_prompt(&StatusFigures::default(), test_now()),
            "tt > "
        );
    }

    #[test]
    fn renders_the_cursor_and_focus_segments() {
        let cursor = Local.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let figures = StatusFigures {
            cursor: Some(cursor),
            focus: Some(FocusCycle {
                count: 1,
                percent: 100,
                phase: FocusPhase::Break,
            }),
            ..Default::default()
        };

        assert_eq!(
            render_prompt(&figures, test_now()),
            "[24-07-01][b:100%]{!} tt > "
        );
    }

    fn quiet_stats() -> MockStatsRepository {
        let mut stats = MockStatsRepository::new();
        stats
            .expect_hours_by_date_status()
            .returning(|_, _| Ok(0.0));
        stats.expect_hours_by_status().returning(|_| Ok(0.0));
        stats.expect_tracked_hours().returning(|| Ok(0.0));
        stats.expect_debt().returning(|_| Ok(Debt::new()));
        stats
    }

    fn test_app(records: MockRecordRepository, track: MockTrackRepository) -> Arc<App> {
        let mut config = MockConfigRepository::new();
        config.expect_work_time().return_const(8.0);
        Arc::new(App::new(
            Box::new(config),
            Box::new(records),
            Box::new(track),
            Box::new(quiet_stats()),
            Box::new(FixedClock(test_now())),
        ))
    }

    #[tokio::test]
    async fn run_dispatches_until_exit() {
        *TEST_LOGGING;
        let mut records = MockRecordRepository::new();
        records
            .expect_save()
            .withf(|r| r.status() == RecordStatus::Pending && (r.hours() - 1.5).abs() < 1e-9)
            .times(1)
            .returning(|_| Ok(()));

        let mut track = MockTrackRepository::new();
        track.expect_is_working().returning(|| false);

        let app = test_app(records, track);
        let mux = handlers::register(app.clone());
        let scripted = Arc::new(ScriptedIo::new(&["add;1:30", "", "EXIT"]));
        let io: Arc<dyn LineIo> = scripted.clone();

        Repl::new(app, mux, io, "exit").run().await.unwrap();

        assert!(scripted.output().contains("1.50 hours inserted!"));
        // the prompt was refreshed before each read
        assert!(!scripted.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_stops_when_input_closes() {
        let mut records = MockRecordRepository::new();
        records
            .expect_get_all_by_date_status()
            .returning(|_, _| Ok(vec![]));

        let mut track = MockTrackRepository::new();
        track.expect_is_working().returning(|| false);

        let app = test_app(records, track);
        let mux = handlers::register(app.clone());
        let scripted = Arc::new(ScriptedIo::new(&["list"]));
        let io: Arc<dyn LineIo> = scripted.clone();

        // the script has no exit keyword; exhausting it ends the loop
        Repl::new(app, mux, io, "exit").run().await.unwrap();
        assert!(scripted.output().contains("No records found"));
    }
}
