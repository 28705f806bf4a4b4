//! Dashboard runtime: executes commands against the store and drives the
//! terminal event loop.
//!
//! Everything runs on one thread. The loop waits for terminal input no longer
//! than the time to the next poller tick, feeds messages through `update`, and
//! executes the returned commands synchronously on the single store connection.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::core::errors::{Result, VesperError};
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::store::{AlertStore, FeedLimit};

use super::model::{DashboardCmd, DashboardModel, DashboardMsg};
use super::poller::Poller;
use super::update::update;

/// Upper bound on one input wait, so shutdown flags are seen promptly.
const MAX_INPUT_WAIT: Duration = Duration::from_millis(250);

// ──────────────────── command executor ────────────────────

/// Owns the effectful side of the dashboard: the store, the poller and the
/// activity log.
pub struct CommandExecutor {
    store: Option<Box<dyn AlertStore>>,
    poller: Poller,
    log: JsonlWriter,
}

impl CommandExecutor {
    /// `store` is `None` when the database could not be opened.
    pub fn new(store: Option<Box<dyn AlertStore>>, log: JsonlWriter) -> Self {
        Self {
            store,
            poller: Poller::new(),
            log,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Start the poll schedule. Without a store there is nothing to poll.
    pub fn start_polling(&mut self, period: Duration, now: Instant) -> Result<()> {
        if self.store.is_none() {
            return Ok(());
        }
        self.poller.start(period, now)
    }

    pub fn log(&mut self, entry: &LogEntry) {
        self.log.write_entry(entry);
    }

    pub fn flush_log(&mut self) {
        self.log.flush();
    }

    /// Run one command and return the messages it produced.
    pub fn execute(&mut self, cmd: DashboardCmd, now: Instant) -> Vec<DashboardMsg> {
        match cmd {
            DashboardCmd::None | DashboardCmd::Quit => Vec::new(),
            DashboardCmd::Batch(cmds) => cmds
                .into_iter()
                .flat_map(|c| self.execute(c, now))
                .collect(),
            DashboardCmd::FetchSummary => {
                let Some(store) = self.store.as_ref() else {
                    return Vec::new();
                };
                match store.summary() {
                    Ok(stats) => vec![DashboardMsg::SummaryLoaded(stats)],
                    Err(err) => vec![self.query_failed("summary", &err)],
                }
            }
            DashboardCmd::FetchPreview => self.fetch_rows(FeedLimit::Preview),
            DashboardCmd::FetchHistory => self.fetch_rows(FeedLimit::History),
            DashboardCmd::RestartPoller(period) => {
                if self.store.is_none() {
                    return Vec::new();
                }
                match self.poller.start(period, now) {
                    Ok(()) => {
                        let ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
                        self.log(
                            &LogEntry::new(EventType::PollIntervalChanged, Severity::Info)
                                .with_interval_ms(ms),
                        );
                    }
                    Err(err) => self.log(
                        &LogEntry::new(EventType::PollIntervalChanged, Severity::Warning)
                            .with_error(&err),
                    ),
                }
                Vec::new()
            }
            DashboardCmd::ClearHistory => {
                let Some(store) = self.store.as_mut() else {
                    return Vec::new();
                };
                match store.clear_all() {
                    Ok(outcome) => {
                        self.log(
                            &LogEntry::new(EventType::HistoryCleared, Severity::Info)
                                .with_count(u64::try_from(outcome.deleted).unwrap_or(u64::MAX))
                                .with_details(format!("sequence_reset={}", outcome.sequence_reset)),
                        );
                        vec![DashboardMsg::ClearCompleted(outcome)]
                    }
                    Err(err) => {
                        self.log(
                            &LogEntry::new(EventType::ClearFailed, Severity::Error).with_error(&err),
                        );
                        vec![DashboardMsg::ClearFailed(err.to_string())]
                    }
                }
            }
        }
    }

    fn fetch_rows(&mut self, limit: FeedLimit) -> Vec<DashboardMsg> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };
        match (store.list_latest(limit), limit) {
            (Ok(rows), FeedLimit::Preview) => vec![DashboardMsg::PreviewLoaded(rows)],
            (Ok(rows), FeedLimit::History) => vec![DashboardMsg::HistoryLoaded(rows)],
            (Err(err), FeedLimit::Preview) => vec![self.query_failed("list_preview", &err)],
            (Err(err), FeedLimit::History) => vec![self.query_failed("list_history", &err)],
        }
    }

    fn query_failed(&mut self, op: &'static str, err: &VesperError) -> DashboardMsg {
        // Transient failures heal on the next tick; anything else needs an operator.
        let severity = if err.is_retryable() {
            Severity::Warning
        } else {
            Severity::Error
        };
        self.log(
            &LogEntry::new(EventType::QueryFailed, severity)
                .with_error(err)
                .with_details(op),
        );
        DashboardMsg::QueryFailed {
            op,
            code: err.code(),
        }
    }

    /// Degradation state of the activity log.
    pub fn log_state(&self) -> &'static str {
        self.log.state()
    }
}

// ──────────────────── dispatch ────────────────────

/// Feed `msg` through `update` and execute commands until the queue drains.
pub fn dispatch(
    model: &mut DashboardModel,
    executor: &mut CommandExecutor,
    msg: DashboardMsg,
    now: Instant,
) {
    let mut queue = VecDeque::from([msg]);
    while let Some(msg) = queue.pop_front() {
        model.log_state = executor.log_state();
        let before = model.app.view;
        let cmd = update(model, msg);
        if model.app.view != before {
            executor.log(
                &LogEntry::new(EventType::ViewSwitch, Severity::Info).with_view(model.app.view.name()),
            );
        }
        for cmd in cmd.flatten() {
            queue.extend(executor.execute(cmd, now));
        }
    }
    model.log_state = executor.log_state();
}

/// Deliver a poller tick if one is due. Returns whether a tick fired.
pub fn drive_poller(model: &mut DashboardModel, executor: &mut CommandExecutor, now: Instant) -> bool {
    let Some(skipped) = executor.poller.poll_due(now) else {
        return false;
    };
    if skipped > 0 {
        dispatch(model, executor, DashboardMsg::MissedTicks(skipped), now);
    }
    dispatch(model, executor, DashboardMsg::Tick, now);
    true
}

// ──────────────────── terminal loop ────────────────────

#[cfg(feature = "sqlite")]
pub use terminal::{DashboardRuntimeConfig, run_dashboard};

#[cfg(feature = "sqlite")]
mod terminal {
    use std::io;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use crossterm::event::{self, Event, KeyEventKind};

    use super::{CommandExecutor, MAX_INPUT_WAIT, dispatch, drive_poller};
    use crate::core::errors::{Result, VesperError};
    use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
    use crate::store::AlertStore;
    use crate::store::sqlite::SqliteAlertStore;
    use crate::tui::model::{DashboardModel, DashboardMsg};
    use crate::tui::render::render_frame;
    use crate::tui::signals::ShutdownSignals;
    use crate::tui::terminal_guard::TerminalGuard;

    /// Everything one dashboard session needs.
    #[derive(Debug, Clone)]
    pub struct DashboardRuntimeConfig {
        pub db_path: PathBuf,
        pub busy_timeout: Duration,
        pub poll_interval: Duration,
        pub presets: Vec<Duration>,
        pub log: JsonlConfig,
    }

    /// Open the store, take over the terminal, and run until quit or signal.
    ///
    /// A store that cannot be opened is logged and the dashboard runs
    /// disconnected: navigation works, data operations do nothing.
    pub fn run_dashboard(config: &DashboardRuntimeConfig) -> Result<()> {
        let mut log = JsonlWriter::open(config.log.clone());
        let store: Option<Box<dyn AlertStore>> =
            match SqliteAlertStore::open(&config.db_path, config.busy_timeout) {
                Ok(store) => {
                    log.write_entry(
                        &LogEntry::new(EventType::StoreConnected, Severity::Info)
                            .with_details(config.db_path.display().to_string()),
                    );
                    Some(Box::new(store))
                }
                Err(err) => {
                    log.write_entry(
                        &LogEntry::new(EventType::StoreUnavailable, Severity::Warning)
                            .with_error(&err),
                    );
                    None
                }
            };

        let mut executor = CommandExecutor::new(store, log);
        let signals = ShutdownSignals::register();
        let interval_ms = u64::try_from(config.poll_interval.as_millis()).unwrap_or(u64::MAX);
        executor.log(
            &LogEntry::new(EventType::DashboardStart, Severity::Info).with_interval_ms(interval_ms),
        );

        let guard = TerminalGuard::new().map_err(|source| VesperError::Terminal { source })?;
        let mut model = DashboardModel::new(
            config.poll_interval,
            config.presets.clone(),
            executor.is_connected(),
            TerminalGuard::terminal_size(),
        );
        model.log_state = executor.log_state();
        executor.start_polling(config.poll_interval, Instant::now())?;

        let result = event_loop(&mut model, &mut executor, &signals);
        drop(guard);

        executor.log(&LogEntry::new(EventType::DashboardStop, Severity::Info).with_count(model.tick));
        executor.flush_log();
        result.map_err(|source| VesperError::Terminal { source })
    }

    fn event_loop(
        model: &mut DashboardModel,
        executor: &mut CommandExecutor,
        signals: &ShutdownSignals,
    ) -> io::Result<()> {
        let mut stdout = io::stdout();
        let mut dirty = true;

        loop {
            if signals.should_shutdown() || model.quit {
                return Ok(());
            }
            if dirty {
                render_frame(&mut stdout, model)?;
                dirty = false;
            }

            let wait = executor
                .poller()
                .time_until_due(Instant::now())
                .map_or(MAX_INPUT_WAIT, |d| d.min(MAX_INPUT_WAIT));

            if event::poll(wait)? {
                let msg = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(DashboardMsg::Key(key)),
                    Event::Resize(cols, rows) => Some(DashboardMsg::Resize { cols, rows }),
                    _ => None,
                };
                if let Some(msg) = msg {
                    dispatch(model, executor, msg, Instant::now());
                    dirty = true;
                }
            }

            if drive_poller(model, executor, Instant::now()) {
                dirty = true;
            }
        }
    }
}

// ──────────────────── tests ────────────────────
