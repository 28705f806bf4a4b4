//! Elm-style state model for the alert dashboard.
//!
//! All display state lives in [`DashboardModel`]. Input, timer and data events
//! arrive as [`DashboardMsg`] values; side-effects are represented as
//! [`DashboardCmd`] values returned from the update function.
//!
//! **Design invariant:** the model is deterministic and testable. No I/O
//! happens here.

use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::store::{AlertRecord, ClearOutcome, SummaryStats};

use super::display::{DisplayRegions, Renderer, StatusIndicator};

/// Refresh period the dashboard starts with.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

// ──────────────────── views ────────────────────

/// Top-level views in the sidebar navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    /// Summary cards and the latest-alerts preview.
    #[default]
    Dashboard,
    /// Full alert history.
    Alerts,
    /// Placeholder for scoring model details.
    Models,
    /// Refresh rate and history maintenance.
    Settings,
}

/// Total number of views (used for prev/next wrapping).
const VIEW_COUNT: u8 = 4;

impl View {
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Alerts, Self::Models, Self::Settings];

    /// Lowercase identifier used in logs and the sidebar.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Alerts => "alerts",
            Self::Models => "models",
            Self::Settings => "settings",
        }
    }

    /// Capitalised title label.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Alerts => "Alerts",
            Self::Models => "Models",
            Self::Settings => "Settings",
        }
    }

    /// 1-based number for hotkey mapping (keys `1`–`4`).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Alerts => 2,
            Self::Models => 3,
            Self::Settings => 4,
        }
    }

    /// Resolve a 1-based number key to a view. Returns `None` for out-of-range.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Alerts),
            3 => Some(Self::Models),
            4 => Some(Self::Settings),
            _ => None,
        }
    }

    /// Next view, wrapping Settings → Dashboard.
    #[must_use]
    pub const fn next(self) -> Self {
        let n = self.number() % VIEW_COUNT + 1;
        match Self::from_number(n) {
            Some(v) => v,
            None => Self::Dashboard,
        }
    }

    /// Previous view, wrapping Dashboard → Settings.
    #[must_use]
    pub const fn prev(self) -> Self {
        let n = if self.number() == 1 {
            VIEW_COUNT
        } else {
            self.number() - 1
        };
        match Self::from_number(n) {
            Some(v) => v,
            None => Self::Settings,
        }
    }
}

// ──────────────────── app state ────────────────────

/// Current view plus the active polling period.
///
/// Created once per dashboard session and mutated only through `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppState {
    pub view: View,
    pub poll_interval: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Dashboard,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ──────────────────── overlays & notices ────────────────────

/// Floating surfaces over the current view. Only one at a time; overlays take
/// input precedence over view keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Key map (`?`).
    Help,
    /// Modal yes/no before deleting all alert history.
    ConfirmClear,
}

/// Prompt shown by the clear-history confirmation overlay.
pub const CLEAR_CONFIRM_PROMPT: &str =
    "Are you sure you want to clear all history? This cannot be undone.";

/// A user-visible message line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Monotonic id.
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

// ──────────────────── model ────────────────────

/// Complete state of one dashboard session.
#[derive(Debug)]
pub struct DashboardModel {
    pub app: AppState,
    /// Display tree the painter reads.
    pub display: DisplayRegions,
    /// False when the store could not be opened; data operations become no-ops.
    pub connected: bool,
    pub overlay: Option<Overlay>,
    /// Terminal dimensions (columns, rows).
    pub terminal_size: (u16, u16),
    /// Monotonic poller tick counter.
    pub tick: u64,
    /// Selectable refresh periods on the settings view.
    pub presets: Vec<Duration>,
    /// Cursor into `presets`.
    pub settings_selected: usize,
    /// Count of store reads that failed.
    pub query_errors: u64,
    /// Operation and error code of the most recent failed read.
    pub last_query_error: Option<(&'static str, &'static str)>,
    /// Ticks coalesced away because the loop overran.
    pub missed_ticks: u64,
    /// Degradation state of the activity log (`normal`, `stderr`, `discard`).
    pub log_state: &'static str,
    pub quit: bool,
}

impl DashboardModel {
    /// Fresh session on the dashboard view.
    #[must_use]
    pub fn new(
        poll_interval: Duration,
        presets: Vec<Duration>,
        connected: bool,
        terminal_size: (u16, u16),
    ) -> Self {
        let mut model = Self {
            app: AppState {
                view: View::Dashboard,
                poll_interval,
            },
            display: DisplayRegions::default(),
            connected,
            overlay: None,
            terminal_size,
            tick: 0,
            presets,
            settings_selected: 0,
            query_errors: 0,
            last_query_error: None,
            missed_ticks: 0,
            log_state: "discard",
            quit: false,
        };
        model.sync_settings_cursor();
        if !connected {
            model.display.render_status(StatusIndicator::Disconnected);
        }
        model
    }

    /// Point the settings cursor at the preset matching the active period.
    pub fn sync_settings_cursor(&mut self) {
        if let Some(idx) = self.presets.iter().position(|p| *p == self.app.poll_interval) {
            self.settings_selected = idx;
        }
    }

    /// Preset under the settings cursor.
    #[must_use]
    pub fn selected_preset(&self) -> Option<Duration> {
        self.presets.get(self.settings_selected).copied()
    }
}

// ──────────────────── messages ────────────────────

/// Events that drive state transitions in the dashboard model.
#[derive(Debug, Clone)]
pub enum DashboardMsg {
    /// Poller tick.
    Tick,
    /// Terminal key press.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize { cols: u16, rows: u16 },
    SwitchView(View),
    NextView,
    PrevView,
    /// Re-fetch the full history table.
    RefreshHistory,
    SettingsCursorUp,
    SettingsCursorDown,
    /// Apply the preset under the settings cursor.
    ApplySelectedRate,
    SetRefreshRate(Duration),
    /// Ask for confirmation before clearing history.
    RequestClearHistory,
    ConfirmClear,
    CancelClear,
    ToggleHelp,
    CloseOverlay,
    DismissNotices,
    SummaryLoaded(SummaryStats),
    PreviewLoaded(Vec<AlertRecord>),
    HistoryLoaded(Vec<AlertRecord>),
    /// A store read failed; the affected render is skipped.
    QueryFailed { op: &'static str, code: &'static str },
    ClearCompleted(ClearOutcome),
    ClearFailed(String),
    /// The runtime coalesced overrun ticks.
    MissedTicks(u64),
    Quit,
}

// ──────────────────── commands ────────────────────

/// Side-effects returned by the update function for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCmd {
    None,
    /// Count and max score, delivered as `SummaryLoaded`.
    FetchSummary,
    /// Latest 10 alerts, delivered as `PreviewLoaded`.
    FetchPreview,
    /// Latest 50 alerts, delivered as `HistoryLoaded`.
    FetchHistory,
    /// Replace the poller's timer with one of the given period.
    RestartPoller(Duration),
    /// Delete all history, delivered as `ClearCompleted` or `ClearFailed`.
    ClearHistory,
    Quit,
    Batch(Vec<Self>),
}

impl DashboardCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

// ──────────────────── tests ────────────────────
