//! Pure update function for the Elm-style dashboard.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the runtime should execute.
//!
//! **Design invariant:** this module performs zero I/O. All effects are
//! described as [`DashboardCmd`] values.

use std::time::Duration;

use super::display::{AlertTable, Renderer};
use super::input::{InputContext, resolve_key_event};
use super::model::{DashboardCmd, DashboardModel, DashboardMsg, NoticeLevel, Overlay, View};

pub const CLEAR_SUCCESS_NOTICE: &str = "History cleared successfully.";

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut DashboardModel, msg: DashboardMsg) -> DashboardCmd {
    match msg {
        DashboardMsg::Tick => {
            model.tick = model.tick.wrapping_add(1);
            // Only the dashboard view polls; other views keep their last data.
            if model.app.view != View::Dashboard || !model.connected {
                return DashboardCmd::None;
            }
            DashboardCmd::Batch(vec![DashboardCmd::FetchSummary, DashboardCmd::FetchPreview])
        }

        DashboardMsg::Key(key) => {
            let context = InputContext {
                view: model.app.view,
                overlay: model.overlay,
            };
            match resolve_key_event(&key, context).action {
                Some(action) => update(model, action.into_msg()),
                None => DashboardCmd::None,
            }
        }

        DashboardMsg::Resize { cols, rows } => {
            model.terminal_size = (cols, rows);
            DashboardCmd::None
        }

        DashboardMsg::SwitchView(view) => switch_view(model, view),
        DashboardMsg::NextView => switch_view(model, model.app.view.next()),
        DashboardMsg::PrevView => switch_view(model, model.app.view.prev()),

        DashboardMsg::RefreshHistory => {
            if model.app.view == View::Alerts && model.connected {
                DashboardCmd::FetchHistory
            } else {
                DashboardCmd::None
            }
        }

        DashboardMsg::SettingsCursorUp => {
            model.settings_selected = model.settings_selected.saturating_sub(1);
            DashboardCmd::None
        }

        DashboardMsg::SettingsCursorDown => {
            if model.settings_selected + 1 < model.presets.len() {
                model.settings_selected += 1;
            }
            DashboardCmd::None
        }

        DashboardMsg::ApplySelectedRate => match model.selected_preset() {
            Some(period) => set_refresh_rate(model, period),
            None => DashboardCmd::None,
        },

        DashboardMsg::SetRefreshRate(period) => set_refresh_rate(model, period),

        DashboardMsg::RequestClearHistory => {
            if model.connected {
                model.overlay = Some(Overlay::ConfirmClear);
            }
            DashboardCmd::None
        }

        DashboardMsg::ConfirmClear => {
            if model.overlay != Some(Overlay::ConfirmClear) {
                return DashboardCmd::None;
            }
            model.overlay = None;
            if model.connected {
                DashboardCmd::ClearHistory
            } else {
                DashboardCmd::None
            }
        }

        DashboardMsg::CancelClear => {
            if model.overlay == Some(Overlay::ConfirmClear) {
                model.overlay = None;
            }
            DashboardCmd::None
        }

        DashboardMsg::ToggleHelp => {
            model.overlay = match model.overlay {
                Some(Overlay::Help) => None,
                _ => Some(Overlay::Help),
            };
            DashboardCmd::None
        }

        DashboardMsg::CloseOverlay => {
            model.overlay = None;
            DashboardCmd::None
        }

        DashboardMsg::DismissNotices => {
            model.display.dismiss_notices();
            DashboardCmd::None
        }

        DashboardMsg::SummaryLoaded(stats) => {
            model.display.render_summary(&stats);
            DashboardCmd::None
        }

        DashboardMsg::PreviewLoaded(records) => {
            model.display.render_rows(AlertTable::Preview, &records);
            DashboardCmd::None
        }

        DashboardMsg::HistoryLoaded(records) => {
            model.display.render_rows(AlertTable::History, &records);
            DashboardCmd::None
        }

        DashboardMsg::QueryFailed { op, code } => {
            // Render skipped; the next tick retries.
            model.query_errors += 1;
            model.last_query_error = Some((op, code));
            DashboardCmd::None
        }

        DashboardMsg::ClearCompleted(_) => {
            model.display.reset_display();
            model
                .display
                .show_notice(NoticeLevel::Info, CLEAR_SUCCESS_NOTICE.to_string());
            DashboardCmd::None
        }

        DashboardMsg::ClearFailed(message) => {
            model.display.show_notice(
                NoticeLevel::Error,
                format!("Failed to clear history: {message}"),
            );
            DashboardCmd::None
        }

        DashboardMsg::MissedTicks(count) => {
            model.missed_ticks = model.missed_ticks.saturating_add(count);
            DashboardCmd::None
        }

        DashboardMsg::Quit => {
            model.quit = true;
            DashboardCmd::Quit
        }
    }
}

/// Show `view` and, for the alerts view, load its history once.
fn switch_view(model: &mut DashboardModel, view: View) -> DashboardCmd {
    model.app.view = view;
    model.display.render_navigation(view);
    if view == View::Alerts && model.connected {
        DashboardCmd::FetchHistory
    } else {
        DashboardCmd::None
    }
}

fn set_refresh_rate(model: &mut DashboardModel, period: Duration) -> DashboardCmd {
    if period.is_zero() {
        model.display.show_notice(
            NoticeLevel::Warning,
            "Refresh interval must be greater than zero.".to_string(),
        );
        return DashboardCmd::None;
    }
    model.app.poll_interval = period;
    model.sync_settings_cursor();
    DashboardCmd::RestartPoller(period)
}

// ──────────────────── tests ────────────────────
