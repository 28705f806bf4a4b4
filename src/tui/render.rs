//! Terminal painter: draws a [`DashboardModel`] with crossterm commands.
//!
//! Rendering is generic over [`Write`] so frames can be captured in tests. The
//! layout is a fixed grid: header, sidebar, view body, notices, footer, with
//! overlays drawn last on top.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use super::display::StatusIndicator;
use super::format::ScoreTone;
use super::input::help_bindings;
use super::model::{CLEAR_CONFIRM_PROMPT, DashboardModel, NoticeLevel, Overlay, View};

const SIDEBAR_WIDTH: u16 = 16;
const BODY_X: u16 = SIDEBAR_WIDTH + 2;
const TIME_WIDTH: usize = 19;
const ROUTE_WIDTH: usize = 24;
const ENDPOINT_WIDTH: usize = 21;
const PROTO_WIDTH: usize = 5;

// ──────────────────── color mapping ────────────────────

fn tone_color(tone: ScoreTone) -> Color {
    match tone {
        ScoreTone::Danger => Color::Red,
        ScoreTone::Warning => Color::Yellow,
    }
}

fn status_color(status: StatusIndicator) -> Color {
    match status {
        StatusIndicator::Normal => Color::Green,
        StatusIndicator::Pending => Color::DarkGrey,
        StatusIndicator::Disconnected => Color::Red,
    }
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

/// Truncate to at most `max` characters.
fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ──────────────────── frame ────────────────────

/// Clipping writer over one terminal frame.
struct Frame<'a, W: Write> {
    out: &'a mut W,
    cols: u16,
    rows: u16,
}

impl<W: Write> Frame<'_, W> {
    /// Write `text` at (`x`, `row`), clipped to the frame. Rows past the
    /// footer line are dropped.
    fn text(&mut self, x: u16, row: u16, color: Color, bold: bool, text: &str) -> io::Result<()> {
        if row >= self.rows || x >= self.cols {
            return Ok(());
        }
        let room = usize::from(self.cols - x);
        queue!(self.out, MoveTo(x, row), SetForegroundColor(color))?;
        if bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        write!(self.out, "{}", clip(text, room))?;
        queue!(self.out, SetAttribute(Attribute::Reset))
    }

    /// Last row usable by view bodies (above notices and footer).
    fn body_limit(&self, notices: usize) -> u16 {
        let reserved = u16::try_from(notices).unwrap_or(u16::MAX).saturating_add(2);
        self.rows.saturating_sub(reserved)
    }
}

/// Paint one full frame of the dashboard and flush it.
pub fn render_frame<W: Write>(out: &mut W, model: &DashboardModel) -> io::Result<()> {
    let (cols, rows) = model.terminal_size;
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

    let mut frame = Frame { out, cols, rows };
    render_header(&mut frame, model)?;
    render_sidebar(&mut frame, model)?;

    let limit = frame.body_limit(model.display.notices.len());
    match model.display.visible {
        View::Dashboard => render_dashboard_body(&mut frame, model, limit)?,
        View::Alerts => render_alerts_body(&mut frame, model, limit)?,
        View::Models => render_models_body(&mut frame)?,
        View::Settings => render_settings_body(&mut frame, model)?,
    }

    render_notices(&mut frame, model)?;
    render_footer(&mut frame, model)?;

    match model.overlay {
        Some(Overlay::Help) => render_help_overlay(&mut frame, model)?,
        Some(Overlay::ConfirmClear) => render_confirm_overlay(&mut frame)?,
        None => {}
    }

    frame.out.flush()
}

fn render_header<W: Write>(frame: &mut Frame<'_, W>, model: &DashboardModel) -> io::Result<()> {
    let width = usize::from(frame.cols);
    let mode = if model.connected { "LIVE" } else { "OFFLINE" };
    let header = format!(" Vesper Portal v{}  [{mode}] ", env!("CARGO_PKG_VERSION"));
    let right = format!(" {} ", model.display.title);
    let pad = width.saturating_sub(header.chars().count() + right.chars().count() + 4);
    let line = format!("┌─{header}{:─<pad$}{right}─┐", "", pad = pad);
    frame.text(0, 0, Color::Cyan, true, &line)
}

fn render_sidebar<W: Write>(frame: &mut Frame<'_, W>, model: &DashboardModel) -> io::Result<()> {
    let mut row = 2;
    for view in View::ALL {
        let active = model.display.sidebar_active == view;
        let marker = if active { '▶' } else { ' ' };
        let label = format!("{marker} {} {}", view.number(), view.title());
        let color = if active { Color::Cyan } else { Color::White };
        frame.text(1, row, color, active, &label)?;
        row += 1;
    }
    Ok(())
}

fn render_section<W: Write>(frame: &mut Frame<'_, W>, row: u16, title: &str) -> io::Result<()> {
    frame.text(BODY_X, row, Color::White, true, title)
}

fn render_dashboard_body<W: Write>(
    frame: &mut Frame<'_, W>,
    model: &DashboardModel,
    limit: u16,
) -> io::Result<()> {
    let summary = &model.display.summary;
    let status = model.display.status;
    let mut row = 2;

    render_section(frame, row, "Summary")?;
    row += 1;
    frame.text(BODY_X, row, Color::DarkGrey, false, "Total Flows")?;
    frame.text(BODY_X + 14, row, Color::White, true, &summary.total)?;
    row += 1;
    frame.text(BODY_X, row, Color::DarkGrey, false, "Alerts")?;
    frame.text(BODY_X + 14, row, Color::White, true, &summary.alerts)?;
    row += 1;
    frame.text(BODY_X, row, Color::DarkGrey, false, "Max Score")?;
    frame.text(BODY_X + 14, row, Color::White, true, &summary.max_score)?;
    row += 1;
    frame.text(BODY_X, row, Color::DarkGrey, false, "Status")?;
    frame.text(
        BODY_X + 14,
        row,
        status_color(status),
        false,
        &format!("● {}", status.label()),
    )?;
    row += 2;

    render_section(frame, row, "Latest Alerts")?;
    row += 1;
    let header = format!(
        "{:<TIME_WIDTH$}  {:<ROUTE_WIDTH$}  {:<6}  Status",
        "Time", "Route", "Score"
    );
    frame.text(BODY_X, row, Color::DarkGrey, false, &header)?;
    row += 1;

    if model.display.preview.is_empty() {
        let msg = if model.connected {
            "No alerts yet."
        } else {
            "Alert store unavailable."
        };
        return frame.text(BODY_X, row, Color::DarkGrey, false, msg);
    }

    let score_x = BODY_X + (TIME_WIDTH + ROUTE_WIDTH + 4) as u16;
    for alert in &model.display.preview {
        if row >= limit {
            break;
        }
        let lead = format!("{:<TIME_WIDTH$}  {:<ROUTE_WIDTH$}", alert.time, alert.route);
        frame.text(BODY_X, row, Color::White, false, &lead)?;
        frame.text(score_x, row, tone_color(alert.tone), true, &alert.score)?;
        frame.text(score_x + 8, row, Color::Red, false, alert.badge)?;
        row += 1;
    }
    Ok(())
}

fn render_alerts_body<W: Write>(
    frame: &mut Frame<'_, W>,
    model: &DashboardModel,
    limit: u16,
) -> io::Result<()> {
    let mut row = 2;
    render_section(frame, row, "Alert History")?;
    row += 1;
    let header = format!(
        "{:<TIME_WIDTH$}  {:<ENDPOINT_WIDTH$}  {:<ENDPOINT_WIDTH$}  {:<PROTO_WIDTH$}  {:<6}  Status",
        "Time", "Source", "Destination", "Proto", "Score"
    );
    frame.text(BODY_X, row, Color::DarkGrey, false, &header)?;
    row += 1;

    if model.display.history.is_empty() {
        let msg = if model.connected {
            "No alerts recorded."
        } else {
            "Alert store unavailable."
        };
        return frame.text(BODY_X, row, Color::DarkGrey, false, msg);
    }

    let score_x = BODY_X + (TIME_WIDTH + 2 * ENDPOINT_WIDTH + PROTO_WIDTH + 8) as u16;
    for alert in &model.display.history {
        if row >= limit {
            break;
        }
        let lead = format!(
            "{:<TIME_WIDTH$}  {:<ENDPOINT_WIDTH$}  {:<ENDPOINT_WIDTH$}  {:<PROTO_WIDTH$}",
            alert.time, alert.source, alert.destination, alert.proto
        );
        frame.text(BODY_X, row, Color::White, false, &lead)?;
        frame.text(score_x, row, tone_color(alert.tone), true, &alert.score)?;
        frame.text(score_x + 8, row, Color::Red, false, alert.badge)?;
        row += 1;
    }
    Ok(())
}

fn render_models_body<W: Write>(frame: &mut Frame<'_, W>) -> io::Result<()> {
    render_section(frame, 2, "Models")?;
    frame.text(
        BODY_X,
        3,
        Color::DarkGrey,
        false,
        "Scoring model details are not published to the alert store.",
    )
}

fn render_settings_body<W: Write>(
    frame: &mut Frame<'_, W>,
    model: &DashboardModel,
) -> io::Result<()> {
    let mut row = 2;
    render_section(frame, row, "Refresh Rate")?;
    row += 1;
    for (idx, preset) in model.presets.iter().enumerate() {
        let cursor = if idx == model.settings_selected { '>' } else { ' ' };
        let active = *preset == model.app.poll_interval;
        let radio = if active { "(•)" } else { "( )" };
        let label = format!("{cursor} {radio} {} ms", preset.as_millis());
        let color = if active { Color::Cyan } else { Color::White };
        frame.text(BODY_X, row, color, idx == model.settings_selected, &label)?;
        row += 1;
    }
    row += 1;

    render_section(frame, row, "History")?;
    row += 1;
    let (color, label) = if model.connected {
        (Color::Red, "c  Clear all alert history")
    } else {
        (Color::DarkGrey, "c  Clear all alert history (store unavailable)")
    };
    frame.text(BODY_X, row, color, false, label)
}

fn render_notices<W: Write>(frame: &mut Frame<'_, W>, model: &DashboardModel) -> io::Result<()> {
    let notices = &model.display.notices;
    let count = u16::try_from(notices.len()).unwrap_or(u16::MAX);
    let mut row = frame.rows.saturating_sub(count.saturating_add(1));
    for notice in notices {
        frame.text(1, row, notice_color(notice.level), false, &notice.message)?;
        row += 1;
    }
    Ok(())
}

fn footer_hint(model: &DashboardModel) -> &'static str {
    if model.overlay == Some(Overlay::ConfirmClear) {
        return " y confirm  n cancel ";
    }
    match model.app.view {
        View::Alerts => " 1-4 view  r reload  ? help  q quit ",
        View::Settings => " 1-4 view  ↑↓ choose  Enter apply  c clear  ? help  q quit ",
        View::Dashboard | View::Models => " 1-4 view  Tab next  ? help  q quit ",
    }
}

fn render_footer<W: Write>(frame: &mut Frame<'_, W>, model: &DashboardModel) -> io::Result<()> {
    let width = usize::from(frame.cols);
    let hint = footer_hint(model);
    let last_error = model
        .last_query_error
        .map(|(op, code)| format!(" ({op} {code})"))
        .unwrap_or_default();
    let stats = format!(
        " every {} ms  tick {}  missed {}  errors {}{last_error}  log {} ",
        model.app.poll_interval.as_millis(),
        model.tick,
        model.missed_ticks,
        model.query_errors,
        model.log_state
    );
    let pad = width.saturating_sub(hint.chars().count() + stats.chars().count() + 4);
    let line = format!("└─{hint}{:─<pad$}{stats}─┘", "", pad = pad);
    let row = frame.rows.saturating_sub(1);
    frame.text(0, row, Color::Cyan, false, &line)
}

fn render_help_overlay<W: Write>(
    frame: &mut Frame<'_, W>,
    model: &DashboardModel,
) -> io::Result<()> {
    let x = BODY_X + 2;
    let mut row = 3;
    frame.text(x, row, Color::Cyan, true, "┌ Keys ─────────────────────────────┐")?;
    row += 1;
    for binding in help_bindings(model.app.view) {
        let line = format!("│ {:<12} {:<21}│", binding.keys, binding.description);
        frame.text(x, row, Color::White, false, &line)?;
        row += 1;
    }
    frame.text(x, row, Color::Cyan, true, "└───────────────────────────────────┘")
}

fn render_confirm_overlay<W: Write>(frame: &mut Frame<'_, W>) -> io::Result<()> {
    let x = BODY_X + 2;
    let row = 6;
    frame.text(x, row, Color::Red, true, "┌ Clear History ┐")?;
    frame.text(x, row + 1, Color::White, true, CLEAR_CONFIRM_PROMPT)?;
    frame.text(x, row + 2, Color::White, false, "[y] Yes    [n] No")
}

// ──────────────────── tests ────────────────────
