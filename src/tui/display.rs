//! In-memory display tree and the narrow [`Renderer`] interface over it.
//!
//! All display mutation goes through [`Renderer`]; the terminal painter in
//! [`super::render`] only reads the resulting [`DisplayRegions`].

#![allow(missing_docs)]

use crate::store::{AlertRecord, SummaryStats};

use super::format::{CompactRow, DetailedRow, format_score};
use super::model::{Notice, NoticeLevel, View};

/// Maximum visible notices; the oldest is evicted first.
pub const MAX_NOTICES: usize = 3;

/// The two alert tables on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertTable {
    /// Latest alerts on the dashboard view.
    Preview,
    /// Full history on the alerts view.
    History,
}

/// Colored connection dot next to the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusIndicator {
    /// No summary has been rendered yet.
    #[default]
    Pending,
    Normal,
    Disconnected,
}

impl StatusIndicator {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "waiting",
            Self::Normal => "normal",
            Self::Disconnected => "offline",
        }
    }
}

/// Text of the three summary cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCards {
    pub total: String,
    pub alerts: String,
    pub max_score: String,
}

impl Default for SummaryCards {
    fn default() -> Self {
        Self {
            total: "0".to_string(),
            alerts: "0".to_string(),
            max_score: format_score(None),
        }
    }
}

/// Display operations driven by the controllers.
pub trait Renderer {
    /// Update the summary cards and mark the status indicator normal.
    fn render_summary(&mut self, stats: &SummaryStats);

    /// Replace the contents of one alert table.
    fn render_rows(&mut self, table: AlertTable, records: &[AlertRecord]);

    /// Zero the summary cards and empty both tables.
    fn reset_display(&mut self);

    /// Show `view`: title, visible region, sidebar marker.
    fn render_navigation(&mut self, view: View);

    fn render_status(&mut self, status: StatusIndicator);

    /// Surface a user-visible message.
    fn show_notice(&mut self, level: NoticeLevel, message: String);
}

/// Everything the painter draws, as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRegions {
    pub title: String,
    /// The one view region currently shown.
    pub visible: View,
    pub sidebar_active: View,
    pub summary: SummaryCards,
    pub status: StatusIndicator,
    pub preview: Vec<CompactRow>,
    pub history: Vec<DetailedRow>,
    /// Oldest first, at most [`MAX_NOTICES`].
    pub notices: Vec<Notice>,
    next_notice_id: u64,
}

impl Default for DisplayRegions {
    fn default() -> Self {
        let view = View::default();
        Self {
            title: view.title().to_string(),
            visible: view,
            sidebar_active: view,
            summary: SummaryCards::default(),
            status: StatusIndicator::default(),
            preview: Vec::new(),
            history: Vec::new(),
            notices: Vec::new(),
            next_notice_id: 0,
        }
    }
}

impl DisplayRegions {
    #[must_use]
    pub fn is_visible(&self, view: View) -> bool {
        self.visible == view
    }

    pub fn dismiss_notices(&mut self) {
        self.notices.clear();
    }

    #[must_use]
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl Renderer for DisplayRegions {
    fn render_summary(&mut self, stats: &SummaryStats) {
        let total = stats.total.to_string();
        self.summary = SummaryCards {
            alerts: total.clone(),
            total,
            max_score: format_score(stats.max_score),
        };
        self.status = StatusIndicator::Normal;
    }

    fn render_rows(&mut self, table: AlertTable, records: &[AlertRecord]) {
        match table {
            AlertTable::Preview => {
                self.preview = records.iter().map(CompactRow::from_record).collect();
            }
            AlertTable::History => {
                self.history = records.iter().map(DetailedRow::from_record).collect();
            }
        }
    }

    fn reset_display(&mut self) {
        self.summary = SummaryCards::default();
        self.preview.clear();
        self.history.clear();
    }

    fn render_navigation(&mut self, view: View) {
        self.title = view.title().to_string();
        self.visible = view;
        self.sidebar_active = view;
    }

    fn render_status(&mut self, status: StatusIndicator) {
        self.status = status;
    }

    fn show_notice(&mut self, level: NoticeLevel, message: String) {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        self.notices.push(Notice { id, level, message });
        while self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::format::ScoreTone;

    fn record(id: i64, score: f64, timestamp: i64) -> AlertRecord {
        AlertRecord {
            id,
            src_ip: "10.0.0.1".into(),
            dst_ip: "10.0.0.2".into(),
            src_port: 1234,
            dst_port: 443,
            proto: "TCP".into(),
            score,
            timestamp,
        }
    }

    #[test]
    fn summary_fills_cards_and_sets_status_normal() {
        let mut display = DisplayRegions::default();
        assert_eq!(display.status, StatusIndicator::Pending);

        display.render_summary(&SummaryStats {
            total: 12,
            max_score: Some(0.9731),
        });

        assert_eq!(display.summary.total, "12");
        assert_eq!(display.summary.alerts, "12");
        assert_eq!(display.summary.max_score, "0.9731");
        assert_eq!(display.status, StatusIndicator::Normal);
    }

    #[test]
    fn empty_table_summary_shows_zero_score() {
        let mut display = DisplayRegions::default();
        display.render_summary(&SummaryStats::default());
        assert_eq!(display.summary.max_score, "0.0000");
        assert_eq!(display.summary.total, "0");
    }

    #[test]
    fn rows_go_to_the_named_table_only() {
        let mut display = DisplayRegions::default();
        display.render_rows(AlertTable::Preview, &[record(1, 0.95, 10), record(2, 0.5, 5)]);
        assert_eq!(display.preview.len(), 2);
        assert!(display.history.is_empty());
        assert_eq!(display.preview[0].tone, ScoreTone::Danger);
        assert_eq!(display.preview[1].tone, ScoreTone::Warning);

        display.render_rows(AlertTable::History, &[record(1, 0.95, 10)]);
        assert_eq!(display.history.len(), 1);
        assert_eq!(display.history[0].source, "10.0.0.1:1234");
    }

    #[test]
    fn rendering_empty_rows_clears_table() {
        let mut display = DisplayRegions::default();
        display.render_rows(AlertTable::Preview, &[record(1, 0.95, 10)]);
        display.render_rows(AlertTable::Preview, &[]);
        assert!(display.preview.is_empty());
    }

    #[test]
    fn reset_zeroes_summary_and_tables() {
        let mut display = DisplayRegions::default();
        display.render_summary(&SummaryStats {
            total: 3,
            max_score: Some(0.99),
        });
        display.render_rows(AlertTable::Preview, &[record(1, 0.95, 10)]);
        display.render_rows(AlertTable::History, &[record(1, 0.95, 10)]);

        display.reset_display();

        assert_eq!(display.summary, SummaryCards::default());
        assert_eq!(display.summary.max_score, "0.0000");
        assert!(display.preview.is_empty());
        assert!(display.history.is_empty());
    }

    #[test]
    fn navigation_updates_title_region_and_sidebar() {
        let mut display = DisplayRegions::default();
        display.render_navigation(View::Settings);
        assert_eq!(display.title, "Settings");
        assert!(display.is_visible(View::Settings));
        assert!(!display.is_visible(View::Dashboard));
        assert_eq!(display.sidebar_active, View::Settings);
    }

    #[test]
    fn notices_are_capped_oldest_first() {
        let mut display = DisplayRegions::default();
        for i in 0..5 {
            display.show_notice(NoticeLevel::Info, format!("notice {i}"));
        }
        assert_eq!(display.notices.len(), MAX_NOTICES);
        assert_eq!(display.notices[0].message, "notice 2");
        assert_eq!(display.latest_notice().unwrap().message, "notice 4");

        display.dismiss_notices();
        assert!(display.notices.is_empty());
    }
}
