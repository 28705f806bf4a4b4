//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use vesper_portal::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, VesperError};

// Store
pub use crate::store::{AlertRecord, AlertStore, ClearOutcome, FeedLimit, SummaryStats};
#[cfg(feature = "sqlite")]
pub use crate::store::sqlite::SqliteAlertStore;

// Logging
pub use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

// Dashboard
#[cfg(feature = "tui")]
pub use crate::tui::model::{AppState, DashboardModel, View};
#[cfg(feature = "tui")]
pub use crate::tui::poller::Poller;
#[cfg(all(feature = "tui", feature = "sqlite"))]
pub use crate::tui::{DashboardRuntimeConfig, run_dashboard};
