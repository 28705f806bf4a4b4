//! Data access for the `high_risk_flows` alert table.
//!
//! [`AlertStore`] is the narrow seam the dashboard runtime talks to; the SQLite
//! implementation lives in [`sqlite`]. Records are written by the external
//! flow-scoring pipeline. This crate only reads them, or deletes all of them.

#![allow(missing_docs)]

#[cfg(feature = "sqlite")]
pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// One row of `high_risk_flows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub proto: String,
    pub score: f64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

/// Aggregates shown in the dashboard summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: u64,
    /// `None` when the table is empty.
    pub max_score: Option<f64>,
}

/// Fixed row limits for the two alert listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedLimit {
    /// Dashboard preview table.
    Preview,
    /// Full-history table on the alerts view.
    History,
}

impl FeedLimit {
    /// Maximum number of rows the listing returns.
    #[must_use]
    pub const fn rows(self) -> usize {
        match self {
            Self::Preview => 10,
            Self::History => 50,
        }
    }
}

/// Result of a successful bulk clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
    /// Rows removed from `high_risk_flows`.
    pub deleted: usize,
    /// Whether the AUTOINCREMENT sequence entry was reset.
    pub sequence_reset: bool,
}

/// Operations the dashboard issues against the alert store.
pub trait AlertStore {
    /// Number of rows in the table.
    fn count_all(&self) -> Result<u64>;

    /// Highest `score`, or `None` for an empty table.
    fn max_score(&self) -> Result<Option<f64>>;

    /// Newest records first, at most `limit.rows()` of them.
    fn list_latest(&self, limit: FeedLimit) -> Result<Vec<AlertRecord>>;

    /// Delete every record and reset the id sequence, atomically.
    fn clear_all(&mut self) -> Result<ClearOutcome>;

    /// Count and max score together, for one summary render.
    fn summary(&self) -> Result<SummaryStats> {
        Ok(SummaryStats {
            total: self.count_all()?,
            max_score: self.max_score()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::VesperError;

    struct FailingMax;

    impl AlertStore for FailingMax {
        fn count_all(&self) -> Result<u64> {
            Ok(3)
        }
        fn max_score(&self) -> Result<Option<f64>> {
            Err(VesperError::query("max_score", "disk I/O error"))
        }
        fn list_latest(&self, _limit: FeedLimit) -> Result<Vec<AlertRecord>> {
            Ok(Vec::new())
        }
        fn clear_all(&mut self) -> Result<ClearOutcome> {
            Ok(ClearOutcome {
                deleted: 0,
                sequence_reset: false,
            })
        }
    }

    #[test]
    fn feed_limits_match_listing_sizes() {
        assert_eq!(FeedLimit::Preview.rows(), 10);
        assert_eq!(FeedLimit::History.rows(), 50);
    }

    #[test]
    fn summary_fails_when_either_aggregate_fails() {
        let err = FailingMax.summary().expect_err("max_score failure must surface");
        assert_eq!(err.code(), "VSP-2002");
    }

    #[test]
    fn alert_record_serializes_with_column_names() {
        let record = AlertRecord {
            id: 1,
            src_ip: "10.0.0.1".into(),
            dst_ip: "10.0.0.2".into(),
            src_port: 1234,
            dst_port: 443,
            proto: "TCP".into(),
            score: 0.95,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["src_port"], 1234);
        assert_eq!(json["proto"], "TCP");
        assert_eq!(json["timestamp"], 1_700_000_000_i64);
    }
}
