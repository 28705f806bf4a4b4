#![forbid(unsafe_code)]

//! Vesper Portal: terminal dashboard and operator CLI over the
//! `high_risk_flows` alert table written by the Vesper flow-scoring pipeline.
//!
//! The crate reads the alert store on a fixed cadence and renders:
//! 1. **Dashboard**: summary cards, store status and the newest alerts
//! 2. **Alert history**: the last 50 alerts with full endpoint detail
//! 3. **Settings**: refresh-rate selector and bulk history clear
//!
//! # Library usage
//!
//! ```rust,no_run
//! use vesper_portal::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use vesper_portal::core::config::Config;
//! use vesper_portal::store::{AlertStore, FeedLimit};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod store;
#[cfg(feature = "tui")]
pub mod tui;
