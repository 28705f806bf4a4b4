//! Terminal dashboard over the alert store.
//!
//! Elm-style split: [`model`] holds state, [`update`] is the pure state
//! machine, [`runtime`] executes its commands and owns the event loop, and
//! [`render`] paints the [`display`] tree with crossterm.

#![allow(missing_docs)]

pub mod display;
pub mod format;
pub mod input;
pub mod model;
pub mod poller;
pub mod render;
pub mod runtime;
pub mod signals;
pub mod terminal_guard;
pub mod update;

#[cfg(feature = "sqlite")]
pub use runtime::{DashboardRuntimeConfig, run_dashboard};
