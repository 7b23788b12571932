//! dbtop - live terminal dashboard for one database instance.
//!
//! Polls a PostgreSQL, MySQL/MariaDB or Oracle server on a fixed interval
//! and renders sessions, server counters and the largest tables:
//! - `adapter` - engine adapters, the session seam and the registry
//! - `scheduler` - background poll loop
//! - `tui` - event intake, view state and rendering

pub mod adapter;
pub mod config;
pub mod fmt;
pub mod model;
pub mod scheduler;
pub mod tui;
pub mod util;
