//! Utility modules for dbtop.

mod duration;

pub use duration::{DurationParseError, parse_duration};
