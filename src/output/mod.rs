//! Output module for reporting on the frontier
//!
//! This module handles reading statistics back out of the durable store and
//! printing them for the `--stats` command.

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
