//! Attendance tracker CLI library.
//!
//! This crate provides the CLI interface for conference attendance tracking.

mod cli;
pub mod commands;
mod config;

pub use cli::{ActionArg, Cli, Commands, ZonesAction};
pub use config::{Config, load_schedule};
