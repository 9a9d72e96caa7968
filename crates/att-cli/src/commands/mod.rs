//! CLI subcommand implementations.

pub mod export;
pub mod import;
pub mod register;
pub mod report;
pub mod scan;
pub mod status;
pub mod util;
pub mod zones;
