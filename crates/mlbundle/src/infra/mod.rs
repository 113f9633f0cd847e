//! Infrastructure adapters for filesystem output, configuration, and logging.

pub mod config;
pub mod fs;
pub mod logging;
