//! Logging bootstrap for the textconv binary.

mod logging;

pub use logging::init_logging;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Directory for rolling log files.
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "textconv", "textconv")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}
