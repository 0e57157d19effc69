//! The on-disk layout under a daemon data directory.

use std::path::{Path, PathBuf};

/// Resolved paths for one data directory: `config.yaml`, `rules/`,
/// `state/history.db`, `logs/daemon.log`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub data_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.yaml")
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.data_dir.join("rules")
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_dir.join("state").join("history.db")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir().join("daemon.log")
    }
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
