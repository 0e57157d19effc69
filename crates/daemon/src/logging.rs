//! Structured logging setup: a rotating, gzip-compressing file appender
//! paired with an optional stdout layer, installed once at daemon startup.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rex_core::{LogFormat, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::DaemonError;

/// Current log rotates once it exceeds this many bytes.
pub const MAX_LOG_BYTES: u64 = 50 * 1024 * 1024;
/// Rotated files are kept as `<log>.1.gz` .. `<log>.{MAX_ROTATED}.gz`.
pub const MAX_ROTATED: usize = 5;

/// Installs the global tracing subscriber. Returns the guard that must be
/// held for the lifetime of the process: dropping it stops the
/// non-blocking writer's background flush thread.
pub fn setup_logging(config: &LoggingConfig, log_path: &Path, foreground: bool) -> Result<WorkerGuard, DaemonError> {
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let writer =
        RotatingWriter::open(log_path.to_path_buf()).map_err(|e| DaemonError::LogOpen(log_path.to_path_buf(), e))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let default_level = if config.debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);
    let registry = tracing_subscriber::registry().with(env_filter);

    match (config.format, foreground) {
        (LogFormat::Json, true) => {
            registry
                .with(file_layer.json())
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .init();
        }
        (LogFormat::Json, false) => {
            registry.with(file_layer.json()).init();
        }
        (LogFormat::Pretty, true) => {
            registry
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .init();
        }
        (LogFormat::Pretty, false) => {
            registry.with(file_layer).init();
        }
    }

    Ok(guard)
}

/// A `Write` implementation that rotates the underlying file once it
/// crosses [`MAX_LOG_BYTES`], shifting and gzip-compressing prior
/// generations rather than truncating in place.
struct RotatingWriter {
    path: PathBuf,
    file: std::fs::File,
    written: u64,
}

impl RotatingWriter {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self { path, file, written })
    }

    fn rotate(&mut self) -> io::Result<()> {
        rotate_log_files(&self.path)?;
        self.file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written >= MAX_LOG_BYTES {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Shifts `<log>.1.gz..{N-1}.gz` up one index, deletes the oldest beyond
/// [`MAX_ROTATED`], then gzip-compresses the current log into `.1.gz`.
fn rotate_log_files(path: &Path) -> io::Result<()> {
    let oldest = rotated_path(path, MAX_ROTATED);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for idx in (1..MAX_ROTATED).rev() {
        let from = rotated_path(path, idx);
        let to = rotated_path(path, idx + 1);
        if from.exists() {
            std::fs::rename(&from, &to)?;
        }
    }
    if path.exists() {
        gzip_file(path, &rotated_path(path, 1))?;
        std::fs::remove_file(path)?;
    }
    Ok(())
}

fn rotated_path(path: &Path, idx: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{idx}.gz"));
    PathBuf::from(name)
}

fn gzip_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = std::fs::File::open(src)?;
    let output = std::fs::File::create(dst)?;
    let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
