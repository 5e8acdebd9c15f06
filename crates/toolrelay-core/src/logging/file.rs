//! File-based logger
//!
//! Useful when stderr is shared with a tool server's own output and the
//! interesting lines get lost.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// Logger that appends timestamped lines to a file
pub struct FileLogger {
    path: PathBuf,
    file: Mutex<File>,
    min_level: LogLevel,
}

impl FileLogger {
    /// Open (or create) the log file in append mode
    pub fn open(path: impl AsRef<Path>, min_level: LogLevel) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            min_level,
        })
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| {
                let secs = d.as_secs();
                let millis = d.subsec_millis();
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let secs = secs % 60;
                format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
            })
            .unwrap_or_else(|_| "??:??:??.???".to_string())
    }

    fn write(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }
        let mut file = self.file.lock();
        // A failing log write must never take the chat down with it.
        let _ = writeln!(file, "[{}] [{:5}] {}", Self::timestamp(), level.to_string(), message);
        let _ = file.flush();
    }
}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger")
            .field("path", &self.path)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl Logger for FileLogger {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}
