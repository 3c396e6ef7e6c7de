//! Thread-safe run log writing to stdout and a timestamped log file.
//!
//! Worker tasks log concurrently, so every write goes through one lock to
//! keep lines from interleaving mid-line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;

const LOG_WIDTH: usize = 80;
const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

struct LogSink {
    console: bool,
    writer: Option<BufWriter<File>>,
}

/// Shared log for one pipeline run.
pub struct RunLog {
    sink: Mutex<LogSink>,
    width: usize,
}

impl RunLog {
    /// Create a log writing to stdout and a timestamped file under
    /// `log_dir`, defaulting to `~/logs/media-mover`.
    ///
    /// # Errors
    /// Returns an error if the log directory or file cannot be created.
    pub fn new(log_dir: Option<&Path>) -> Result<Self> {
        let dir = match log_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .context("Failed to get home directory")?
                .join("logs")
                .join(PROJECT_NAME),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create log directory")?;
        }

        let log_path = dir.join(format!("{PROJECT_NAME}_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        Ok(Self {
            sink: Mutex::new(LogSink {
                console: true,
                writer: Some(BufWriter::new(file)),
            }),
            width: LOG_WIDTH,
        })
    }

    /// Log to stdout only. Used by dry runs.
    #[must_use]
    pub fn console_only() -> Self {
        Self {
            sink: Mutex::new(LogSink {
                console: true,
                writer: None,
            }),
            width: LOG_WIDTH,
        }
    }

    /// Discard everything. Used in tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            sink: Mutex::new(LogSink {
                console: false,
                writer: None,
            }),
            width: LOG_WIDTH,
        }
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn write_line(sink: &mut LogSink, line: &str) {
        if sink.console {
            println!("{line}");
        }
        if let Some(writer) = sink.writer.as_mut() {
            let _ = writeln!(writer, "{line}");
        }
    }

    /// Log a message, one timestamped line per input line, truncated to the
    /// log width.
    pub fn message(&self, text: &str) {
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        for line in text.split('\n') {
            let line = if line.len() > self.width {
                let cut: String = line.chars().take(self.width.saturating_sub(3)).collect();
                format!("{cut}...")
            } else {
                line.to_string()
            };
            Self::write_line(&mut sink, &format!("[{}] {line}", Self::timestamp()));
        }
        if let Some(writer) = sink.writer.as_mut() {
            let _ = writer.flush();
        }
    }

    /// Log a section header: uppercased title centered in a divider block.
    pub fn header(&self, title: &str) {
        let header_text = title.to_uppercase().replace('_', " ");
        let centered = format!("{header_text:-^width$}", width = self.width);
        self.message(&"=".repeat(self.width));
        self.message(&centered);
        self.message(&"=".repeat(self.width));
    }

    pub fn divider(&self) {
        self.message(&"=".repeat(self.width));
    }
}
