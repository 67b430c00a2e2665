//! Append-only CSV file sink

use super::{LogRow, LogSink, HEADER};
use crate::error::LogError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Buffers rows in memory and appends them to the file on flush
#[derive(Debug)]
pub struct CsvFileLog {
    path: PathBuf,
    buffer: String,
}

impl CsvFileLog {
    /// Open a log at `path`, writing the header if the file does not exist yet
    pub fn create(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&path)?;
            writeln!(file, "{HEADER}")?;
            tracing::info!(path = %path.display(), "created experiment log");
        }
        Ok(Self {
            path,
            buffer: String::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for CsvFileLog {
    fn append(&mut self, row: LogRow) {
        self.buffer.push_str(&row.to_line());
        self.buffer.push('\n');
    }

    fn flush(&mut self) -> Result<(), LogError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        file.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }
}

impl Drop for CsvFileLog {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(path = %self.path.display(), %err, "failed to flush experiment log on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::EndRow;
    use crate::types::{Answer, Condition};

    fn end_row() -> LogRow {
        LogRow::End(EndRow {
            participant_id: "P02".into(),
            condition: Condition::Coexistence,
            response_time: 3.0,
            answer: Answer::Agree,
        })
    }

    #[test]
    fn header_written_once_and_rows_appended_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("ExperimentData.csv");

        let mut log = CsvFileLog::create(&path).unwrap();
        log.append(end_row());
        let before_flush = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before_flush.lines().count(), 1);
        log.flush().unwrap();
        drop(log);

        let mut log = CsvFileLog::create(&path).unwrap();
        log.append(end_row());
        log.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.iter().filter(|l| **l == HEADER).count(), 1);
        assert!(lines[1].ends_with(";3.00;Agree"));
    }

    #[test]
    fn drop_flushes_pending_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        {
            let mut log = CsvFileLog::create(&path).unwrap();
            log.append(end_row());
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
