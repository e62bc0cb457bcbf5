//! Session audit log
//!
//! Append-only text file receiving every oracle response of the run. It is
//! opened once at startup and closed once at shutdown; `close` consumes the
//! log, and dropping it without closing still flushes.

use crate::error::{DetectorError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Width of the line written when a new session starts
pub const SESSION_SEPARATOR_WIDTH: usize = 50;

#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    entries: usize,
}

impl SessionLog {
    /// Open (creating if needed) the log file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(DetectorError::SessionLog)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(DetectorError::SessionLog)?;

        tracing::debug!("Session log opened at {}", path.display());
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries appended by this session
    pub fn entries_written(&self) -> usize {
        self.entries
    }

    /// Append one entry followed by a newline
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.append(text)?;
        self.entries += 1;
        Ok(())
    }

    /// Separator line marking the start of a run. Not counted as an entry.
    pub fn mark_session_start(&mut self) -> Result<()> {
        self.append(&format!("\n{}", "#".repeat(SESSION_SEPARATOR_WIDTH)))
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            DetectorError::SessionLog(std::io::Error::other("session log already closed"))
        })?;
        writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(DetectorError::SessionLog)
    }

    /// Flush and release the file. Returns the number of entries written.
    pub fn close(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(DetectorError::SessionLog)?;
        }
        tracing::debug!(
            "Session log {} closed after {} entries",
            self.path.display(),
            self.entries
        );
        Ok(self.entries)
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::warn!("Failed to flush session log {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entries_appended_with_separator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files").join("openai-log.txt");

        let mut log = SessionLog::open(&path).unwrap();
        log.write("first verdict").unwrap();
        log.write("second\nmultiline verdict").unwrap();
        assert_eq!(log.close().unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first verdict\nsecond\nmultiline verdict\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");

        let mut log = SessionLog::open(&path).unwrap();
        log.write("run one").unwrap();
        log.close().unwrap();

        let mut log = SessionLog::open(&path).unwrap();
        log.mark_session_start().unwrap();
        log.write("run two").unwrap();
        assert_eq!(log.entries_written(), 1);
        drop(log);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("run one\n"));
        assert!(content.contains(&"#".repeat(SESSION_SEPARATOR_WIDTH)));
        assert!(content.ends_with("run two\n"));
    }

    #[test]
    fn test_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let err = SessionLog::open(blocker.join("log.txt")).unwrap_err();
        assert_eq!(err.code(), "session_log");
    }
}
