//! JSON Lines writer for the performance log.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete JSON object
//! - Partial file corruption only affects individual lines
//! - Can be read even if write was interrupted

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, PersistenceResult};
use crate::record::PerformanceRecord;

/// Active writer state for daily file.
struct ActiveWriter {
    writer: BufWriter<File>,
    date: NaiveDate,
    records_written: usize,
}

/// Append-only writer for [`PerformanceRecord`]s.
///
/// Records are buffered and written to `performance_{YYYY-MM-DD}.jsonl`,
/// where the date is taken from each record's timestamp. The file rotates
/// when a record from a new day is flushed. Existing files are appended to,
/// never truncated.
pub struct PerformanceWriter {
    base_dir: PathBuf,
    buffer: Vec<PerformanceRecord>,
    max_buffer_size: usize,
    active_writer: Option<ActiveWriter>,
    closed: bool,
}

impl PerformanceWriter {
    /// Create a writer rooted at `base_dir`, creating the directory.
    pub fn new(base_dir: impl AsRef<Path>, max_buffer_size: usize) -> PersistenceResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            buffer: Vec::with_capacity(max_buffer_size.max(1)),
            max_buffer_size: max_buffer_size.max(1),
            active_writer: None,
            closed: false,
        })
    }

    /// Path of the file holding records for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.base_dir
            .join(format!("performance_{}.jsonl", date.format("%Y-%m-%d")))
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer a record, flushing once the buffer is full.
    pub fn append(&mut self, record: PerformanceRecord) -> PersistenceResult<()> {
        if self.closed {
            return Err(PersistenceError::Closed);
        }
        self.buffer.push(record);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }
        Ok(())
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush writer on close");
            }
            info!(
                date = %active.date,
                records = active.records_written,
                "Closed performance log"
            );
        }
    }

    fn open_writer(&mut self, date: NaiveDate) -> PersistenceResult<&mut ActiveWriter> {
        let rotate = self.active_writer.as_ref().is_some_and(|w| w.date != date);
        if rotate {
            self.close_active_writer();
        }

        if self.active_writer.is_none() {
            let path = self.path_for(date);
            info!(path = %path.display(), "Opening performance log (append mode)");
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.active_writer = Some(ActiveWriter {
                writer: BufWriter::new(file),
                date,
                records_written: 0,
            });
        }

        self.active_writer.as_mut().ok_or(PersistenceError::Closed)
    }

    /// Write buffered records to disk.
    ///
    /// Records leave the buffer only once written; on error the unwritten
    /// tail stays pending for the next flush.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut written = 0;
        let result = self.write_pending(&mut written);
        self.buffer.drain(..written);
        result?;

        debug!(records = written, "Flushed performance records");
        Ok(())
    }

    fn write_pending(&mut self, written: &mut usize) -> PersistenceResult<()> {
        while let Some(record) = self.buffer.get(*written) {
            let line = serde_json::to_string(record)?;
            let date = record.date();
            let active = self.open_writer(date)?;
            writeln!(active.writer, "{line}")?;
            active.records_written += 1;
            *written += 1;
        }

        if let Some(active) = self.active_writer.as_mut() {
            active.writer.flush()?;
        }
        Ok(())
    }

    /// Flush pending records and close the file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush();
        self.close_active_writer();
        self.closed = true;
        result
    }
}

impl Drop for PerformanceWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(?e, "Failed to close performance log on drop");
        }
    }
}
