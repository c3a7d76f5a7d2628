use super::DocumentConsumer;
use crate::errors::{ProjectionError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const ARRAY_OPEN: &str = "[\n";
const ARRAY_CLOSE: &str = "\n]";
const SEPARATOR: &str = ",\n";

enum SinkState {
    /// Nothing written yet; no file exists
    Pending,
    Open(BufWriter<File>),
    /// A write failed; the file content can no longer be extended safely
    Failed,
    Closed,
}

/// Buffered writer producing a single JSON array file
///
/// Documents are collected in memory and written out whenever `capacity`
/// of them are pending. The file is created on the first flush, so a sink
/// that never receives a document leaves nothing on disk. Element contents
/// are written verbatim and are not validated.
///
/// Once a write fails the sink refuses further documents, since the array
/// on disk may end mid-element. Dropping an unclosed sink closes it;
/// failures at that point are logged.
pub struct BufferedArraySink {
    path: PathBuf,
    capacity: usize,
    buffer: Vec<String>,
    state: SinkState,
    flushes: usize,
    accepted: usize,
}

impl BufferedArraySink {
    /// Create a sink writing to `path`; a capacity of zero is treated as one
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            path: path.into(),
            capacity,
            buffer: Vec::with_capacity(capacity),
            state: SinkState::Pending,
            flushes: 0,
            accepted: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of non-empty flushes since the file was opened
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Documents accepted so far, flushed or not
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SinkState::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SinkState::Closed)
    }

    /// Whether an earlier write failed
    pub fn is_failed(&self) -> bool {
        matches!(self.state, SinkState::Failed)
    }

    /// Buffer a document, flushing when the buffer reaches capacity
    ///
    /// # Errors
    ///
    /// * `SinkClosed` - the sink was already closed
    /// * `SinkIo` - the triggered flush failed, or an earlier one did
    pub fn accept(&mut self, document: String) -> Result<()> {
        match self.state {
            SinkState::Closed => {
                return Err(ProjectionError::SinkClosed {
                    path: self.path.clone(),
                })
            }
            SinkState::Failed => return Err(self.failed_error()),
            SinkState::Pending | SinkState::Open(_) => {}
        }
        self.buffer.push(document);
        self.accepted += 1;
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Write pending documents as array elements and clear the buffer
    ///
    /// Opens the file on first use. An empty buffer writes nothing.
    ///
    /// # Errors
    ///
    /// * `SinkClosed` - documents are pending on a closed sink
    /// * `SinkIo` - the file cannot be created or written; after a failed
    ///   write the sink stays failed
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.buffer);
        let first = self.flushes == 0;
        let written = {
            let writer = self.writer()?;
            write_elements(writer, &pending, first)
        };
        if let Err(e) = written {
            self.state = SinkState::Failed;
            return Err(self.io_error(e));
        }

        self.flushes += 1;
        tracing::debug!(
            path = %self.path.display(),
            documents = pending.len(),
            flush = self.flushes,
            "Flushed documents"
        );
        Ok(())
    }

    /// Flush what is pending, terminate the array and release the file
    ///
    /// A sink that never wrote anything closes without creating a file.
    /// Closing a closed sink does nothing.
    ///
    /// # Errors
    ///
    /// `SinkIo` when the final flush or the closing bracket cannot be
    /// written. The sink is closed either way.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let flushed = self.flush();

        let finished = match std::mem::replace(&mut self.state, SinkState::Closed) {
            SinkState::Open(mut writer) => {
                let mut finish = || -> std::io::Result<()> {
                    writer.write_all(ARRAY_CLOSE.as_bytes())?;
                    writer.flush()
                };
                finish().map_err(|e| self.io_error(e))
            }
            SinkState::Pending | SinkState::Failed | SinkState::Closed => Ok(()),
        };
        self.buffer.clear();

        tracing::debug!(
            path = %self.path.display(),
            documents = self.accepted,
            flushes = self.flushes,
            "Closed sink"
        );
        flushed.and(finished)
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        match self.state {
            SinkState::Closed => {
                return Err(ProjectionError::SinkClosed {
                    path: self.path.clone(),
                })
            }
            SinkState::Failed => return Err(self.failed_error()),
            SinkState::Pending | SinkState::Open(_) => {}
        }
        if let SinkState::Pending = self.state {
            let file = self.create_file()?;
            let mut writer = BufWriter::new(file);
            writer
                .write_all(ARRAY_OPEN.as_bytes())
                .map_err(|e| self.io_error(e))?;
            self.state = SinkState::Open(writer);
        }
        match &mut self.state {
            SinkState::Open(writer) => Ok(writer),
            _ => Err(ProjectionError::SinkClosed {
                path: self.path.clone(),
            }),
        }
    }

    fn create_file(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        File::create(&self.path).map_err(|e| self.io_error(e))
    }

    fn failed_error(&self) -> ProjectionError {
        ProjectionError::SinkIo {
            path: self.path.clone(),
            message: "an earlier write to this sink failed".to_string(),
        }
    }

    fn io_error(&self, err: std::io::Error) -> ProjectionError {
        ProjectionError::SinkIo {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

fn write_elements(writer: &mut impl Write, documents: &[String], first: bool) -> std::io::Result<()> {
    if !first {
        writer.write_all(SEPARATOR.as_bytes())?;
    }
    writer.write_all(documents.join(SEPARATOR).as_bytes())?;
    writer.flush()
}

impl DocumentConsumer for BufferedArraySink {
    fn accept(&mut self, _bucket: &str, document: String) -> Result<()> {
        BufferedArraySink::accept(self, document)
    }

    fn close(&mut self) -> Result<()> {
        BufferedArraySink::close(self)
    }
}

impl Drop for BufferedArraySink {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::error!(path = %self.path.display(), error = %err, "Failed to close sink");
        }
    }
}

impl std::fmt::Debug for BufferedArraySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedArraySink")
            .field("path", &self.path)
            .field("capacity", &self.capacity)
            .field("pending", &self.buffer.len())
            .field("flushes", &self.flushes)
            .field("accepted", &self.accepted)
            .finish()
    }
}
