//! Result recording: an append-only CSV log with one row per answered trial.
//!
//! Log format (header first):
//!
//! ```text
//! word,tipo,respuesta,correcto,tiempo_ms,error
//! Persona,human,Left,1,350.000,0
//! ```
//!
//! Each row is encoded completely in memory, then appended with a single
//! `write_all` under an exclusive advisory lock and followed by `sync_data`.
//! A failed write is rolled back to the previous length while the lock is
//! still held. A crash can leave at most one partial row at the end of the
//! file; it is truncated when the log is opened and before the next append,
//! so earlier rows are never rewritten or extended.
//!
//! The lock is taken with bounded retries ([`LOG_LOCK_TIMEOUT`]). A writer
//! that holds it for longer turns the write into
//! [`RecordError::LockTimeout`] instead of stalling the session.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::constants::{LOG_HEADER, LOG_LOCK_RETRY, LOG_LOCK_TIMEOUT};
use crate::error::RecordError;
use crate::types::{Category, Side, TrialOutcome};

/// Sink for trial outcomes.
///
/// `record` returns only after the outcome has been handed to durable
/// storage (or failed). Callers serialize access: one call at a time.
pub trait ResultRecorder: Send {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), RecordError>;
}

impl<R: ResultRecorder + ?Sized> ResultRecorder for Box<R> {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        (**self).record(outcome)
    }
}

/// One log row, as written.
#[derive(Serialize)]
struct LogRow<'a> {
    word: &'a str,
    tipo: &'static str,
    respuesta: &'static str,
    correcto: u8,
    tiempo_ms: String,
    error: u8,
}

impl<'a> From<&'a TrialOutcome> for LogRow<'a> {
    fn from(o: &'a TrialOutcome) -> Self {
        Self {
            word: &o.word,
            tipo: o.category.code(),
            respuesta: o.response_side.as_str(),
            correcto: u8::from(o.is_correct),
            tiempo_ms: format!("{:.3}", o.reaction_time_ms),
            error: o.error_flag,
        }
    }
}

/// One log row, as read back.
#[derive(Deserialize)]
struct StoredRow {
    word: String,
    tipo: Category,
    respuesta: Side,
    correcto: u8,
    tiempo_ms: f64,
    error: u8,
}

impl From<StoredRow> for TrialOutcome {
    fn from(r: StoredRow) -> Self {
        Self {
            word: r.word,
            category: r.tipo,
            response_side: r.respuesta,
            is_correct: r.correcto == 1,
            reaction_time_ms: r.tiempo_ms,
            error_flag: r.error,
        }
    }
}

fn header_line() -> String {
    LOG_HEADER.join(",")
}

/// Encode one outcome as a complete, newline-terminated CSV row.
fn encode_row(outcome: &TrialOutcome) -> Result<Vec<u8>, RecordError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64));
    writer.serialize(LogRow::from(outcome))?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| RecordError::Io(e.into_error()))
}

/// Length of `file` up to and including its last newline, scanning back from
/// `len`.
fn complete_len(file: &mut File, len: u64) -> std::io::Result<u64> {
    let mut buf = [0u8; 512];
    let mut end = len;
    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(start + i as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

/// Take the exclusive lock on `file`, retrying until `timeout` has passed.
fn lock_with_timeout(file: &File, path: &Path, timeout: Duration) -> Result<(), RecordError> {
    let started = Instant::now();
    loop {
        match FileExt::try_lock_exclusive(file) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                if started.elapsed() >= timeout {
                    return Err(RecordError::LockTimeout {
                        path: path.to_path_buf(),
                        waited_ms: started.elapsed().as_millis(),
                    });
                }
                std::thread::sleep(LOG_LOCK_RETRY);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// File-backed append-only result log.
pub struct CsvResultLog {
    path: PathBuf,
    file: File,
    lock_timeout: Duration,
}

impl std::fmt::Debug for CsvResultLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvResultLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CsvResultLog {
    /// Open the log at `path`, creating it (and its parent directory) with the
    /// header row if absent.
    ///
    /// An existing log must start with the expected header. A trailing
    /// partial row left by an interrupted write is truncated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        lock_with_timeout(&file, &path, LOG_LOCK_TIMEOUT)?;
        let prepared = Self::prepare(&path, &mut file);
        FileExt::unlock(&file)?;
        prepared?;

        Ok(Self {
            path,
            file,
            lock_timeout: LOG_LOCK_TIMEOUT,
        })
    }

    /// Override how long `record` waits for the lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Validate the header and drop a torn tail. Caller holds the lock.
    fn prepare(path: &Path, file: &mut File) -> Result<(), RecordError> {
        let mut content = String::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_string(&mut content)?;

        let header = header_line();
        let complete_len = match content.rfind('\n') {
            Some(i) => i + 1,
            None => 0,
        };

        if complete_len < content.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = content.len() - complete_len,
                "truncating partial row at end of result log"
            );
            file.set_len(complete_len as u64)?;
            file.sync_all()?;
            content.truncate(complete_len);
        }

        match content.lines().next() {
            None => {
                file.write_all(format!("{header}\n").as_bytes())?;
                file.sync_data()?;
                tracing::info!(path = %path.display(), "created result log");
            }
            Some(first) if first.trim_end_matches('\r') == header => {}
            Some(first) => {
                return Err(RecordError::HeaderMismatch {
                    path: path.to_path_buf(),
                    found: first.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one encoded row. Caller holds the lock.
    fn append(&mut self, row: &[u8]) -> Result<(), RecordError> {
        let len = self.file.metadata()?.len();
        let complete = complete_len(&mut self.file, len)?;
        if complete < len {
            tracing::warn!(
                path = %self.path.display(),
                dropped_bytes = len - complete,
                "truncating partial row before append"
            );
            self.file.set_len(complete)?;
        }

        if let Err(e) = self.file.write_all(row).and_then(|()| self.file.sync_data()) {
            if let Err(rollback) = self.file.set_len(complete) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "cannot roll back failed append"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl ResultRecorder for CsvResultLog {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let row = encode_row(outcome)?;

        lock_with_timeout(&self.file, &self.path, self.lock_timeout)?;
        let appended = self.append(&row);
        FileExt::unlock(&self.file)?;
        appended
    }
}

/// In-memory recorder. Clones share the same outcome list.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecorder {
    outcomes: Arc<Mutex<Vec<TrialOutcome>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn outcomes(&self) -> Vec<TrialOutcome> {
        match self.outcomes.lock() {
            Ok(v) => v.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ResultRecorder for MemoryRecorder {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let mut v = match self.outcomes.lock() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        v.push(outcome.clone());
        Ok(())
    }
}

/// Recorder handle shared by successive sessions; calls are serialized by the
/// inner mutex.
#[derive(Clone)]
pub struct SharedRecorder {
    inner: Arc<Mutex<Box<dyn ResultRecorder>>>,
}

impl SharedRecorder {
    pub fn new(recorder: impl ResultRecorder + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(recorder))),
        }
    }
}

impl ResultRecorder for SharedRecorder {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let mut inner = match self.inner.lock() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.record(outcome)
    }
}

/// Read every row of a result log.
pub fn read_outcomes(path: impl AsRef<Path>) -> Result<Vec<TrialOutcome>, RecordError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut outcomes = Vec::new();
    for row in reader.deserialize::<StoredRow>() {
        outcomes.push(row?.into());
    }
    Ok(outcomes)
}
