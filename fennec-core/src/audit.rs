//! Audit trail logger
//!
//! Timestamped, labelled entries appended to a per-session log file and
//! flushed before `log` returns. An I/O failure disables auditing with a
//! warning; it is never raised to callers.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Entry label written between brackets after the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    System,
    Input,
    Command,
    Info,
    Error,
    Warning,
    Agent,
    ToolResult,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::System => "SYSTEM",
            AuditKind::Input => "INPUT",
            AuditKind::Command => "COMMAND",
            AuditKind::Info => "INFO",
            AuditKind::Error => "ERROR",
            AuditKind::Warning => "WARNING",
            AuditKind::Agent => "AGENT",
            AuditKind::ToolResult => "TOOL_RESULT",
        }
    }
}

#[derive(Default)]
struct AuditInner {
    file: Option<File>,
    path: Option<PathBuf>,
}

/// Append-only audit logger.
///
/// The underlying file handle is owned by the logger from `start` until
/// `stop`; all writes are serialized through the cooperative task.
pub struct AuditLogger {
    directory: PathBuf,
    inner: Mutex<AuditInner>,
}

impl AuditLogger {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            inner: Mutex::new(AuditInner::default()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().file.is_some()
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.inner.lock().path.clone()
    }

    /// Open a new audit file named after the local start time and write the
    /// opening record.
    pub fn start(&self) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let filename = format!("audit_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.directory.join(filename);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        write_entry(&mut file, AuditKind::System, "Audit started")?;

        let mut inner = self.inner.lock();
        inner.file = Some(file);
        inner.path = Some(path.clone());
        Ok(path)
    }

    /// Write the closing record and release the file.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if let Some(mut file) = inner.file.take() {
            if let Err(err) = write_entry(&mut file, AuditKind::System, "Audit stopped") {
                tracing::warn!("audit close failed: {err}");
            }
        }
        inner.path = None;
    }

    /// Write one timestamped entry. No-op when inactive; on I/O failure
    /// auditing is disabled and a warning logged.
    pub fn log(&self, kind: AuditKind, content: &str) {
        let mut inner = self.inner.lock();
        let Some(file) = inner.file.as_mut() else {
            return;
        };
        if let Err(err) = write_entry(file, kind, content) {
            tracing::warn!("audit write failed, disabling auditing: {err}");
            inner.file = None;
            inner.path = None;
        }
    }
}

/// Format and write a single entry, flushing before returning.
fn write_entry(file: &mut File, kind: AuditKind, content: &str) -> io::Result<()> {
    let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    writeln!(file, "[{timestamp}] [{}] {content}", kind.as_str())?;
    file.flush()
}
