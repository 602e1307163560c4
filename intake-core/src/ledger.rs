//! Append-only CSV ledger of accepted submissions.
//!
//! ## Layout
//!
//! ```text
//! data/inquiries.csv
//!   created_at,name,email,tel,type,message,ip,user_agent
//!   2026-10-18T09:30:00+09:00,田中,tanaka@example.com,,相談,よろしくお願いします,127.0.0.1,curl/8.0
//! ```
//!
//! Every append takes an exclusive advisory lock on the ledger file. The
//! header check and both writes happen inside that one lock scope, so two
//! first-time writers cannot both emit a header.

use std::fs::DirBuilder;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use fs2::FileExt;

use crate::error::IntakeError;
use crate::submission::Submission;

/// Column names, in storage order.
pub const LEDGER_HEADER: [&str; 8] = [
    "created_at",
    "name",
    "email",
    "tel",
    "type",
    "message",
    "ip",
    "user_agent",
];

/// Default ledger file name inside the data directory.
pub const DEFAULT_LEDGER_FILE: &str = "inquiries.csv";

/// One ledger row. Values are stored as-is; CSV quoting happens on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub created_at: String,
    pub name: String,
    pub email: String,
    pub tel: String,
    pub inquiry_type: String,
    pub message: String,
    pub ip: String,
    pub user_agent: String,
}

impl LedgerRecord {
    pub fn new(
        created_at: String,
        submission: &Submission,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            created_at,
            name: submission.name.as_str().to_string(),
            email: submission.email.as_str().to_string(),
            tel: submission.tel.as_str().to_string(),
            inquiry_type: submission.inquiry_type.as_str().to_string(),
            message: submission.message.as_str().to_string(),
            ip: ip.unwrap_or_default().to_string(),
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }

    pub fn fields(&self) -> [&str; 8] {
        [
            self.created_at.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.tel.as_str(),
            self.inquiry_type.as_str(),
            self.message.as_str(),
            self.ip.as_str(),
            self.user_agent.as_str(),
        ]
    }
}

/// Takes the exclusive lock on an open ledger handle.
type LockFn = fn(&File) -> io::Result<()>;

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    lock: LockFn,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: |file: &File| file.lock_exclusive(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_lock(mut self, lock: LockFn) -> Self {
        self.lock = lock;
        self
    }

    /// Ledger at `dir/file_name`.
    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is empty.
    ///
    /// Creates the parent directory and the file on first use. Blocks while
    /// another writer holds the lock.
    pub fn append(&self, record: &LedgerRecord) -> Result<(), IntakeError> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_storage_dir(dir).map_err(|source| IntakeError::StorageDirectoryUnavailable {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let file = open_for_append(&self.path).map_err(|source| IntakeError::FileOpenFailure {
            path: self.path.clone(),
            source,
        })?;

        if let Err(source) = (self.lock)(&file) {
            drop(file);
            return Err(IntakeError::LockAcquisitionFailure {
                path: self.path.clone(),
                source,
            });
        }

        let written = write_locked(&file, record);
        if let Err(err) = FileExt::unlock(&file) {
            tracing::warn!("failed to unlock {}: {err}", self.path.display());
        }
        written.map_err(|source| IntakeError::LedgerWriteFailure {
            path: self.path.clone(),
            source,
        })
    }
}

fn create_storage_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    // Recursive creation succeeds when the directory already exists,
    // including when another process created it a moment ago.
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

fn open_for_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

/// Caller must hold the exclusive lock on `file`.
fn write_locked(file: &File, record: &LedgerRecord) -> io::Result<()> {
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if needs_header {
        writer.write_record(LEDGER_HEADER)?;
    }
    writer.write_record(record.fields())?;
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;

    // One write per append keeps rows whole even if the lock is bypassed.
    let mut handle = file;
    handle.write_all(&bytes)?;
    handle.flush()
}
