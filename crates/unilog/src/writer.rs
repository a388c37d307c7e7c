//! Output destinations and the fan-out writer that feeds them.
//!
//! Standard output is always written. The configured destination may add
//! standard error or a rotating log file; every record goes to every
//! destination.

use crate::config::{LogOptions, STDERR_PATH, STDOUT_PATH};
use crate::error::{LogError, LogResult};
use logroller::{Compression, LogRoller, LogRollerBuilder, Rotation, RotationSize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use tracing::Metadata;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter, MakeWriterExt};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Where records go in addition to standard output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output only
    Stdout,

    /// Standard output and standard error
    Stderr,

    /// Standard output and a rotating log file
    File(PathBuf),
}

impl Destination {
    /// Resolve a destination path. The stream markers and the empty string
    /// never open a file.
    pub fn from_path(path: &str) -> Self {
        match path {
            "" | STDOUT_PATH => Destination::Stdout,
            STDERR_PATH => Destination::Stderr,
            other => Destination::File(PathBuf::from(other)),
        }
    }

    /// Number of writers records fan out to
    pub fn writer_count(&self) -> usize {
        match self {
            Destination::Stdout => 1,
            Destination::Stderr | Destination::File(_) => 2,
        }
    }
}

/// The process streams a logger writes to.
///
/// Defaults to the real standard output and standard error. Embedders and
/// tests can substitute their own writers.
pub struct ConsoleStreams {
    stdout: BoxMakeWriter,
    stderr: BoxMakeWriter,
}

impl ConsoleStreams {
    /// Use `stdout` and `stderr` in place of the process streams
    pub fn new<O, E>(stdout: O, stderr: E) -> Self
    where
        O: for<'a> MakeWriter<'a> + Send + Sync + 'static,
        E: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            stdout: BoxMakeWriter::new(stdout),
            stderr: BoxMakeWriter::new(stderr),
        }
    }
}

impl Default for ConsoleStreams {
    fn default() -> Self {
        Self::new(io::stdout, io::stderr)
    }
}

impl fmt::Debug for ConsoleStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleStreams").finish_non_exhaustive()
    }
}

/// Rotation limits handed to the file writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub compress: bool,
}

impl From<&LogOptions> for RotationPolicy {
    fn from(options: &LogOptions) -> Self {
        RotationPolicy {
            max_size_mb: options.max_size_mb,
            max_backups: options.max_backups,
            max_age_days: options.max_age_days,
            compress: options.compress,
        }
    }
}

impl RotationPolicy {
    fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.max(1).saturating_mul(BYTES_PER_MB)
    }
}

struct RollerState {
    roller: LogRoller,
    written_since_sweep: u64,
}

/// A size-rotated log file safe to share between threads.
///
/// Size rollover, backup count and gzip are delegated to `logroller`.
/// Backups older than the age limit are removed on open and each time
/// roughly one file's worth of bytes has been written.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<RollerState>,
}

impl RotatingFile {
    /// Open (or create) the log file at `path`, creating parent directories
    pub fn open(path: impl AsRef<Path>, policy: RotationPolicy) -> LogResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LogError::InvalidPath(path.to_path_buf()))?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let directory_str = directory
            .to_str()
            .ok_or_else(|| LogError::InvalidPath(path.to_path_buf()))?;
        fs::create_dir_all(directory)?;

        let mut builder = LogRollerBuilder::new(directory_str, file_name).rotation(
            Rotation::SizeBased(RotationSize::Bytes(policy.max_size_bytes())),
        );
        if policy.max_backups > 0 {
            builder = builder.max_keep_files(policy.max_backups as _);
        }
        if policy.compress {
            builder = builder.compression(Compression::Gzip);
        }
        let roller = builder
            .build()
            .map_err(|e| LogError::rotation(path, e))?;

        let file = RotatingFile {
            path: path.to_path_buf(),
            policy,
            state: Mutex::new(RollerState {
                roller,
                written_since_sweep: 0,
            }),
        };
        file.remove_expired_backups()?;
        Ok(file)
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Limits this file was opened with
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Delete backups of this file older than the age limit.
    ///
    /// Backups are the files next to the active one named `<name>.<N>` or
    /// `<name>.<N>.gz`. Returns the number of files removed.
    pub fn remove_expired_backups(&self) -> io::Result<usize> {
        if self.policy.max_age_days == 0 {
            return Ok(0);
        }
        let max_age = Duration::from_secs(self.policy.max_age_days.saturating_mul(SECONDS_PER_DAY));
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(0);
        };
        let Some(active) = self.path.file_name().and_then(|name| name.to_str()) else {
            return Ok(0);
        };
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut removed = 0;
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !is_backup_name(active, &name) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if modified < cutoff {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn lock(&self) -> MutexGuard<'_, RollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_written(&self, state: &mut RollerState, written: usize) {
        state.written_since_sweep = state.written_since_sweep.saturating_add(written as u64);
        if state.written_since_sweep >= self.policy.max_size_bytes() {
            state.written_since_sweep = 0;
            // Sweep failures must not fail the write that triggered them
            let _ = self.remove_expired_backups();
        }
    }
}

/// Whether `name` is a rotated copy of `active`: `active.N` or `active.N.gz`
fn is_backup_name(active: &str, name: &str) -> bool {
    let Some(suffix) = name
        .strip_prefix(active)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };
    let index = suffix.strip_suffix(".gz").unwrap_or(suffix);
    !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let written = state.roller.write(buf)?;
        self.record_written(&mut state, written);
        Ok(written)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        state.roller.write_all(buf)?;
        self.record_written(&mut state, buf.len());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().roller.flush()
    }
}

impl fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Every destination of one logger behind a single shareable writer.
#[derive(Clone)]
pub struct FanOut {
    inner: Arc<BoxMakeWriter>,
    file: Option<Arc<RotatingFile>>,
    destination: Destination,
}

impl FanOut {
    /// Combine the console streams with the destination's extra writer
    pub fn build(
        destination: Destination,
        policy: RotationPolicy,
        streams: ConsoleStreams,
    ) -> LogResult<Self> {
        let ConsoleStreams { stdout, stderr } = streams;
        let (writer, file) = match &destination {
            Destination::Stdout => (stdout, None),
            Destination::Stderr => (BoxMakeWriter::new(stdout.and(stderr)), None),
            Destination::File(path) => {
                let file = Arc::new(RotatingFile::open(path, policy)?);
                (
                    BoxMakeWriter::new(stdout.and(Arc::clone(&file))),
                    Some(file),
                )
            }
        };
        Ok(FanOut {
            inner: Arc::new(writer),
            file,
            destination,
        })
    }

    /// The resolved destination
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// The rotating file, when one is attached
    pub fn file(&self) -> Option<&RotatingFile> {
        self.file.as_deref()
    }

    /// Flush every destination
    pub fn flush(&self) -> io::Result<()> {
        (*self.inner).make_writer().flush()
    }
}

impl<'a> MakeWriter<'a> for FanOut {
    type Writer = <BoxMakeWriter as MakeWriter<'a>>::Writer;

    fn make_writer(&'a self) -> Self::Writer {
        (*self.inner).make_writer()
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        (*self.inner).make_writer_for(meta)
    }
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("destination", &self.destination)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}
