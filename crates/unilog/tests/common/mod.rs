//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use unilog::ConsoleStreams;

/// In-memory stream that can stand in for stdout or stderr
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("every line should be valid JSON"))
            .collect()
    }

    /// A `MakeWriter`-compatible constructor writing into this buffer
    pub fn make_writer(&self) -> impl Fn() -> SharedBuffer + Send + Sync + 'static {
        let buffer = self.clone();
        move || buffer.clone()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captured stdout/stderr pair
pub struct CapturedStreams {
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

impl CapturedStreams {
    pub fn new() -> Self {
        Self {
            stdout: SharedBuffer::new(),
            stderr: SharedBuffer::new(),
        }
    }

    pub fn streams(&self) -> ConsoleStreams {
        ConsoleStreams::new(self.stdout.make_writer(), self.stderr.make_writer())
    }
}

/// Contents of a log file plus any uncompressed backups next to it
pub fn read_log(path: &Path) -> String {
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .expect("log path should have a file name");
    let directory = path.parent().expect("log path should have a parent");
    let Ok(entries) = fs::read_dir(directory) else {
        return String::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            let name = p.file_name().unwrap_or_default().to_string_lossy();
            name.starts_with(prefix) && !name.ends_with(".gz")
        })
        .collect();
    files.sort();
    files
        .iter()
        .map(|p| fs::read_to_string(p).unwrap_or_default())
        .collect()
}

static GLOBAL_SLOT: Mutex<()> = Mutex::new(());

/// Serialize tests that touch the global logger
pub fn lock_global() -> MutexGuard<'static, ()> {
    GLOBAL_SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}
