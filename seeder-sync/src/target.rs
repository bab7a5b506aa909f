//! Lazy file target.
//!
//! The file is opened on the first write after construction or after a
//! close, and opening always truncates. Closing flushes and releases the
//! handle, so the next cycle rewrites the file from byte zero.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use seeder_core::TargetSpec;

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// LazyFile
// ---------------------------------------------------------------------------

/// A local file `<dir>/<name>` reopened on demand.
#[derive(Debug)]
pub struct LazyFile {
    dir: PathBuf,
    path: PathBuf,
    handle: Option<BufWriter<File>>,
}

impl LazyFile {
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(name);
        Self {
            dir,
            path,
            handle: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` while no handle is open.
    pub fn is_exhausted(&self) -> bool {
        self.handle.is_none()
    }

    /// Create the directory if missing and open the file truncated.
    /// A no-op when a handle is already open.
    pub fn open(&mut self) -> Result<(), SyncError> {
        if self.handle.is_some() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let file = options.open(&self.path).map_err(|e| io_err(&self.path, e))?;

        tracing::debug!("opened {}", self.path.display());
        self.handle = Some(BufWriter::new(file));
        Ok(())
    }

    /// Write all of `chunk`, opening the file first if needed.
    pub fn write_all_chunk(&mut self, chunk: &[u8]) -> Result<(), SyncError> {
        self.open()?;
        let path = &self.path;
        match self.handle.as_mut() {
            Some(handle) => handle.write_all(chunk).map_err(|e| io_err(path, e)),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<(), SyncError> {
        let path = &self.path;
        match self.handle.as_mut() {
            Some(handle) => handle.flush().map_err(|e| io_err(path, e)),
            None => Ok(()),
        }
    }

    /// Flush and release the handle. Idempotent.
    pub fn close(&mut self) -> Result<(), SyncError> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        handle.flush().map_err(|e| io_err(&self.path, e))
    }
}

impl Write for LazyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all_chunk(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        LazyFile::flush(self).map_err(io::Error::other)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Every supported target kind.
#[derive(Debug)]
pub enum Target {
    File(LazyFile),
}

impl Target {
    pub fn from_spec(spec: &TargetSpec) -> Self {
        match spec {
            TargetSpec::File { path, name } => Target::File(LazyFile::new(path.clone(), name)),
        }
    }

    /// Human-readable destination for logs.
    pub fn describe(&self) -> String {
        match self {
            Target::File(file) => file.path().display().to_string(),
        }
    }

    pub fn open(&mut self) -> Result<(), SyncError> {
        match self {
            Target::File(file) => file.open(),
        }
    }

    pub fn write_all_chunk(&mut self, chunk: &[u8]) -> Result<(), SyncError> {
        match self {
            Target::File(file) => file.write_all_chunk(chunk),
        }
    }

    pub fn flush(&mut self) -> Result<(), SyncError> {
        match self {
            Target::File(file) => file.flush(),
        }
    }

    pub fn close(&mut self) -> Result<(), SyncError> {
        match self {
            Target::File(file) => file.close(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        match self {
            Target::File(file) => file.is_exhausted(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
