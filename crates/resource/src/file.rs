//! File handle resource.

use crate::{AcquireError, ReleaseError, Resource};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum State {
    Reading(File),
    Writing(BufWriter<File>),
    Closed,
}

/// An open file that must be released.
///
/// Releasing a writer flushes buffered data and syncs it to disk, so release
/// can fail with an I/O error. After release every read or write is rejected.
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    name: String,
    state: State,
}

impl FileHandle {
    /// Open an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AcquireError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AcquireError::from_io(describe(path), e))?;
        Ok(Self::with_state(path, State::Reading(file)))
    }

    /// Create (or truncate) a file for buffered writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AcquireError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| AcquireError::from_io(describe(path), e))?;
        Ok(Self::with_state(path, State::Writing(BufWriter::new(file))))
    }

    fn with_state(path: &Path, state: State) -> Self {
        Self {
            path: path.to_path_buf(),
            name: describe(path),
            state,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }
}

fn closed(name: &str) -> io::Error {
    io::Error::other(format!("{name} is closed"))
}

fn describe(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        "<empty path>".to_string()
    } else {
        path.display().to_string()
    }
}

impl Resource for FileHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Reading(file) => {
                drop(file);
                Ok(())
            }
            State::Writing(writer) => {
                let file = writer
                    .into_inner()
                    .map_err(|e| ReleaseError::io(&self.name, e.into_error()))?;
                file.sync_all()
                    .map_err(|e| ReleaseError::io(&self.name, e))
            }
            State::Closed => Ok(()),
        }
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Reading(file) => file.read(buf),
            State::Writing(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{} was opened for writing", self.name),
            )),
            State::Closed => Err(closed(&self.name)),
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Writing(writer) => writer.write(buf),
            State::Reading(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{} was opened for reading", self.name),
            )),
            State::Closed => Err(closed(&self.name)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            State::Writing(writer) => writer.flush(),
            State::Reading(_) => Ok(()),
            State::Closed => Err(closed(&self.name)),
        }
    }
}
